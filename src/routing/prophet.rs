//! PRoPHET forwarding with the GRTRMax rule
//!
//! A message goes to a peer only when that peer's delivery predictability
//! for the destination is strictly higher than ours; candidates are tried
//! best peer score first.

use crate::buffer::{MemoryStore, MessageStore};
use crate::config::{ConfigResult, PredictabilityConfig, ProphetConfig};
use crate::core::{Contact, HostId, Message, PeerView, SimTime};
use crate::predict::PredictabilityTable;
use crate::routing::policy::ForwardingPolicy;
use crate::routing::router::Router;
use crate::scheduler::Candidate;

#[derive(Debug, Clone)]
pub struct ProphetPolicy {
    table: PredictabilityTable,
}

impl ProphetPolicy {
    pub fn new(config: PredictabilityConfig) -> Self {
        Self {
            table: PredictabilityTable::new(config),
        }
    }

    pub fn table(&self) -> &PredictabilityTable {
        &self.table
    }

    /// Our own aged predictability for `host`
    pub fn score_for(&mut self, host: HostId, now: SimTime) -> f64 {
        self.table.score_for(host, now)
    }
}

impl ForwardingPolicy for ProphetPolicy {
    fn name(&self) -> &'static str {
        "prophet"
    }

    fn on_contact_up(&mut self, me: HostId, peer: &dyn PeerView, now: SimTime) {
        if peer.predictions().is_none() {
            tracing::warn!(
                "Peer {} carries no delivery predictabilities, skipping transitive update",
                peer.host()
            );
        }
        self.table
            .on_contact_up(me, peer.host(), peer.predictions(), now);
    }

    fn order_candidates(
        &mut self,
        _me: HostId,
        messages: &[&Message],
        contacts: &[Contact<'_>],
        now: SimTime,
    ) -> Vec<Candidate> {
        // (peer score, queue rank, candidate)
        let mut scored: Vec<(f64, usize, Candidate)> = Vec::new();

        for (idx, contact) in contacts.iter().enumerate() {
            let peer = contact.peer;
            if peer.is_transferring() {
                continue;
            }
            let peer_preds = match peer.predictions() {
                Some(p) => p,
                None => continue,
            };

            for (rank, message) in messages.iter().enumerate() {
                if peer.has_message(&message.id) {
                    continue;
                }
                let theirs = peer_preds.peek(message.to, now);
                let ours = self.table.score_for(message.to, now);
                if theirs > ours {
                    scored.push((theirs, rank, Candidate::new(message.id.clone(), idx)));
                }
            }
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, _, c)| c).collect()
    }

    fn predictions(&self) -> Option<&PredictabilityTable> {
        Some(&self.table)
    }

    fn routing_info(&mut self, now: SimTime) -> String {
        self.table.routing_info(now)
    }
}

pub type ProphetRouter<S = MemoryStore> = Router<ProphetPolicy, S>;

impl<S: MessageStore> Router<ProphetPolicy, S> {
    pub fn prophet(host: HostId, config: ProphetConfig, store: S) -> ConfigResult<Self> {
        config.validate()?;
        Router::with_policy(
            host,
            config.router,
            ProphetPolicy::new(config.predictability),
            store,
        )
    }

    /// Aged predictability of this router for `host`
    pub fn score_for(&mut self, host: HostId, now: SimTime) -> f64 {
        self.policy_mut().score_for(host, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::congestion::ContactCounters;
    use crate::core::MessageId;
    use crate::receipt::ReceiptLedger;
    use crate::scheduler::transfer::tests::ScriptedLink;

    const ME: HostId = HostId(0);
    const DEST_X: HostId = HostId(10);
    const DEST_Y: HostId = HostId(11);

    struct ProphetPeer {
        host: HostId,
        table: PredictabilityTable,
        receipts: ReceiptLedger,
        held: Vec<MessageId>,
        transferring: bool,
    }

    impl ProphetPeer {
        fn new(host: HostId, scores: &[(HostId, usize)]) -> Self {
            let mut table = PredictabilityTable::new(PredictabilityConfig::new(30));
            for (dest, encounters) in scores {
                for _ in 0..*encounters {
                    table.encounter(*dest, 0.0);
                }
            }
            Self {
                host,
                table,
                receipts: ReceiptLedger::new(),
                held: Vec::new(),
                transferring: false,
            }
        }
    }

    impl PeerView for ProphetPeer {
        fn host(&self) -> HostId {
            self.host
        }

        fn receipts(&self) -> &ReceiptLedger {
            &self.receipts
        }

        fn counters(&self) -> ContactCounters {
            ContactCounters::default()
        }

        fn has_message(&self, id: &MessageId) -> bool {
            self.held.contains(id)
        }

        fn is_transferring(&self) -> bool {
            self.transferring
        }

        fn predictions(&self) -> Option<&PredictabilityTable> {
            Some(&self.table)
        }
    }

    fn policy_knowing(scores: &[(HostId, usize)]) -> ProphetPolicy {
        let mut policy = ProphetPolicy::new(PredictabilityConfig::new(30));
        for (dest, encounters) in scores {
            for _ in 0..*encounters {
                policy.table.encounter(*dest, 0.0);
            }
        }
        policy
    }

    #[test]
    fn test_negative_beta_rejected() {
        let config = ProphetConfig::new(30).with_beta(-0.1);
        assert!(ProphetRouter::prophet(ME, config, MemoryStore::new(10)).is_err());
    }

    #[test]
    fn test_grtrmax_orders_by_peer_score() {
        let x = Message::new("X", ME, DEST_X, 1, 0.0);
        let y = Message::new("Y", ME, DEST_Y, 1, 0.0);
        let messages = vec![&x, &y];

        // peer 1 knows X once (0.75), peer 2 knows Y twice (0.9375)
        let peer1 = ProphetPeer::new(HostId(1), &[(DEST_X, 1)]);
        let peer2 = ProphetPeer::new(HostId(2), &[(DEST_Y, 2)]);
        let mut link1 = ScriptedLink::new(1, ME, HostId(1));
        let mut link2 = ScriptedLink::new(2, ME, HostId(2));
        let contacts = vec![
            Contact::new(&mut link1, &peer1),
            Contact::new(&mut link2, &peer2),
        ];

        let mut policy = policy_knowing(&[]);
        let candidates = policy.order_candidates(ME, &messages, &contacts, 0.0);

        assert_eq!(
            candidates,
            vec![Candidate::new("Y".into(), 1), Candidate::new("X".into(), 0)]
        );
    }

    #[test]
    fn test_requires_strictly_better_peer() {
        let x = Message::new("X", ME, DEST_X, 1, 0.0);
        let messages = vec![&x];
        let peer = ProphetPeer::new(HostId(1), &[(DEST_X, 1)]);
        let mut link = ScriptedLink::new(1, ME, HostId(1));
        let contacts = vec![Contact::new(&mut link, &peer)];

        // equal scores: not a candidate
        let mut policy = policy_knowing(&[(DEST_X, 1)]);
        assert!(policy
            .order_candidates(ME, &messages, &contacts, 0.0)
            .is_empty());
    }

    #[test]
    fn test_ties_follow_queue_order() {
        let a = Message::new("A", ME, DEST_X, 1, 0.0);
        let b = Message::new("B", ME, DEST_X, 1, 0.0);
        let messages = vec![&b, &a];
        let peer = ProphetPeer::new(HostId(1), &[(DEST_X, 1)]);
        let mut link = ScriptedLink::new(1, ME, HostId(1));
        let contacts = vec![Contact::new(&mut link, &peer)];

        let mut policy = policy_knowing(&[]);
        let ids: Vec<_> = policy
            .order_candidates(ME, &messages, &contacts, 0.0)
            .into_iter()
            .map(|c| c.message_id.0)
            .collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_skips_busy_peers_and_held_messages() {
        let x = Message::new("X", ME, DEST_X, 1, 0.0);
        let y = Message::new("Y", ME, DEST_X, 1, 0.0);
        let messages = vec![&x, &y];

        let mut busy = ProphetPeer::new(HostId(1), &[(DEST_X, 1)]);
        busy.transferring = true;
        let mut holder = ProphetPeer::new(HostId(2), &[(DEST_X, 1)]);
        holder.held.push("X".into());
        let mut link1 = ScriptedLink::new(1, ME, HostId(1));
        let mut link2 = ScriptedLink::new(2, ME, HostId(2));
        let contacts = vec![
            Contact::new(&mut link1, &busy),
            Contact::new(&mut link2, &holder),
        ];

        let mut policy = policy_knowing(&[]);
        let candidates = policy.order_candidates(ME, &messages, &contacts, 0.0);
        assert_eq!(candidates, vec![Candidate::new("Y".into(), 1)]);
    }
}
