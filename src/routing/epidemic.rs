//! Epidemic (flooding) forwarding

use crate::buffer::{MemoryStore, MessageStore};
use crate::config::{ConfigResult, RouterConfig};
use crate::core::{Contact, HostId, Message, SimTime};
use crate::routing::policy::ForwardingPolicy;
use crate::routing::router::Router;
use crate::scheduler::Candidate;

/// Offers every held message to every peer that does not have it yet
#[derive(Debug, Clone, Copy, Default)]
pub struct EpidemicPolicy;

impl ForwardingPolicy for EpidemicPolicy {
    fn name(&self) -> &'static str {
        "epidemic"
    }

    fn order_candidates(
        &mut self,
        _me: HostId,
        messages: &[&Message],
        contacts: &[Contact<'_>],
        _now: SimTime,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for (idx, contact) in contacts.iter().enumerate() {
            for message in messages {
                if !contact.peer.has_message(&message.id) {
                    candidates.push(Candidate::new(message.id.clone(), idx));
                }
            }
        }
        candidates
    }
}

pub type EpidemicRouter<S = MemoryStore> = Router<EpidemicPolicy, S>;

impl<S: MessageStore> Router<EpidemicPolicy, S> {
    pub fn epidemic(host: HostId, config: RouterConfig, store: S) -> ConfigResult<Self> {
        Router::with_policy(host, config, EpidemicPolicy, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::transfer::tests::{ScriptedLink, StaticPeer};

    #[test]
    fn test_floods_everything_the_peer_lacks() {
        let me = HostId(0);
        let a = Message::new("A", me, HostId(7), 1, 0.0);
        let b = Message::new("B", me, HostId(8), 1, 0.0);
        let messages = vec![&a, &b];

        let mut link1 = ScriptedLink::new(1, me, HostId(1));
        let mut link2 = ScriptedLink::new(2, me, HostId(2));
        let mut peer1 = StaticPeer::new(HostId(1));
        peer1.held.push("A".into());
        let peer2 = StaticPeer::new(HostId(2));
        let contacts = vec![
            Contact::new(&mut link1, &peer1),
            Contact::new(&mut link2, &peer2),
        ];

        let candidates = EpidemicPolicy.order_candidates(me, &messages, &contacts, 0.0);

        assert_eq!(
            candidates,
            vec![
                Candidate::new("B".into(), 0),
                Candidate::new("A".into(), 1),
                Candidate::new("B".into(), 1),
            ]
        );
    }
}
