//! Router façade
//!
//! Composes the congestion controller, receipt ledger, eviction policy and
//! transfer scheduler around a forwarding policy, and drives them from the
//! contact-up, contact-down and tick events of the simulation engine.

use crate::buffer::{make_room, Eviction, MemoryStore, MessageStore};
use crate::config::{ConfigResult, RouterConfig};
use crate::congestion::{hop_credit, CongestionController, CongestionStep, ContactCounters};
use crate::core::{
    AdmissionResult, ConnectionId, Contact, HostId, Message, MessageId, PeerView, SimTime,
};
use crate::metrics::recorder;
use crate::predict::PredictabilityTable;
use crate::receipt::ReceiptLedger;
use crate::report::RouterDiagnostics;
use crate::routing::policy::ForwardingPolicy;
use crate::routing::types::{ContactUp, Reception, RouterStats};
use crate::scheduler::{arrange, deliverable_candidates, TransferScheduler, TransferStarted};
use std::collections::{HashMap, HashSet};

pub struct Router<P, S = MemoryStore> {
    host: HostId,
    config: RouterConfig,
    policy: P,
    store: S,
    controller: CongestionController,
    ledger: ReceiptLedger,
    scheduler: TransferScheduler,

    /// Outgoing transfers started by this router, per connection
    sending: HashMap<ConnectionId, MessageId>,

    stats: RouterStats,
}

impl<P: ForwardingPolicy, S: MessageStore> Router<P, S> {
    pub fn with_policy(host: HostId, config: RouterConfig, policy: P, store: S) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            host,
            config,
            policy,
            store,
            controller: CongestionController::new(config.congestion),
            ledger: ReceiptLedger::new(),
            scheduler: TransferScheduler::new(config.delete_delivered),
            sending: HashMap::new(),
            stats: RouterStats::default(),
        })
    }

    pub fn host(&self) -> HostId {
        self.host
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub(crate) fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn controller(&self) -> &CongestionController {
        &self.controller
    }

    pub fn ledger(&self) -> &ReceiptLedger {
        &self.ledger
    }

    pub fn scheduler(&self) -> &TransferScheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    pub fn has_message(&self, id: &MessageId) -> bool {
        self.store.contains(id)
    }

    /// Whether this router has an outgoing transfer in progress
    pub fn is_sending(&self) -> bool {
        !self.sending.is_empty()
    }

    fn sending_ids(&self) -> HashSet<MessageId> {
        self.sending.values().cloned().collect()
    }

    fn is_transferring(&self, contacts: &[Contact<'_>]) -> bool {
        self.is_sending() || contacts.iter().any(|c| !c.link.is_ready_for_transfer())
    }

    /// Read-only view handed to peers; `transferring` comes from the link layer
    pub fn as_peer(&self, transferring: bool) -> PeerHandle<'_, P, S> {
        PeerHandle {
            router: self,
            transferring,
        }
    }

    /// A contact came up. `contacts` holds every live contact, including `changed`.
    pub fn on_contact_up(
        &mut self,
        changed: ConnectionId,
        contacts: &mut [Contact<'_>],
        now: SimTime,
    ) -> Option<ContactUp> {
        let idx = match contacts.iter().position(|c| c.id() == changed) {
            Some(idx) => idx,
            None => {
                tracing::warn!("{} got contact-up for unknown {}", self.host, changed);
                return None;
            }
        };
        let peer = contacts[idx].peer;

        self.policy.on_contact_up(self.host, peer, now);

        let quota = self.controller.quota();
        self.scheduler.on_contact_up(changed, quota);

        let learned = self.ledger.merge_from(peer.receipts());
        let (purged, aborted) = self.purge_delivered(contacts);

        tracing::debug!(
            "{} up with {} on {}: quota {}, {} receipts learned, {} purged",
            self.host,
            peer.host(),
            changed,
            quota,
            learned.len(),
            purged.len()
        );

        Some(ContactUp {
            connection: changed,
            peer: peer.host(),
            quota,
            receipts_learned: learned.len(),
            purged,
            aborted,
        })
    }

    /// Retire every held replica the ledger confirms as delivered
    fn purge_delivered(&mut self, contacts: &mut [Contact<'_>]) -> (Vec<MessageId>, usize) {
        let to_delete: Vec<MessageId> = self
            .store
            .messages()
            .into_iter()
            .filter(|m| self.ledger.contains(&m.id))
            .map(|m| m.id.clone())
            .collect();

        let mut aborted = 0;
        for id in &to_delete {
            if self.sending.values().any(|sent| sent == id) {
                for contact in contacts.iter_mut() {
                    let ours = contact
                        .link
                        .in_flight()
                        .map(|f| f.from == self.host && &f.message_id == id)
                        .unwrap_or(false);
                    if ours {
                        tracing::warn!(
                            "{} aborting transfer of delivered {} on {}",
                            self.host,
                            id,
                            contact.id()
                        );
                        contact.link.abort_transfer();
                        aborted += 1;
                        break;
                    }
                }
                self.sending.retain(|_, sent| *sent != *id);
            }
            self.store.remove(id);
        }

        self.stats.replicas_purged += to_delete.len() as u64;
        self.stats.transfers_aborted += aborted as u64;
        recorder::record_purge(self.host, to_delete.len(), aborted);

        (to_delete, aborted)
    }

    /// A contact went down; recompute congestion from both sides' counters
    pub fn on_contact_down(
        &mut self,
        changed: ConnectionId,
        peer: &dyn PeerView,
        now: SimTime,
    ) -> CongestionStep {
        let credit = hop_credit(self.store.messages());
        let step = self.controller.on_contact_down(peer.counters(), credit, now);

        self.scheduler.on_contact_down(changed);
        self.sending.remove(&changed);

        tracing::debug!(
            "{} down with {}: CV {:.4} -> {:.4}, quota {} -> {}",
            self.host,
            peer.host(),
            step.previous_cv,
            step.cv,
            step.previous_quota,
            step.quota
        );
        recorder::record_congestion_step(self.host, &step);

        step
    }

    /// Periodic tick: start at most one transfer on the live contacts
    pub fn update(&mut self, contacts: &mut [Contact<'_>], now: SimTime) -> Option<TransferStarted> {
        if contacts.is_empty() || self.store.is_empty() || self.is_transferring(contacts) {
            return None;
        }

        let deliverable = {
            let mut messages = self.store.messages();
            arrange(self.config.send_queue, &mut messages, now);
            deliverable_candidates(&messages, contacts)
        };
        let started = match self
            .scheduler
            .offer(self.host, &deliverable, contacts, &mut self.store)
        {
            Some(started) => Some(started),
            None => {
                let ordered = {
                    let mut messages = self.store.messages();
                    arrange(self.config.send_queue, &mut messages, now);
                    self.policy
                        .order_candidates(self.host, &messages, contacts, now)
                };
                self.scheduler
                    .offer(self.host, &ordered, contacts, &mut self.store)
            }
        };

        if let Some(ref started) = started {
            self.sending
                .insert(started.connection, started.message_id.clone());
            self.stats.transfers_started += 1;
            recorder::record_transfer_started(self.host);
            tracing::trace!(
                "{} sending {} to {} on {}",
                self.host,
                started.message_id,
                started.to,
                started.connection
            );
        }
        started
    }

    /// An outgoing transfer on `connection` finished
    pub fn on_transfer_done(&mut self, connection: ConnectionId) -> Option<MessageId> {
        self.sending.remove(&connection)
    }

    /// Accept a replica whose transfer to this host completed
    pub fn receive_message(&mut self, message: Message, now: SimTime) -> AdmissionResult<Reception> {
        if message.is_final_destination(self.host) {
            let first =
                self.ledger
                    .record_delivery(message.id.clone(), now, message.remaining_ttl(now));
            self.controller.record_replication();
            self.stats.messages_delivered += 1;
            recorder::record_delivery(self.host, first);
            if first {
                tracing::debug!("{} delivered {} at {:.1}", self.host, message.id, now);
            }
            return Ok(Reception::Delivered { first });
        }

        let eviction = self.admit(message.size)?;
        self.store.insert(message);
        self.controller.record_replication();
        self.stats.messages_received += 1;
        recorder::record_replication(self.host);

        Ok(Reception::Stored {
            evicted: eviction.dropped,
        })
    }

    /// Add a locally originated message
    pub fn create_message(&mut self, message: Message) -> AdmissionResult<Eviction> {
        let eviction = self.admit(message.size)?;
        self.store.insert(message);
        self.stats.messages_created += 1;
        Ok(eviction)
    }

    fn admit(&mut self, size: u64) -> AdmissionResult<Eviction> {
        let in_flight = self.sending_ids();
        let result = make_room(&mut self.store, size, &in_flight, &mut self.controller);
        let dropped = match &result {
            Ok(eviction) => eviction.dropped.len(),
            Err(crate::core::AdmissionDenied::BufferExhausted { evicted, .. }) => *evicted,
            Err(_) => 0,
        };
        self.stats.messages_dropped += dropped as u64;
        recorder::record_drops(self.host, dropped);

        if let Err(ref e) = result {
            self.stats.admissions_denied += 1;
            tracing::debug!("{} refused {} bytes: {}", self.host, size, e);
        }
        result
    }

    /// Human-readable routing state
    pub fn routing_info(&mut self, now: SimTime) -> String {
        let mut info = format!(
            "{} ({}): {}, {}",
            self.host,
            self.policy.name(),
            self.controller.status(),
            self.stats
        );
        let policy_info = self.policy.routing_info(now);
        if !policy_info.is_empty() {
            info.push('\n');
            info.push_str(&policy_info);
        }
        info
    }

    /// Snapshot for reporting
    pub fn diagnostics(&self, now: SimTime) -> RouterDiagnostics {
        RouterDiagnostics {
            host: self.host,
            variant: self.policy.name().to_string(),
            cv: self.controller.cv(),
            quota: self.controller.quota(),
            congestion_samples: self.controller.samples().to_vec(),
            drop_ratios: self.controller.drop_ratios().to_vec(),
            receipts: self.ledger.snapshot(),
            predictions: self.policy.predictions().map(|t| t.entries_at(now)),
            buffer_occupancy: self.store.occupancy(),
            stats: self.stats.clone(),
        }
    }
}

/// Read-only view of a router as seen by a peer during an event
pub struct PeerHandle<'a, P, S> {
    router: &'a Router<P, S>,
    transferring: bool,
}

impl<'a, P: ForwardingPolicy, S: MessageStore> PeerView for PeerHandle<'a, P, S> {
    fn host(&self) -> HostId {
        self.router.host
    }

    fn receipts(&self) -> &ReceiptLedger {
        &self.router.ledger
    }

    fn counters(&self) -> ContactCounters {
        self.router.controller.counters()
    }

    fn has_message(&self, id: &MessageId) -> bool {
        self.router.store.contains(id)
    }

    fn is_transferring(&self) -> bool {
        self.transferring || self.router.is_sending()
    }

    fn predictions(&self) -> Option<&PredictabilityTable> {
        self.router.policy.predictions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InFlight, TransferCode};
    use crate::routing::EpidemicRouter;
    use crate::scheduler::transfer::tests::{ScriptedLink, StaticPeer};

    const ME: HostId = HostId(0);
    const PEER: HostId = HostId(1);

    fn router() -> EpidemicRouter {
        EpidemicRouter::epidemic(ME, RouterConfig::default(), MemoryStore::new(100)).unwrap()
    }

    #[test]
    fn test_final_delivery_records_receipt_once() {
        let mut r = router();
        let m = Message::new("M1", PEER, ME, 10, 0.0).with_ttl(100.0);

        let first = r.receive_message(m.replicate(5.0), 5.0).unwrap();
        let again = r.receive_message(m.replicate(9.0), 9.0).unwrap();

        assert_eq!(first, Reception::Delivered { first: true });
        assert_eq!(again, Reception::Delivered { first: false });
        assert!(!r.has_message(&"M1".into()));

        let record = r.ledger().get(&"M1".into()).unwrap();
        assert_eq!(record.created_at, 5.0);
        assert_eq!(record.ttl, Some(95.0));
        assert_eq!(r.controller().counters().replications, 2);
    }

    #[test]
    fn test_relay_reception_is_stored() {
        let mut r = router();
        let m = Message::new("M1", PEER, HostId(7), 10, 0.0);

        let reception = r.receive_message(m.replicate(1.0), 1.0).unwrap();

        assert_eq!(reception, Reception::Stored { evicted: vec![] });
        assert!(r.has_message(&"M1".into()));
        assert_eq!(r.stats().messages_received, 1);
    }

    #[test]
    fn test_contact_up_purges_and_aborts_without_drop() {
        let mut r = router();
        r.create_message(Message::new("M1", ME, HostId(7), 10, 0.0))
            .unwrap();
        r.create_message(Message::new("M2", ME, HostId(7), 10, 1.0))
            .unwrap();

        // M1 already on its way over an existing contact
        let mut busy = ScriptedLink::new(1, ME, HostId(2));
        busy.in_flight = Some(InFlight {
            from: ME,
            message_id: "M1".into(),
        });
        r.sending.insert(ConnectionId(1), "M1".into());

        let mut fresh = ScriptedLink::new(2, ME, PEER);
        let other = StaticPeer::new(HostId(2));
        let mut peer = StaticPeer::new(PEER);
        peer.receipts.record_delivery("M1".into(), 3.0, None);

        let up = {
            let mut contacts = vec![
                Contact::new(&mut busy, &other),
                Contact::new(&mut fresh, &peer),
            ];
            r.on_contact_up(ConnectionId(2), &mut contacts, 4.0).unwrap()
        };

        assert_eq!(up.purged, vec![MessageId::from("M1")]);
        assert_eq!(up.aborted, 1);
        assert_eq!(up.quota, 1);
        assert_eq!(busy.aborted, 1);
        assert!(busy.in_flight.is_none());
        assert!(!r.has_message(&"M1".into()));
        assert!(r.has_message(&"M2".into()));
        assert!(!r.is_sending());
        assert_eq!(r.controller().counters().drops, 0);
        assert_eq!(r.stats().messages_dropped, 0);
    }

    #[test]
    fn test_update_waits_while_link_busy() {
        let mut r = router();
        r.create_message(Message::new("M1", ME, PEER, 10, 0.0))
            .unwrap();
        let mut link = ScriptedLink::new(1, ME, PEER);
        let peer = StaticPeer::new(PEER);
        {
            let mut contacts = vec![Contact::new(&mut link, &peer)];
            r.on_contact_up(ConnectionId(1), &mut contacts, 0.0);
        }

        link.ready = false;
        {
            let mut contacts = vec![Contact::new(&mut link, &peer)];
            assert!(r.update(&mut contacts, 1.0).is_none());
        }

        link.ready = true;
        let started = {
            let mut contacts = vec![Contact::new(&mut link, &peer)];
            r.update(&mut contacts, 2.0)
        };
        let started = started.unwrap();
        assert_eq!(started.message_id, MessageId::from("M1"));
        assert!(r.is_sending());
        assert_eq!(r.on_transfer_done(ConnectionId(1)), Some("M1".into()));
    }

    #[test]
    fn test_stale_denial_keeps_copy_by_default() {
        let mut r = router();
        r.create_message(Message::new("M1", ME, PEER, 10, 0.0))
            .unwrap();
        let mut link = ScriptedLink::new(1, ME, PEER);
        link.code = TransferCode::DeniedOld;
        let peer = StaticPeer::new(PEER);

        let mut contacts = vec![Contact::new(&mut link, &peer)];
        r.on_contact_up(ConnectionId(1), &mut contacts, 0.0);
        assert!(r.update(&mut contacts, 1.0).is_none());

        assert!(r.has_message(&"M1".into()));
    }

    #[test]
    fn test_stale_denial_from_destination_purges_when_enabled() {
        let config = RouterConfig::default()
            .with_delete_delivered(true)
            .with_congestion(crate::config::CongestionConfig {
                additive_increase: 3,
                ..Default::default()
            });
        let mut r = EpidemicRouter::epidemic(ME, config, MemoryStore::new(100)).unwrap();
        r.create_message(Message::new("M1", ME, PEER, 10, 0.0))
            .unwrap();
        let mut link = ScriptedLink::new(1, ME, PEER);
        link.code = TransferCode::DeniedOld;
        let peer = StaticPeer::new(PEER);

        let mut contacts = vec![Contact::new(&mut link, &peer)];
        r.on_contact_up(ConnectionId(1), &mut contacts, 0.0);
        assert!(r.update(&mut contacts, 1.0).is_none());

        assert!(!r.has_message(&"M1".into()));
        assert_eq!(r.controller().counters().drops, 0);

        let step = r.on_contact_down(ConnectionId(1), &peer, 2.0);
        assert_eq!(step.quota, 4);
    }

    #[test]
    fn test_contact_down_clears_sending() {
        let mut r = router();
        r.sending.insert(ConnectionId(3), "M1".into());
        let peer = StaticPeer::new(PEER);

        let step = r.on_contact_down(ConnectionId(3), &peer, 10.0);

        assert!(!r.is_sending());
        assert_eq!(step.quota, 2);
        assert_eq!(r.controller().samples().len(), 1);
    }

    #[test]
    fn test_peer_handle_reports_sending() {
        let mut r = router();
        assert!(!r.as_peer(false).is_transferring());
        r.sending.insert(ConnectionId(1), "M1".into());
        assert!(r.as_peer(false).is_transferring());
    }
}
