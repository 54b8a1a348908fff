//! Pluggable forwarding policy
//!
//! The router core owns congestion control, receipts and eviction; a policy
//! only decides which held messages go to which connected peer, and in what
//! order.

use crate::core::{Contact, HostId, Message, PeerView, SimTime};
use crate::predict::PredictabilityTable;
use crate::scheduler::Candidate;

pub trait ForwardingPolicy {
    /// Router variant name used in logs and reports
    fn name(&self) -> &'static str;

    /// Exchange routing state with a peer that just came into contact
    fn on_contact_up(&mut self, _me: HostId, _peer: &dyn PeerView, _now: SimTime) {}

    /// Order forwarding candidates.
    ///
    /// `messages` are already in send-queue order; implementations must keep
    /// that order among candidates they consider equal.
    fn order_candidates(
        &mut self,
        me: HostId,
        messages: &[&Message],
        contacts: &[Contact<'_>],
        now: SimTime,
    ) -> Vec<Candidate>;

    fn predictions(&self) -> Option<&PredictabilityTable> {
        None
    }

    /// Human-readable routing state
    fn routing_info(&mut self, _now: SimTime) -> String {
        String::new()
    }
}
