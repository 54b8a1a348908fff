//! Seams to the collaborator engine: the shared connection and the
//! read-only view a router gets of the host on the other end.

use crate::congestion::ContactCounters;
use crate::core::types::{ConnectionId, HostId, Message, MessageId};
use crate::predict::PredictabilityTable;
use crate::receipt::ReceiptLedger;
use serde::{Deserialize, Serialize};

/// Result codes of the collaborator transfer primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferCode {
    /// Transfer started
    Ok,
    /// Receiver already has (or delivered) the message
    DeniedOld,
    /// Receiver or link busy, try again later
    TryLaterBusy,
    /// Any other refusal
    DeniedUnspecified,
}

/// A transfer currently occupying a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub from: HostId,
    pub message_id: MessageId,
}

/// A contact between two hosts, owned by the collaborator engine.
///
/// Both endpoints see the same link; only the transfer primitive mutates it.
pub trait Link {
    fn id(&self) -> ConnectionId;

    fn is_up(&self) -> bool;

    /// Host on the far side of the link from `me`
    fn other_end(&self, me: HostId) -> HostId;

    fn is_ready_for_transfer(&self) -> bool;

    fn start_transfer(&mut self, from: HostId, message: &Message) -> TransferCode;

    fn abort_transfer(&mut self);

    fn in_flight(&self) -> Option<&InFlight>;
}

/// Narrow read-only capability a router exposes to the peers it meets
pub trait PeerView {
    fn host(&self) -> HostId;

    /// Snapshot of confirmed deliveries known to the peer
    fn receipts(&self) -> &ReceiptLedger;

    /// Drop and replication counters accumulated since the peer's last teardown
    fn counters(&self) -> ContactCounters;

    fn has_message(&self, id: &MessageId) -> bool;

    /// Whether the peer is busy with any transfer
    fn is_transferring(&self) -> bool;

    /// Delivery predictabilities; only prophet routers carry them
    fn predictions(&self) -> Option<&PredictabilityTable> {
        None
    }
}

/// One live contact as seen from the local router during an event
pub struct Contact<'a> {
    pub link: &'a mut dyn Link,
    pub peer: &'a dyn PeerView,
}

impl<'a> Contact<'a> {
    pub fn new(link: &'a mut dyn Link, peer: &'a dyn PeerView) -> Self {
        Self { link, peer }
    }

    pub fn id(&self) -> ConnectionId {
        self.link.id()
    }

    pub fn peer_host(&self) -> HostId {
        self.peer.host()
    }
}
