//! In-memory links with one in-flight transfer each

use crate::core::{
    ConnectionId, HostId, InFlight, Link, Message, PeerView, SimTime, TransferCode,
};

/// A transfer occupying a link until the next tick
#[derive(Debug, Clone)]
pub struct PendingTransfer {
    pub in_flight: InFlight,
    pub to: HostId,
    pub message: Message,
    pub started_at: SimTime,
}

#[derive(Debug, Clone)]
pub struct LinkState {
    pub id: ConnectionId,
    pub a: HostId,
    pub b: HostId,
    pub up: bool,
    pub transfer: Option<PendingTransfer>,
    pub aborted: u64,
}

impl LinkState {
    pub fn new(id: ConnectionId, a: HostId, b: HostId) -> Self {
        Self {
            id,
            a,
            b,
            up: true,
            transfer: None,
            aborted: 0,
        }
    }

    pub fn touches(&self, host: HostId) -> bool {
        self.a == host || self.b == host
    }

    pub fn joins(&self, x: HostId, y: HostId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    pub fn other_end(&self, me: HostId) -> HostId {
        if self.a == me {
            self.b
        } else {
            self.a
        }
    }

    pub fn is_busy(&self) -> bool {
        self.transfer.is_some()
    }
}

/// A link as seen by one endpoint, paired with the receiving side's view
pub struct SimLink<'a> {
    state: &'a mut LinkState,
    receiver: &'a dyn PeerView,
    now: SimTime,
}

impl<'a> SimLink<'a> {
    pub fn new(state: &'a mut LinkState, receiver: &'a dyn PeerView, now: SimTime) -> Self {
        Self {
            state,
            receiver,
            now,
        }
    }
}

impl Link for SimLink<'_> {
    fn id(&self) -> ConnectionId {
        self.state.id
    }

    fn is_up(&self) -> bool {
        self.state.up
    }

    fn other_end(&self, me: HostId) -> HostId {
        self.state.other_end(me)
    }

    fn is_ready_for_transfer(&self) -> bool {
        self.state.up && !self.state.is_busy()
    }

    fn start_transfer(&mut self, from: HostId, message: &Message) -> TransferCode {
        if !self.state.up {
            return TransferCode::DeniedUnspecified;
        }
        if self.state.is_busy() {
            return TransferCode::TryLaterBusy;
        }
        if self.receiver.has_message(&message.id) || self.receiver.receipts().contains(&message.id) {
            return TransferCode::DeniedOld;
        }

        self.state.transfer = Some(PendingTransfer {
            in_flight: InFlight {
                from,
                message_id: message.id.clone(),
            },
            to: self.state.other_end(from),
            message: message.clone(),
            started_at: self.now,
        });
        TransferCode::Ok
    }

    fn abort_transfer(&mut self) {
        if let Some(t) = self.state.transfer.take() {
            tracing::trace!("{} aborted transfer of {}", self.state.id, t.in_flight.message_id);
            self.state.aborted += 1;
        }
    }

    fn in_flight(&self) -> Option<&InFlight> {
        self.state.transfer.as_ref().map(|t| &t.in_flight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MessageId;
    use crate::scheduler::transfer::tests::StaticPeer;

    fn message(id: &str) -> Message {
        Message::new(id, HostId(1), HostId(9), 10, 0.0)
    }

    #[test]
    fn test_start_and_busy() {
        let mut state = LinkState::new(ConnectionId(1), HostId(1), HostId(2));
        let peer = StaticPeer::new(HostId(2));
        let mut link = SimLink::new(&mut state, &peer, 5.0);

        assert_eq!(link.start_transfer(HostId(1), &message("m1")), TransferCode::Ok);
        assert!(!link.is_ready_for_transfer());
        assert_eq!(
            link.start_transfer(HostId(1), &message("m2")),
            TransferCode::TryLaterBusy
        );
        assert_eq!(link.in_flight().map(|f| f.message_id.as_str()), Some("m1"));

        let pending = state.transfer.as_ref().unwrap();
        assert_eq!(pending.to, HostId(2));
        assert_eq!(pending.started_at, 5.0);
    }

    #[test]
    fn test_denied_old_when_receiver_holds_or_delivered() {
        let mut state = LinkState::new(ConnectionId(1), HostId(1), HostId(2));
        let mut peer = StaticPeer::new(HostId(2));
        peer.held.push(MessageId::from("held"));
        peer.receipts.record_delivery(MessageId::from("done"), 1.0, None);

        let mut link = SimLink::new(&mut state, &peer, 5.0);
        assert_eq!(
            link.start_transfer(HostId(1), &message("held")),
            TransferCode::DeniedOld
        );
        assert_eq!(
            link.start_transfer(HostId(1), &message("done")),
            TransferCode::DeniedOld
        );
        assert!(link.is_ready_for_transfer());
    }

    #[test]
    fn test_abort_clears() {
        let mut state = LinkState::new(ConnectionId(1), HostId(1), HostId(2));
        let peer = StaticPeer::new(HostId(2));
        {
            let mut link = SimLink::new(&mut state, &peer, 0.0);
            link.start_transfer(HostId(1), &message("m1"));
            link.abort_transfer();
            assert!(link.in_flight().is_none());
        }
        assert_eq!(state.aborted, 1);
    }
}
