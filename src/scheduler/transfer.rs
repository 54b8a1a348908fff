//! Admission of messages onto contacts
//!
//! Holds the per-contact quota table and turns the forwarding policy's
//! ordered candidates into at most one started transfer per tick.

use crate::buffer::MessageStore;
use crate::core::{
    AdmissionDenied, ConnectionId, Contact, HostId, Message, MessageId, StartError,
    TransferCode, TransferDenied,
};
use crate::scheduler::quota::QuotaTable;

/// A message offered on one of the live contacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub message_id: MessageId,
    /// Index into the contact slice the candidate was built from
    pub contact: usize,
}

impl Candidate {
    pub fn new(message_id: MessageId, contact: usize) -> Self {
        Self {
            message_id,
            contact,
        }
    }
}

/// A transfer the scheduler managed to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStarted {
    pub connection: ConnectionId,
    pub message_id: MessageId,
    pub to: HostId,
}

#[derive(Debug, Clone, Default)]
pub struct TransferScheduler {
    quotas: QuotaTable,
    delete_delivered: bool,
}

impl TransferScheduler {
    pub fn new(delete_delivered: bool) -> Self {
        Self {
            quotas: QuotaTable::new(),
            delete_delivered,
        }
    }

    pub fn quotas(&self) -> &QuotaTable {
        &self.quotas
    }

    pub fn on_contact_up(&mut self, connection: ConnectionId, quota: u32) {
        self.quotas.allocate(connection, quota);
    }

    pub fn on_contact_down(&mut self, connection: ConnectionId) {
        self.quotas.release(connection);
    }

    /// Try to start sending `message` over `contact`.
    ///
    /// A stale denial from the destination itself purges the local copy when
    /// delete-on-delivery is enabled.
    pub fn try_start<S: MessageStore + ?Sized>(
        &mut self,
        me: HostId,
        message: &Message,
        contact: &mut Contact<'_>,
        store: &mut S,
    ) -> Result<(), StartError> {
        let connection = contact.id();
        if !contact.link.is_ready_for_transfer() {
            return Err(AdmissionDenied::ConnectionBusy(connection).into());
        }
        if !self.quotas.has_quota(connection) {
            return Err(AdmissionDenied::QuotaExhausted(connection).into());
        }

        match contact.link.start_transfer(me, message) {
            TransferCode::Ok => {
                self.quotas.consume(connection);
                Ok(())
            }
            TransferCode::DeniedOld => {
                if self.delete_delivered && message.to == contact.peer_host() {
                    tracing::debug!(
                        "{} already delivered to {}, dropping local copy",
                        message.id,
                        message.to
                    );
                    store.remove(&message.id);
                }
                Err(TransferDenied::Stale(message.id.clone()).into())
            }
            TransferCode::TryLaterBusy => Err(AdmissionDenied::ConnectionBusy(connection).into()),
            TransferCode::DeniedUnspecified => {
                Err(TransferDenied::Unspecified(message.id.clone()).into())
            }
        }
    }

    /// Offer candidates in order, stopping at the first transfer that starts
    pub fn offer<S: MessageStore + ?Sized>(
        &mut self,
        me: HostId,
        candidates: &[Candidate],
        contacts: &mut [Contact<'_>],
        store: &mut S,
    ) -> Option<TransferStarted> {
        for candidate in candidates {
            // an earlier stale purge may have removed it
            let message = match store.get(&candidate.message_id) {
                Some(m) => m.clone(),
                None => continue,
            };
            let contact = match contacts.get_mut(candidate.contact) {
                Some(c) => c,
                None => continue,
            };

            match self.try_start(me, &message, contact, store) {
                Ok(()) => {
                    return Some(TransferStarted {
                        connection: contact.id(),
                        message_id: message.id,
                        to: contact.peer_host(),
                    })
                }
                Err(e) => {
                    tracing::trace!("{} not sent on {}: {}", message.id, contact.id(), e);
                }
            }
        }
        None
    }
}

/// Messages addressed directly to a connected peer, contact by contact
pub fn deliverable_candidates(messages: &[&Message], contacts: &[Contact<'_>]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (idx, contact) in contacts.iter().enumerate() {
        let peer = contact.peer_host();
        for message in messages.iter().filter(|m| m.to == peer) {
            candidates.push(Candidate::new(message.id.clone(), idx));
        }
    }
    candidates
}
