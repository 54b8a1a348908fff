use crate::core::types::{ConnectionId, MessageId};
use thiserror::Error;

/// Expected refusals to admit a message into a buffer or onto a contact
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDenied {
    #[error("Message of {size} bytes exceeds buffer capacity of {capacity} bytes")]
    TooLarge { size: u64, capacity: u64 },

    #[error("Buffer exhausted: need {needed} bytes, {free} free after {evicted} evictions")]
    BufferExhausted {
        needed: u64,
        free: u64,
        evicted: usize,
    },

    #[error("Transfer quota exhausted on {0}")]
    QuotaExhausted(ConnectionId),

    #[error("Connection {0} is not ready for transfer")]
    ConnectionBusy(ConnectionId),
}

/// Refusals reported by the transfer layer once a transfer was attempted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferDenied {
    #[error("Peer already holds or delivered {0}")]
    Stale(MessageId),

    #[error("Transfer of {0} denied")]
    Unspecified(MessageId),
}

/// Outcome of a failed transfer start
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error(transparent)]
    Admission(#[from] AdmissionDenied),

    #[error(transparent)]
    Transfer(#[from] TransferDenied),
}

pub type AdmissionResult<T> = Result<T, AdmissionDenied>;
