use crate::core::{ConnectionId, HostId, MessageId};
use serde::{Deserialize, Serialize};

/// Statistics for one router
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterStats {
    /// Replicas received from peers and stored
    pub messages_received: u64,

    /// Messages originated locally
    pub messages_created: u64,

    /// Final deliveries to this host (duplicates included)
    pub messages_delivered: u64,

    /// Transfers started towards peers
    pub transfers_started: u64,

    /// Messages evicted to make room
    pub messages_dropped: u64,

    /// Replicas retired because a receipt confirmed delivery
    pub replicas_purged: u64,

    /// In-flight transfers aborted by a purge
    pub transfers_aborted: u64,

    /// Incoming messages that could not be admitted
    pub admissions_denied: u64,
}

impl std::fmt::Display for RouterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Router: {} rcvd, {} dlvd, {} sent, {} drop, {} purged ({} aborted)",
            self.messages_received,
            self.messages_delivered,
            self.transfers_started,
            self.messages_dropped,
            self.replicas_purged,
            self.transfers_aborted
        )
    }
}

/// What a contact-up event did
#[derive(Debug, Clone, PartialEq)]
pub struct ContactUp {
    pub connection: ConnectionId,
    pub peer: HostId,
    /// Quota granted to the contact
    pub quota: u32,
    /// Receipts newly learned from the peer
    pub receipts_learned: usize,
    /// Local replicas retired by the ledger
    pub purged: Vec<MessageId>,
    /// Transfers aborted before their message was retired
    pub aborted: usize,
}

/// Result of handing a completed incoming transfer to the router
#[derive(Debug, Clone, PartialEq)]
pub enum Reception {
    /// This host is the destination; `first` when a receipt was created
    Delivered { first: bool },
    /// Stored for forwarding after evicting `evicted`
    Stored { evicted: Vec<MessageId> },
}
