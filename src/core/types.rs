//! Identities and the message record shared by every component

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulated time in seconds
pub type SimTime = f64;

/// Opaque host identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostId(pub u32);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identity of a contact between two hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Message identity as assigned by the originating host
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A message replica held by one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Network-wide message identifier
    pub id: MessageId,

    /// Originating host
    pub from: HostId,

    /// Final destination
    pub to: HostId,

    /// Size in bytes
    pub size: u64,

    /// Number of hops this replica has travelled
    pub hop_count: u32,

    /// Time the message was created at its source
    pub created_at: SimTime,

    /// Initial time-to-live in seconds (`None` = never expires)
    pub ttl: Option<f64>,

    /// Time this replica arrived in the local buffer
    pub received_at: SimTime,
}

impl Message {
    /// Create a freshly originated message
    pub fn new(
        id: impl Into<MessageId>,
        from: HostId,
        to: HostId,
        size: u64,
        created_at: SimTime,
    ) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            size,
            hop_count: 0,
            created_at,
            ttl: None,
            received_at: created_at,
        }
    }

    /// Set the initial time-to-live
    pub fn with_ttl(mut self, ttl: f64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the hop count
    pub fn with_hops(mut self, hop_count: u32) -> Self {
        self.hop_count = hop_count;
        self
    }

    /// Remaining time-to-live at `now`
    pub fn remaining_ttl(&self, now: SimTime) -> Option<f64> {
        self.ttl.map(|ttl| ttl - (now - self.created_at))
    }

    /// Replica handed to the next hop at `now`
    pub fn replicate(&self, now: SimTime) -> Self {
        Self {
            hop_count: self.hop_count + 1,
            received_at: now,
            ..self.clone()
        }
    }

    /// Check whether `host` is the final destination
    pub fn is_final_destination(&self, host: HostId) -> bool {
        self.to == host
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
