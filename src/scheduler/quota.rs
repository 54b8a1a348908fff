use crate::core::ConnectionId;
use std::collections::HashMap;

/// Transfers still permitted on each live contact.
///
/// An entry exists only while its quota is positive.
#[derive(Debug, Clone, Default)]
pub struct QuotaTable {
    quotas: HashMap<ConnectionId, u32>,
}

impl QuotaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `quota` transfers to a contact that just came up
    pub fn allocate(&mut self, connection: ConnectionId, quota: u32) {
        if quota == 0 {
            self.quotas.remove(&connection);
        } else {
            self.quotas.insert(connection, quota);
        }
    }

    pub fn remaining(&self, connection: ConnectionId) -> Option<u32> {
        self.quotas.get(&connection).copied()
    }

    pub fn has_quota(&self, connection: ConnectionId) -> bool {
        self.quotas.contains_key(&connection)
    }

    /// Spend one transfer; the entry disappears when it reaches zero
    pub fn consume(&mut self, connection: ConnectionId) -> Option<u32> {
        let remaining = self.quotas.get_mut(&connection)?;
        *remaining -= 1;
        let left = *remaining;
        if left == 0 {
            self.quotas.remove(&connection);
        }
        Some(left)
    }

    pub fn release(&mut self, connection: ConnectionId) -> Option<u32> {
        self.quotas.remove(&connection)
    }

    pub fn len(&self) -> usize {
        self.quotas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotas.is_empty()
    }
}
