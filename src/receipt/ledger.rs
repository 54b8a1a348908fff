//! Ledger of confirmed deliveries
//!
//! Gossiped on every contact; any replica whose id appears here is retired.

use crate::core::{MessageId, SimTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Proof that a message reached its destination somewhere in the network
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Time of the first final delivery
    pub created_at: SimTime,

    /// Remaining ttl of the delivered replica; carried, never used for expiry
    pub ttl: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptLedger {
    records: HashMap<MessageId, ReceiptRecord>,
}

impl ReceiptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &MessageId) -> Option<&ReceiptRecord> {
        self.records.get(id)
    }

    /// Record the first final delivery of `id`.
    ///
    /// Returns `false` and leaves the existing record untouched when the id
    /// is already known.
    pub fn record_delivery(&mut self, id: MessageId, now: SimTime, ttl: Option<f64>) -> bool {
        if self.records.contains_key(&id) {
            return false;
        }
        self.records.insert(
            id,
            ReceiptRecord {
                created_at: now,
                ttl,
            },
        );
        true
    }

    /// Copy in every record of `other` not yet known locally.
    ///
    /// Returns the ids that were added. Ids already present keep their
    /// first-seen record.
    pub fn merge_from(&mut self, other: &ReceiptLedger) -> Vec<MessageId> {
        let mut added = Vec::new();
        for (id, record) in &other.records {
            match self.records.get(id) {
                Some(existing) => {
                    if existing != record {
                        tracing::warn!(
                            "Receipt for {} differs between peers, keeping first-seen record",
                            id
                        );
                    }
                }
                None => {
                    self.records.insert(id.clone(), *record);
                    added.push(id.clone());
                }
            }
        }
        added
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MessageId, &ReceiptRecord)> {
        self.records.iter()
    }

    /// Records ordered by message id
    pub fn snapshot(&self) -> Vec<(MessageId, ReceiptRecord)> {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|(id, record)| (id.clone(), *record))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
