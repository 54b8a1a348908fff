//! Message buffer
//!
//! The store itself belongs to the simulation engine; [`MessageStore`] is the
//! part of it the forwarding core relies on, and [`MemoryStore`] is the
//! in-memory implementation used by the bundled engine.

use crate::core::{Message, MessageId};
use std::collections::{BTreeMap, HashMap, HashSet};

pub trait MessageStore {
    /// Total buffer size in bytes
    fn capacity(&self) -> u64;

    /// Bytes currently occupied
    fn used(&self) -> u64;

    fn free_space(&self) -> u64 {
        self.capacity().saturating_sub(self.used())
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: &MessageId) -> bool;

    fn get(&self, id: &MessageId) -> Option<&Message>;

    fn insert(&mut self, message: Message);

    fn remove(&mut self, id: &MessageId) -> Option<Message>;

    /// Held messages in arrival order
    fn messages(&self) -> Vec<&Message>;

    /// Oldest message whose id is not in `excluded`
    fn oldest_excluding(&self, excluded: &HashSet<MessageId>) -> Option<&Message>;

    /// Occupancy percentage, clamped to 100
    fn occupancy(&self) -> f64 {
        let capacity = self.capacity();
        if capacity == 0 {
            return 0.0;
        }
        (self.used() as f64 / capacity as f64 * 100.0).min(100.0)
    }
}

/// Arrival-order key (older first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ArrivalKey {
    received_millis: u64,
    seq: u64,
}

pub struct MemoryStore {
    /// Held messages
    messages: HashMap<MessageId, (ArrivalKey, Message)>,

    /// Arrival-ordered index for eviction
    arrival_index: BTreeMap<ArrivalKey, MessageId>,

    capacity: u64,
    used: u64,
    next_seq: u64,
}

impl MemoryStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            messages: HashMap::new(),
            arrival_index: BTreeMap::new(),
            capacity,
            used: 0,
            next_seq: 0,
        }
    }
}

impl MessageStore for MemoryStore {
    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn used(&self) -> u64 {
        self.used
    }

    fn len(&self) -> usize {
        self.messages.len()
    }

    fn contains(&self, id: &MessageId) -> bool {
        self.messages.contains_key(id)
    }

    fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.get(id).map(|(_, m)| m)
    }

    fn insert(&mut self, message: Message) {
        self.remove(&message.id);

        // simulated time is never negative
        let key = ArrivalKey {
            received_millis: (message.received_at * 1000.0) as u64,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        self.used += message.size;
        self.arrival_index.insert(key, message.id.clone());
        self.messages.insert(message.id.clone(), (key, message));
    }

    fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let (key, message) = self.messages.remove(id)?;
        self.used = self.used.saturating_sub(message.size);
        self.arrival_index.remove(&key);
        Some(message)
    }

    fn messages(&self) -> Vec<&Message> {
        self.arrival_index
            .values()
            .filter_map(|id| self.get(id))
            .collect()
    }

    fn oldest_excluding(&self, excluded: &HashSet<MessageId>) -> Option<&Message> {
        self.arrival_index
            .values()
            .find(|id| !excluded.contains(*id))
            .and_then(|id| self.get(id))
    }
}
