//! Drop-oldest eviction
//!
//! Frees room for an incoming message by dropping the oldest messages that
//! are not currently being sent. Every eviction counts as a congestion drop.

use crate::buffer::store::MessageStore;
use crate::congestion::CongestionController;
use crate::core::{AdmissionDenied, AdmissionResult, MessageId};
use std::collections::HashSet;

/// Messages dropped while making room
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Eviction {
    pub dropped: Vec<MessageId>,
    pub freed_bytes: u64,
}

/// Make at least `size` bytes free in `store`.
///
/// Evictions performed before running out of candidates are kept even when
/// admission ultimately fails.
pub fn make_room<S: MessageStore + ?Sized>(
    store: &mut S,
    size: u64,
    in_flight: &HashSet<MessageId>,
    controller: &mut CongestionController,
) -> AdmissionResult<Eviction> {
    let capacity = store.capacity();
    if size > capacity {
        return Err(AdmissionDenied::TooLarge { size, capacity });
    }

    let mut eviction = Eviction::default();
    while store.free_space() < size {
        let victim = match store.oldest_excluding(in_flight) {
            Some(m) => m.id.clone(),
            None => {
                tracing::debug!(
                    "No evictable message left, {} of {} bytes free after {} drops",
                    store.free_space(),
                    size,
                    eviction.dropped.len()
                );
                return Err(AdmissionDenied::BufferExhausted {
                    needed: size,
                    free: store.free_space(),
                    evicted: eviction.dropped.len(),
                });
            }
        };

        let Some(dropped) = store.remove(&victim) else {
            tracing::warn!("Store offered {} for eviction but could not remove it", victim);
            return Err(AdmissionDenied::BufferExhausted {
                needed: size,
                free: store.free_space(),
                evicted: eviction.dropped.len(),
            });
        };
        tracing::trace!("Dropped {} ({} bytes) to make room", victim, dropped.size);
        eviction.freed_bytes += dropped.size;
        eviction.dropped.push(victim);
        controller.record_drop();
    }

    Ok(eviction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::store::MemoryStore;
    use crate::config::CongestionConfig;
    use crate::core::{HostId, Message};

    fn msg(id: &str, size: u64, at: f64) -> Message {
        Message::new(id, HostId(0), HostId(9), size, at)
    }

    fn controller() -> CongestionController {
        CongestionController::new(CongestionConfig::default())
    }

    /// Capacity 100 with 90 bytes used; `pinned` is the in-flight filler.
    fn store_with(evictable: &[(&str, u64)]) -> (MemoryStore, HashSet<MessageId>) {
        let mut store = MemoryStore::new(100);
        let used: u64 = evictable.iter().map(|(_, s)| s).sum();
        for (i, (id, size)) in evictable.iter().enumerate() {
            store.insert(msg(id, *size, i as f64 + 1.0));
        }
        store.insert(msg("pinned", 90 - used, 50.0));

        let mut in_flight = HashSet::new();
        in_flight.insert(MessageId::from("pinned"));
        (store, in_flight)
    }

    #[test]
    fn test_evicts_oldest_until_room() {
        let (mut store, in_flight) = store_with(&[("old", 30), ("newer", 25)]);
        let mut controller = controller();
        assert_eq!(store.free_space(), 10);

        let eviction = make_room(&mut store, 50, &in_flight, &mut controller).unwrap();

        assert_eq!(
            eviction.dropped,
            vec![MessageId::from("old"), MessageId::from("newer")]
        );
        assert!(store.free_space() >= 50);
        assert_eq!(controller.counters().drops, 2);
    }

    #[test]
    fn test_exhausted_keeps_evictions() {
        let (mut store, in_flight) = store_with(&[("only", 20)]);
        let mut controller = controller();

        let result = make_room(&mut store, 50, &in_flight, &mut controller);

        assert!(matches!(
            result,
            Err(AdmissionDenied::BufferExhausted { evicted: 1, .. })
        ));
        assert!(!store.contains(&"only".into()));
        assert_eq!(store.free_space(), 30);
        assert_eq!(controller.counters().drops, 1);
    }

    #[test]
    fn test_too_large_evicts_nothing() {
        let (mut store, in_flight) = store_with(&[("a", 30)]);
        let mut controller = controller();

        let result = make_room(&mut store, 101, &in_flight, &mut controller);

        assert_eq!(
            result,
            Err(AdmissionDenied::TooLarge {
                size: 101,
                capacity: 100
            })
        );
        assert!(store.contains(&"a".into()));
        assert_eq!(controller.counters().drops, 0);
    }

    /// Offers its oldest message for eviction but never lets go of it
    struct StuckStore(MemoryStore);

    impl MessageStore for StuckStore {
        fn capacity(&self) -> u64 {
            self.0.capacity()
        }
        fn used(&self) -> u64 {
            self.0.used()
        }
        fn len(&self) -> usize {
            self.0.len()
        }
        fn contains(&self, id: &MessageId) -> bool {
            self.0.contains(id)
        }
        fn get(&self, id: &MessageId) -> Option<&Message> {
            self.0.get(id)
        }
        fn insert(&mut self, message: Message) {
            self.0.insert(message)
        }
        fn remove(&mut self, _id: &MessageId) -> Option<Message> {
            None
        }
        fn messages(&self) -> Vec<&Message> {
            self.0.messages()
        }
        fn oldest_excluding(&self, excluded: &HashSet<MessageId>) -> Option<&Message> {
            self.0.oldest_excluding(excluded)
        }
    }

    #[test]
    fn test_unremovable_victim_stops_eviction() {
        let mut store = StuckStore(MemoryStore::new(100));
        store.insert(msg("stuck", 80, 1.0));
        let mut controller = controller();

        let result = make_room(&mut store, 50, &HashSet::new(), &mut controller);

        assert_eq!(
            result,
            Err(AdmissionDenied::BufferExhausted {
                needed: 50,
                free: 20,
                evicted: 0
            })
        );
        assert_eq!(controller.counters().drops, 0);
    }

    #[test]
    fn test_enough_room_is_noop() {
        let mut store = MemoryStore::new(100);
        let mut controller = controller();

        let eviction = make_room(&mut store, 100, &HashSet::new(), &mut controller).unwrap();
        assert!(eviction.dropped.is_empty());
    }
}
