//! Message buffer and eviction policy

pub mod eviction;
pub mod store;

pub use eviction::{make_room, Eviction};
pub use store::{MemoryStore, MessageStore};
