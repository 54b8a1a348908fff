//! Congestion-aware opportunistic forwarding for delay-tolerant networks.
//!
//! Routers meet during contact windows. At each contact they gossip delivery
//! receipts, share predictabilities (prophet), allocate a transfer quota
//! from an AIMD congestion controller and start at most one transfer per tick.

pub mod buffer;
pub mod config;
pub mod congestion;
pub mod core;
pub mod metrics;
pub mod predict;
pub mod receipt;
pub mod report;
pub mod routing;
pub mod scheduler;
pub mod sim;

pub use crate::buffer::{MemoryStore, MessageStore};
pub use crate::config::{ProphetConfig, RouterConfig, RouterSettings};
pub use crate::core::{HostId, Message, MessageId};
pub use crate::routing::{EpidemicRouter, ProphetRouter, Router};
