//! Minimal in-memory contact engine
//!
//! Stands in for the discrete-event simulator: it owns the hosts, their links
//! and the clock, and feeds routers contact-up, contact-down and tick events.
//! There is no mobility model; scenarios list their contacts explicitly.

pub mod error;
pub mod event;
pub mod link;
pub mod world;

pub use error::{SimError, SimResult};
pub use event::{ScheduledEvent, SimEvent};
pub use link::{LinkState, PendingTransfer, SimLink};
pub use world::{World, WorldStats};
