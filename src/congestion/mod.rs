//! Congestion control
//!
//! Per-node AIMD loop driven by the drops and replications observed
//! between contact teardowns.

pub mod controller;
pub mod types;

pub use controller::{hop_credit, CongestionController, INITIAL_QUOTA};
pub use types::{CongestionSample, CongestionStatus, CongestionStep, ContactCounters};
