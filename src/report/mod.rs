//! Diagnostics and reports
//!
//! Congestion samples, drop/replication ratios, receipts and predictabilities
//! exposed by routers, plus the buffer occupancy sampler.

pub mod diagnostics;
pub mod error;
pub mod occupancy;
pub mod writer;

pub use diagnostics::RouterDiagnostics;
pub use error::{ReportError, ReportResult};
pub use occupancy::{OccupancySample, OccupancySampler, DEFAULT_OCCUPANCY_INTERVAL};
pub use writer::{congestion_report, drop_ratio_report, occupancy_report, to_json, write_reports};
