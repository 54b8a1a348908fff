//! Metrics and observability
//!
//! Prometheus-compatible metrics for congestion, replication and receipt
//! activity of every router.
//!
//! Key metrics exposed:
//! - Congestion value and transfer quota per host
//! - Drops, replications and deliveries
//! - Replicas purged by receipts and aborted transfers
//! - Buffer occupancy

pub mod exporter;
pub mod recorder;

pub use exporter::{render_metrics, start_metrics_server, MetricsConfig, MetricsError};
pub use recorder::init_metrics;
