//! Metrics recorder for forwarding operations
//!
//! Every call is a no-op until a recorder is installed, so routers can
//! record unconditionally.

use crate::congestion::CongestionStep;
use crate::core::HostId;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    describe_counter!(
        "dtn_transfers_started_total",
        "Transfers started towards peers"
    );
    describe_counter!(
        "dtn_replications_total",
        "Replicas received and stored for forwarding"
    );
    describe_counter!("dtn_deliveries_total", "Final deliveries, duplicates included");
    describe_counter!(
        "dtn_first_deliveries_total",
        "Final deliveries that created a receipt"
    );
    describe_counter!("dtn_drops_total", "Messages evicted to make room");
    describe_counter!(
        "dtn_replicas_purged_total",
        "Replicas retired after a receipt confirmed delivery"
    );
    describe_counter!(
        "dtn_transfers_aborted_total",
        "In-flight transfers aborted because their message was delivered"
    );

    describe_gauge!("dtn_congestion_value", "Smoothed drop/replication ratio");
    describe_gauge!("dtn_transfer_quota", "Transfers granted to the next contact");
    describe_gauge!(
        "dtn_buffer_occupancy_percent",
        "Buffer occupancy in percent"
    );

    describe_histogram!(
        "dtn_drop_replication_ratio",
        "Raw drop/replication ratio observed per contact"
    );
}

fn host_label(host: HostId) -> String {
    host.to_string()
}

// ============== Contact Lifecycle ==============

/// Record a teardown recomputation
pub fn record_congestion_step(host: HostId, step: &CongestionStep) {
    gauge!("dtn_congestion_value", "host" => host_label(host)).set(step.cv);
    gauge!("dtn_transfer_quota", "host" => host_label(host)).set(f64::from(step.quota));
    if let Some(ratio) = step.ratio {
        histogram!("dtn_drop_replication_ratio").record(ratio);
    }
}

/// Record replicas retired at contact-up
pub fn record_purge(host: HostId, purged: usize, aborted: usize) {
    if purged == 0 {
        return;
    }
    counter!("dtn_replicas_purged_total", "host" => host_label(host)).increment(purged as u64);
    if aborted > 0 {
        counter!("dtn_transfers_aborted_total", "host" => host_label(host))
            .increment(aborted as u64);
    }
}

// ============== Transfers ==============

pub fn record_transfer_started(host: HostId) {
    counter!("dtn_transfers_started_total", "host" => host_label(host)).increment(1);
}

pub fn record_replication(host: HostId) {
    counter!("dtn_replications_total", "host" => host_label(host)).increment(1);
}

pub fn record_delivery(host: HostId, first: bool) {
    counter!("dtn_deliveries_total", "host" => host_label(host)).increment(1);
    if first {
        counter!("dtn_first_deliveries_total", "host" => host_label(host)).increment(1);
    }
}

// ============== Buffer ==============

pub fn record_drops(host: HostId, dropped: usize) {
    if dropped > 0 {
        counter!("dtn_drops_total", "host" => host_label(host)).increment(dropped as u64);
    }
}

pub fn set_buffer_occupancy(host: HostId, percent: f64) {
    gauge!("dtn_buffer_occupancy_percent", "host" => host_label(host)).set(percent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        // Should not panic when called multiple times
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_recording_without_recorder() {
        let step = CongestionStep {
            ratio: Some(0.5),
            previous_cv: 0.0,
            cv: 0.45,
            previous_quota: 3,
            quota: 1,
        };
        record_congestion_step(HostId(1), &step);
        record_purge(HostId(1), 2, 1);
        record_drops(HostId(1), 0);
        set_buffer_occupancy(HostId(1), 42.0);
    }
}
