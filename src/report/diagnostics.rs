use crate::congestion::CongestionSample;
use crate::core::{HostId, MessageId};
use crate::receipt::ReceiptRecord;
use crate::routing::RouterStats;
use serde::{Deserialize, Serialize};

/// Everything a router exposes to reporting, captured at one instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterDiagnostics {
    pub host: HostId,
    pub variant: String,
    pub cv: f64,
    pub quota: u32,
    pub congestion_samples: Vec<CongestionSample>,
    pub drop_ratios: Vec<f64>,
    pub receipts: Vec<(MessageId, ReceiptRecord)>,
    /// Aged delivery predictabilities (prophet only)
    pub predictions: Option<Vec<(HostId, f64)>>,
    pub buffer_occupancy: f64,
    pub stats: RouterStats,
}
