use crate::core::SimTime;
use serde::{Deserialize, Serialize};

/// Congestion value recorded at a contact teardown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CongestionSample {
    pub value: f64,
    pub time: SimTime,
}

/// Drop and replication counts accumulated between two teardowns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCounters {
    pub drops: u64,
    pub replications: u64,
}

impl ContactCounters {
    pub fn new(drops: u64, replications: u64) -> Self {
        Self {
            drops,
            replications,
        }
    }
}

/// What a single teardown recomputation did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CongestionStep {
    /// Drop/replication ratio observed, `None` when nothing was replicated
    pub ratio: Option<f64>,
    pub previous_cv: f64,
    pub cv: f64,
    pub previous_quota: u32,
    pub quota: u32,
}

impl CongestionStep {
    /// Whether the additive branch was taken
    pub fn increased(&self) -> bool {
        self.cv <= self.previous_cv
    }
}

/// Point-in-time view of a controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CongestionStatus {
    pub cv: f64,
    pub quota: u32,
    pub pending_drops: u64,
    pub pending_replications: u64,
    pub samples: usize,
}

impl std::fmt::Display for CongestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CV {:.4}, quota {} ({} drops / {} reps pending, {} samples)",
            self.cv, self.quota, self.pending_drops, self.pending_replications, self.samples
        )
    }
}
