//! Periodic buffer occupancy sampling

use crate::core::{HostId, SimTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default seconds between two snapshots
pub const DEFAULT_OCCUPANCY_INTERVAL: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupancySample {
    pub time: SimTime,
    pub percent: f64,
}

/// Records every host's buffer occupancy once per interval
#[derive(Debug, Clone)]
pub struct OccupancySampler {
    interval: f64,
    last_record: Option<SimTime>,
    snapshots: usize,
    series: BTreeMap<HostId, Vec<OccupancySample>>,
}

impl OccupancySampler {
    pub fn new(interval: f64) -> Self {
        let interval = if interval > 0.0 {
            interval
        } else {
            DEFAULT_OCCUPANCY_INTERVAL
        };
        Self {
            interval,
            last_record: None,
            snapshots: 0,
            series: BTreeMap::new(),
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Take a snapshot if an interval has passed since the previous one.
    ///
    /// Returns whether a snapshot was taken.
    pub fn observe<I>(&mut self, now: SimTime, hosts: I) -> bool
    where
        I: IntoIterator<Item = (HostId, f64)>,
    {
        if let Some(last) = self.last_record {
            if now - last < self.interval {
                return false;
            }
        }
        self.last_record = Some(now);
        self.snapshots += 1;

        for (host, percent) in hosts {
            self.series.entry(host).or_default().push(OccupancySample {
                time: now,
                percent: percent.min(100.0),
            });
        }
        true
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots
    }

    pub fn series(&self) -> &BTreeMap<HostId, Vec<OccupancySample>> {
        &self.series
    }

    /// Mean occupancy per host over all snapshots taken
    pub fn averages(&self) -> BTreeMap<HostId, f64> {
        self.series
            .iter()
            .map(|(host, samples)| {
                let total: f64 = samples.iter().map(|s| s.percent).sum();
                let avg = if self.snapshots == 0 {
                    0.0
                } else {
                    total / self.snapshots as f64
                };
                (*host, avg)
            })
            .collect()
    }
}

impl Default for OccupancySampler {
    fn default() -> Self {
        Self::new(DEFAULT_OCCUPANCY_INTERVAL)
    }
}
