//! Namespaced settings document
//!
//! ```json
//! {
//!   "EpidemicRouterWithRR": { "additiveIncrease": 2 },
//!   "ProphetRouterWithRR": { "secondsPerTimeUnit": 30, "beta": 0.3 },
//!   "BufferOccupancyReport": { "occupancyInterval": 600 }
//! }
//! ```

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::types::{
    PredictabilityConfig, ProphetConfig, RouterConfig, DEFAULT_BETA, PROPHET_NS,
};
use crate::report::DEFAULT_OCCUPANCY_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProphetSection {
    #[serde(flatten)]
    router: RouterConfig,

    #[serde(default)]
    beta: Option<f64>,

    #[serde(default)]
    seconds_per_time_unit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OccupancySection {
    #[serde(default)]
    occupancy_interval: Option<f64>,
}

/// Settings for every router type, keyed by namespace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterSettings {
    #[serde(rename = "EpidemicRouterWithRR", default)]
    epidemic: Option<RouterConfig>,

    #[serde(rename = "ProphetRouterWithRR", default)]
    prophet: Option<ProphetSection>,

    #[serde(rename = "BufferOccupancyReport", default)]
    occupancy: Option<OccupancySection>,
}

impl RouterSettings {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Epidemic settings; every key is optional
    pub fn epidemic(&self) -> ConfigResult<RouterConfig> {
        let config = self.epidemic.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Prophet settings; fails when `secondsPerTimeUnit` is absent
    pub fn prophet(&self) -> ConfigResult<ProphetConfig> {
        let section = self.prophet.clone().unwrap_or_default();
        let seconds_per_time_unit =
            section
                .seconds_per_time_unit
                .ok_or(ConfigError::Missing {
                    namespace: PROPHET_NS,
                    key: "secondsPerTimeUnit",
                })?;

        let config = ProphetConfig {
            router: section.router,
            predictability: PredictabilityConfig {
                beta: section.beta.unwrap_or(DEFAULT_BETA),
                ..PredictabilityConfig::new(seconds_per_time_unit)
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Seconds between buffer occupancy snapshots
    pub fn occupancy_interval(&self) -> ConfigResult<f64> {
        let interval = self
            .occupancy
            .as_ref()
            .and_then(|s| s.occupancy_interval)
            .unwrap_or(DEFAULT_OCCUPANCY_INTERVAL);
        if !(interval.is_finite() && interval > 0.0) {
            return Err(ConfigError::Invalid {
                key: "occupancyInterval",
                reason: format!("must be a positive number of seconds, got {}", interval),
            });
        }
        Ok(interval)
    }
}
