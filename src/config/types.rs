//! Router configuration values
//!
//! All values are read once when a router is built and never change after.

use crate::config::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Settings namespace of the flooding router
pub const EPIDEMIC_NS: &str = "EpidemicRouterWithRR";

/// Settings namespace of the predictability router
pub const PROPHET_NS: &str = "ProphetRouterWithRR";

pub const DEFAULT_ADDITIVE_INCREASE: u32 = 1;
pub const DEFAULT_MULTIPLICATIVE_DECREASE: f64 = 0.2;
pub const DEFAULT_ALPHA_CV: f64 = 0.9;

/// Delivery predictability initialization constant
pub const P_INIT: f64 = 0.75;

/// Delivery predictability aging constant
pub const AGING_DECAY: f64 = 0.98;

pub const DEFAULT_BETA: f64 = 0.25;

/// AIMD parameters of the congestion controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CongestionConfig {
    /// Quota added after a contact that did not worsen congestion
    pub additive_increase: u32,

    /// Factor applied to the quota after a contact that worsened congestion
    pub multiplicative_decrease: f64,

    /// Smoothing weight of the newest drop/replication ratio
    #[serde(rename = "alphaCV")]
    pub alpha_cv: f64,
}

impl Default for CongestionConfig {
    fn default() -> Self {
        Self {
            additive_increase: DEFAULT_ADDITIVE_INCREASE,
            multiplicative_decrease: DEFAULT_MULTIPLICATIVE_DECREASE,
            alpha_cv: DEFAULT_ALPHA_CV,
        }
    }
}

impl CongestionConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let md = self.multiplicative_decrease;
        if !(md > 0.0 && md <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "multiplicativeDecrease",
                reason: format!("{} is outside (0, 1]", md),
            });
        }
        if !(0.0..=1.0).contains(&self.alpha_cv) {
            return Err(ConfigError::Invalid {
                key: "alphaCV",
                reason: format!("{} is outside [0, 1]", self.alpha_cv),
            });
        }
        Ok(())
    }
}

/// Tie-breaking order among otherwise equal forwarding candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    /// Shuffled with a seed derived from the current simulated second
    #[default]
    Random,
    /// Oldest arrival first
    Fifo,
}

/// Settings shared by both router variants
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    #[serde(flatten)]
    pub congestion: CongestionConfig,

    /// Purge the local copy when the destination reports it already has it
    #[serde(default)]
    pub delete_delivered: bool,

    #[serde(default)]
    pub send_queue: QueueMode,
}

impl RouterConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.congestion.validate()
    }

    pub fn with_congestion(mut self, congestion: CongestionConfig) -> Self {
        self.congestion = congestion;
        self
    }

    pub fn with_delete_delivered(mut self, enabled: bool) -> Self {
        self.delete_delivered = enabled;
        self
    }

    pub fn with_send_queue(mut self, mode: QueueMode) -> Self {
        self.send_queue = mode;
        self
    }
}

/// Parameters of the delivery predictability model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictabilityConfig {
    pub p_init: f64,
    pub beta: f64,
    pub aging_decay: f64,
    pub seconds_per_time_unit: u32,
}

impl PredictabilityConfig {
    pub fn new(seconds_per_time_unit: u32) -> Self {
        Self {
            p_init: P_INIT,
            beta: DEFAULT_BETA,
            aging_decay: AGING_DECAY,
            seconds_per_time_unit,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.seconds_per_time_unit == 0 {
            return Err(ConfigError::Invalid {
                key: "secondsPerTimeUnit",
                reason: "must be positive".into(),
            });
        }
        if self.beta < 0.0 {
            return Err(ConfigError::Invalid {
                key: "beta",
                reason: format!("{} is negative", self.beta),
            });
        }
        Ok(())
    }
}

/// Full configuration of a prophet router
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProphetConfig {
    pub router: RouterConfig,
    pub predictability: PredictabilityConfig,
}

impl ProphetConfig {
    pub fn new(seconds_per_time_unit: u32) -> Self {
        Self {
            router: RouterConfig::default(),
            predictability: PredictabilityConfig::new(seconds_per_time_unit),
        }
    }

    pub fn with_router(mut self, router: RouterConfig) -> Self {
        self.router = router;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.predictability.beta = beta;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.router.validate()?;
        self.predictability.validate()
    }
}
