//! Router configuration
//!
//! Options are grouped per router type under a namespace, mirroring how the
//! simulation engine's settings files are organised.

pub mod error;
pub mod settings;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use settings::RouterSettings;
pub use types::{
    CongestionConfig, PredictabilityConfig, ProphetConfig, QueueMode, RouterConfig, AGING_DECAY,
    DEFAULT_ADDITIVE_INCREASE, DEFAULT_ALPHA_CV, DEFAULT_BETA, DEFAULT_MULTIPLICATIVE_DECREASE,
    EPIDEMIC_NS, PROPHET_NS, P_INIT,
};
