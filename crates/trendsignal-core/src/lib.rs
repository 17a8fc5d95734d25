//! Shared domain records and application configuration for TrendSignal.

pub mod app_config;
pub mod config;
pub mod records;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    Confidence, CreatorAdvice, EmotionalTone, PipelineResult, StrengthEstimate, TopicRecord,
    TrendStrength, VideoRecord, MAX_HOOKS,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
