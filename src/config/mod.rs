// Configuration module
pub mod settings;

use thiserror::Error;

pub use settings::{Config, NotificationConfig, QueryConfig, ServerConfig, SmtpConfig};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid threshold {name} = {value}: must be a non-negative number")]
    InvalidThreshold { name: String, value: String },

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("unknown configuration key: {0}")]
    UnknownKey(String),
}
