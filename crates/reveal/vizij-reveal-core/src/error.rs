//! Error types for configuration and stage management.
//!
//! Runtime callbacks (intersection records, frame ticks) never fail; stale or
//! unknown tokens are dropped. Only configuration handed in by the content
//! layer can be rejected.

use crate::ids::InstId;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// Threshold is not a number.
    #[error("invalid threshold: {value}")]
    InvalidThreshold { value: f64 },

    /// Root margin does not follow the CSS margin shorthand.
    #[error("invalid root margin '{input}': {reason}")]
    InvalidRootMargin { input: String, reason: String },

    /// Instance is not mounted on this stage.
    #[error("instance not found: {0:?}")]
    UnknownInstance(InstId),

    /// Config JSON could not be decoded.
    #[error("config parse error: {reason}")]
    Parse { reason: String },
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse {
            reason: e.to_string(),
        }
    }
}
