//! Simulation errors.

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used throughout the simulation core.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced by the simulation core.
///
/// Out-of-range actions are never errors: batteries, prices and dispatch
/// profiles saturate silently. Only malformed input and bad configuration
/// reach the caller.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("expected action of length {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("unsupported pricing policy: {0}")]
    UnsupportedPolicy(String),

    #[error("unsupported reward type: {0}")]
    UnsupportedRewardType(String),

    #[error("unsupported demand pattern: {0}")]
    UnsupportedDemandPattern(String),

    #[error("unsupported cost type: {0}")]
    UnsupportedCostType(String),

    #[error("invalid action type: {0}")]
    InvalidActionType(String),

    #[error("PCS agent index {index} out of range ({agents} agents)")]
    AgentIndexOutOfRange { index: usize, agents: usize },

    #[error("environment must be reset before stepping")]
    NotReset,

    #[error("episode already finished, call reset first")]
    EpisodeFinished,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_message_names_both_lengths() {
        let err = SimError::ShapeMismatch {
            expected: 54,
            actual: 40,
        };
        assert_eq!(err.to_string(), "expected action of length 54, got 40");
    }

    #[test]
    fn config_error_converts() {
        let err: SimError = ConfigError::new("time.max_steps_per_episode", "must be > 0").into();
        assert!(err.to_string().contains("time.max_steps_per_episode"));
    }
}
