//! Error types for vocab-core.

use thiserror::Error;

/// Result type alias using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the engine and its storage ports.
///
/// A word without a mastery record and a dataset too small for a full set of
/// distractors are both handled in place and never show up here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage failure: {0}")]
    Storage(String),

    /// Rejected before or during a write; retrying the same input fails again.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid criteria for achievement {achievement_id}: {reason}")]
    InvalidCriteria {
        achievement_id: String,
        reason: String,
    },

    #[error("duplicate achievement id {0}")]
    DuplicateAchievement(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),
}

impl EngineError {
    /// Whether retrying the same call may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
