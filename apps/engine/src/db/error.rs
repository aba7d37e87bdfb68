//! Database error types.

use thiserror::Error;
use vocab_core::EngineError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlite(e) => EngineError::Storage(format!("sqlite error: {e}")),
            DbError::Json(e) => EngineError::InvalidData(format!("json error: {e}")),
            DbError::InvalidData(msg) => EngineError::InvalidData(msg),
        }
    }
}
