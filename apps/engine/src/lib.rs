//! Application layer for the vocabulary learning engine.
//!
//! SQLite storage behind every `vocab-core` port, configuration, tracing
//! setup, and the `LearningEngine` that runs a session end to end.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;

pub use config::EngineConfig;
pub use db::{DbError, SqliteRepository};
pub use engine::{AnswerOutcome, LearningEngine, LevelUp, SessionOutcome};

/// Load configuration, install tracing and open the engine.
pub fn run() -> anyhow::Result<LearningEngine> {
    let config = EngineConfig::from_env()?;
    logging::init_tracing(&config.log_filter);
    LearningEngine::open(&config)
}
