//! Core learning-progress library for the vocabulary engine.
//!
//! Provides:
//! - Spaced repetition scheduling (SM-2 variant with latency drift)
//! - Multiple-choice question composition (distractor candidate pipeline)
//! - Daily streak tracking and milestone detection
//! - Achievement catalog and tiered unlock evaluation
//! - Storage ports implemented by the application layer

pub mod achievements;
pub mod composer;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod streak;
pub mod types;

pub use achievements::{
    default_catalog, AchievementDefinition, AchievementEngine, AchievementProgress,
    AchievementStats, Catalog, EvaluationTier, LifetimeStats, Rarity, SessionContext,
    UnlockCriteria, UnlockedAchievement,
};
pub use composer::{CandidateFilter, Direction, Question, QuestionComposer, QuestionOption};
pub use error::{EngineError, Result};
pub use scheduler::Scheduler;
pub use store::{
    AchievementStore, DistractorSource, SessionLog, SessionTotals, SettingsStore, StatsSource,
    StreakStore, WordRepository,
};
pub use streak::{DayDelta, Milestone, Reconciliation, StreakTracker, StreakUpdate};
pub use types::{
    CefrLevel, EngineSettings, LanguagePair, SessionSummary, StreakState, StudyQueue, Word,
    WordMasteryRecord, WordStatus,
};
