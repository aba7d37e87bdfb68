//! Storage ports consumed by the engine.
//!
//! The application layer implements these against its own storage; the core
//! never touches a database directly.

use crate::achievements::{AchievementDefinition, AchievementProgress, LifetimeStats};
use crate::composer::CandidateFilter;
use crate::error::Result;
use crate::types::{
    CefrLevel, EngineSettings, LanguagePair, SessionSummary, StreakState, Word, WordMasteryRecord,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;

/// Source of distractor candidates for multiple-choice questions.
pub trait DistractorSource {
    /// Random-ordered words matching `filter`, none of them in `exclude_ids`.
    fn find_distractor_candidates(
        &self,
        filter: &CandidateFilter,
        exclude_ids: &HashSet<i64>,
        limit: usize,
    ) -> Result<Vec<Word>>;
}

/// Repository for words and per-word mastery records.
pub trait WordRepository: DistractorSource {
    fn find_words_due(
        &self,
        pair: &LanguagePair,
        cefr_level: Option<CefrLevel>,
        limit: usize,
        today: NaiveDate,
    ) -> Result<Vec<Word>>;
    fn find_new_words(
        &self,
        pair: &LanguagePair,
        cefr_level: Option<CefrLevel>,
        limit: usize,
    ) -> Result<Vec<Word>>;
    fn get_word(&self, word_id: i64) -> Result<Option<Word>>;
    fn get_mastery_record(&self, word_id: i64) -> Result<Option<WordMasteryRecord>>;
    fn save_mastery_record(&self, record: &WordMasteryRecord) -> Result<()>;
}

/// Repository for the achievement catalog and per-learner progress.
pub trait AchievementStore {
    fn get_catalog(&self) -> Result<Vec<AchievementDefinition>>;
    fn get_progress(&self, achievement_id: &str) -> Result<Option<AchievementProgress>>;
    fn save_progress(&self, progress: &AchievementProgress) -> Result<()>;
    fn mark_unlocked(&self, achievement_id: &str, at: NaiveDateTime) -> Result<()>;
    fn get_pending_notifications(&self) -> Result<Vec<AchievementProgress>>;
    fn mark_notified(&self, achievement_id: &str) -> Result<()>;
}

/// Counters written when a session is finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTotals {
    pub words_count: u32,
    pub correct_count: u32,
    pub duration_seconds: u32,
}

/// Session log.
pub trait SessionLog {
    fn create_session(&self, started_at: NaiveDateTime) -> Result<String>;
    fn finalize_session(
        &self,
        session_id: &str,
        totals: &SessionTotals,
        completed_at: NaiveDateTime,
    ) -> Result<SessionSummary>;
    fn get_session(&self, session_id: &str) -> Result<Option<SessionSummary>>;
}

/// Singleton streak storage.
pub trait StreakStore {
    fn get_streak(&self) -> Result<StreakState>;
    fn save_streak(&self, state: &StreakState) -> Result<()>;
}

/// Lifetime aggregates for comprehensive achievement checks.
pub trait StatsSource {
    fn lifetime_stats(&self, today: NaiveDate) -> Result<LifetimeStats>;
}

/// Learner settings storage.
pub trait SettingsStore {
    fn get_settings(&self) -> Result<EngineSettings>;
    fn save_settings(&self, settings: &EngineSettings) -> Result<()>;
}
