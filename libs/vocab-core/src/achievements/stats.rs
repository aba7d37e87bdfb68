//! Statistics snapshots fed to achievement criteria.

use crate::store::SessionTotals;
use crate::types::{SessionSummary, StreakState};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Lifetime aggregates read from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeStats {
    /// Distinct words answered at least once.
    pub words_practiced: u32,
    pub words_mastered: u32,
    pub total_reviews: u32,
    pub total_correct: u32,
    pub sessions_completed: u32,
    pub days_practiced: u32,
    pub categories_practiced: u32,
    pub languages_practiced: u32,
    /// Gap in days before the latest practice day.
    pub days_inactive: u32,
    pub settings_changed: u32,
    pub levels_advanced: u32,
}

/// In-memory state of one learning session.
///
/// Owned by the caller and passed into every engine call; nothing about the
/// active session lives anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub started_at: NaiveDateTime,
    pub words_count: u32,
    pub correct_count: u32,
    pub consecutive_correct: u32,
    pub best_consecutive: u32,
    /// Words answered for the first time ever during this session.
    pub first_time_words: u32,
    /// Lifetime distinct words practiced when the session started.
    pub words_practiced_before: u32,
}

impl SessionContext {
    pub fn new(session_id: String, started_at: NaiveDateTime, words_practiced_before: u32) -> Self {
        Self {
            session_id,
            started_at,
            words_count: 0,
            correct_count: 0,
            consecutive_correct: 0,
            best_consecutive: 0,
            first_time_words: 0,
            words_practiced_before,
        }
    }

    pub fn record_answer(&mut self, is_correct: bool, first_time: bool) {
        self.words_count += 1;
        if first_time {
            self.first_time_words += 1;
        }
        if is_correct {
            self.correct_count += 1;
            self.consecutive_correct += 1;
            self.best_consecutive = self.best_consecutive.max(self.consecutive_correct);
        } else {
            self.consecutive_correct = 0;
        }
    }

    pub fn elapsed_seconds(&self, now: NaiveDateTime) -> u32 {
        (now - self.started_at).num_seconds().clamp(0, i64::from(u32::MAX)) as u32
    }

    pub fn totals(&self, now: NaiveDateTime) -> SessionTotals {
        SessionTotals {
            words_count: self.words_count,
            correct_count: self.correct_count,
            duration_seconds: self.elapsed_seconds(now),
        }
    }

    pub fn hour_of_day(&self) -> u32 {
        self.started_at.hour()
    }
}

/// Flat snapshot of every counter a criterion can read.
///
/// Each tier fills in what it has; everything else stays zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementStats {
    pub words_practiced: u32,
    pub sessions_completed: u32,
    pub days_practiced: u32,
    pub streak_days: u32,
    pub words_mastered: u32,
    pub consecutive_correct: u32,
    pub session_words: u32,
    pub session_correct: u32,
    pub session_duration_secs: u32,
    pub session_hour: Option<u32>,
    pub total_reviews: u32,
    pub total_correct: u32,
    pub categories_count: u32,
    pub languages_count: u32,
    pub days_inactive: u32,
    pub settings_changed: u32,
    pub levels_advanced: u32,
}

impl AchievementStats {
    /// Per-answer snapshot, built without any aggregate query.
    pub fn immediate(ctx: &SessionContext) -> Self {
        Self {
            words_practiced: ctx.words_practiced_before + ctx.first_time_words,
            consecutive_correct: ctx.consecutive_correct,
            session_words: ctx.words_count,
            session_correct: ctx.correct_count,
            ..Default::default()
        }
    }

    /// End-of-session snapshot from the finalized summary.
    pub fn session(summary: &SessionSummary, sessions_completed: u32) -> Self {
        Self {
            sessions_completed,
            session_words: summary.words_count,
            session_correct: summary.correct_count,
            session_duration_secs: summary.duration_seconds,
            session_hour: Some(summary.hour_of_day),
            ..Default::default()
        }
    }

    /// Lifetime snapshot for the full sweep.
    pub fn comprehensive(lifetime: &LifetimeStats, streak: &StreakState) -> Self {
        Self {
            words_practiced: lifetime.words_practiced,
            sessions_completed: lifetime.sessions_completed,
            days_practiced: lifetime.days_practiced,
            streak_days: streak.current_streak_days,
            words_mastered: lifetime.words_mastered,
            total_reviews: lifetime.total_reviews,
            total_correct: lifetime.total_correct,
            categories_count: lifetime.categories_practiced,
            languages_count: lifetime.languages_practiced,
            days_inactive: lifetime.days_inactive,
            settings_changed: lifetime.settings_changed,
            levels_advanced: lifetime.levels_advanced,
            ..Default::default()
        }
    }
}
