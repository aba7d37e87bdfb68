//! Unlock criteria as a closed tagged variant.

use super::stats::AchievementStats;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Declarative unlock rule.
///
/// Stored as JSON with a `kind` tag, e.g. `{"kind":"streak_days","days":7}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnlockCriteria {
    WordsPracticed { count: u32 },
    SessionsCompleted { count: u32 },
    DaysPracticed { count: u32 },
    StreakDays { days: u32 },
    WordsMastered { count: u32 },
    ConsecutiveCorrect { count: u32 },
    SessionAccuracy { percent: u32, min_words: u32 },
    OverallAccuracy { percent: u32, min_words: u32 },
    SessionSpeed { words: u32, max_seconds: u32 },
    SessionWords { count: u32 },
    /// Session started in `[min, max)`; a missing bound is open.
    SessionHour {
        #[serde(default)]
        min: Option<u32>,
        #[serde(default)]
        max: Option<u32>,
    },
    CategoriesCount { count: u32 },
    LanguagesCount { count: u32 },
    DaysInactive { days: u32 },
    SettingsChanged { count: u32 },
    LevelAdvanced { count: u32 },
}

/// Progress toward a criterion. Met once `value >= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriteriaProgress {
    pub value: u32,
    pub max: u32,
}

impl CriteriaProgress {
    fn count(stat: u32, target: u32) -> Self {
        Self {
            value: stat.min(target),
            max: target,
        }
    }

    fn flag(met: bool) -> Self {
        Self {
            value: u32::from(met),
            max: 1,
        }
    }

    pub fn is_met(&self) -> bool {
        self.value >= self.max
    }
}

fn meets_percent(correct: u32, total: u32, percent: u32) -> bool {
    total > 0 && u64::from(correct) * 100 >= u64::from(percent) * u64::from(total)
}

impl UnlockCriteria {
    /// Parse and validate a stored criterion.
    pub fn from_json(achievement_id: &str, json: &str) -> Result<Self> {
        let criteria: Self =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidCriteria {
                achievement_id: achievement_id.to_string(),
                reason: e.to_string(),
            })?;
        criteria.validate(achievement_id)?;
        Ok(criteria)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Tag name as stored.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WordsPracticed { .. } => "words_practiced",
            Self::SessionsCompleted { .. } => "sessions_completed",
            Self::DaysPracticed { .. } => "days_practiced",
            Self::StreakDays { .. } => "streak_days",
            Self::WordsMastered { .. } => "words_mastered",
            Self::ConsecutiveCorrect { .. } => "consecutive_correct",
            Self::SessionAccuracy { .. } => "session_accuracy",
            Self::OverallAccuracy { .. } => "overall_accuracy",
            Self::SessionSpeed { .. } => "session_speed",
            Self::SessionWords { .. } => "session_words",
            Self::SessionHour { .. } => "session_hour",
            Self::CategoriesCount { .. } => "categories_count",
            Self::LanguagesCount { .. } => "languages_count",
            Self::DaysInactive { .. } => "days_inactive",
            Self::SettingsChanged { .. } => "settings_changed",
            Self::LevelAdvanced { .. } => "level_advanced",
        }
    }

    pub fn validate(&self, achievement_id: &str) -> Result<()> {
        let invalid = |reason: &str| {
            Err(EngineError::InvalidCriteria {
                achievement_id: achievement_id.to_string(),
                reason: format!("{}: {}", self.kind(), reason),
            })
        };

        match *self {
            Self::WordsPracticed { count }
            | Self::SessionsCompleted { count }
            | Self::DaysPracticed { count }
            | Self::WordsMastered { count }
            | Self::ConsecutiveCorrect { count }
            | Self::SessionWords { count }
            | Self::CategoriesCount { count }
            | Self::LanguagesCount { count }
            | Self::SettingsChanged { count }
            | Self::LevelAdvanced { count }
            | Self::StreakDays { days: count }
            | Self::DaysInactive { days: count } => {
                if count == 0 {
                    return invalid("target must be positive");
                }
            }
            Self::SessionAccuracy { percent, .. } | Self::OverallAccuracy { percent, .. } => {
                if percent == 0 || percent > 100 {
                    return invalid("percent must be within 1..=100");
                }
            }
            Self::SessionSpeed { words, max_seconds } => {
                if words == 0 || max_seconds == 0 {
                    return invalid("words and max_seconds must be positive");
                }
            }
            Self::SessionHour { min, max } => {
                if min.map_or(false, |h| h > 23) || max.map_or(false, |h| h > 24) {
                    return invalid("hour out of range");
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo >= hi {
                        return invalid("empty hour window");
                    }
                }
                if min.is_none() && max.is_none() {
                    return invalid("hour window needs a bound");
                }
            }
        }
        Ok(())
    }

    /// Evaluate against a statistics snapshot.
    pub fn progress(&self, stats: &AchievementStats) -> CriteriaProgress {
        match *self {
            Self::WordsPracticed { count } => CriteriaProgress::count(stats.words_practiced, count),
            Self::SessionsCompleted { count } => {
                CriteriaProgress::count(stats.sessions_completed, count)
            }
            Self::DaysPracticed { count } => CriteriaProgress::count(stats.days_practiced, count),
            Self::StreakDays { days } => CriteriaProgress::count(stats.streak_days, days),
            Self::WordsMastered { count } => CriteriaProgress::count(stats.words_mastered, count),
            Self::ConsecutiveCorrect { count } => {
                CriteriaProgress::count(stats.consecutive_correct, count)
            }
            Self::SessionAccuracy { percent, min_words } => CriteriaProgress::flag(
                stats.session_words >= min_words
                    && meets_percent(stats.session_correct, stats.session_words, percent),
            ),
            Self::OverallAccuracy { percent, min_words } => CriteriaProgress::flag(
                stats.total_reviews >= min_words
                    && meets_percent(stats.total_correct, stats.total_reviews, percent),
            ),
            Self::SessionSpeed { words, max_seconds } => CriteriaProgress::flag(
                stats.session_words >= words && stats.session_duration_secs <= max_seconds,
            ),
            Self::SessionWords { count } => CriteriaProgress::count(stats.session_words, count),
            Self::SessionHour { min, max } => CriteriaProgress::flag(stats.session_hour.map_or(
                false,
                |hour| min.map_or(true, |lo| hour >= lo) && max.map_or(true, |hi| hour < hi),
            )),
            Self::CategoriesCount { count } => {
                CriteriaProgress::count(stats.categories_count, count)
            }
            Self::LanguagesCount { count } => CriteriaProgress::count(stats.languages_count, count),
            Self::DaysInactive { days } => CriteriaProgress::flag(stats.days_inactive >= days),
            Self::SettingsChanged { count } => {
                CriteriaProgress::count(stats.settings_changed, count)
            }
            Self::LevelAdvanced { count } => CriteriaProgress::count(stats.levels_advanced, count),
        }
    }
}
