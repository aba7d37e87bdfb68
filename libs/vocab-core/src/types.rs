//! Core types for the learning progress engine.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Word learning status, derived from the confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordStatus {
    New,
    Learning,
    Familiar,
    Mastered,
    Retired,
}

impl Default for WordStatus {
    fn default() -> Self {
        Self::New
    }
}

impl WordStatus {
    /// Classify a confidence level (0-100).
    pub fn from_confidence(confidence: u8) -> Self {
        match confidence {
            91..=u8::MAX => Self::Retired,
            71..=90 => Self::Mastered,
            41..=70 => Self::Familiar,
            21..=40 => Self::Learning,
            _ => Self::New,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Familiar => "familiar",
            Self::Mastered => "mastered",
            Self::Retired => "retired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "learning" => Some(Self::Learning),
            "familiar" => Some(Self::Familiar),
            "mastered" => Some(Self::Mastered),
            "retired" => Some(Self::Retired),
            _ => None,
        }
    }

    /// Mastered and retired words both count toward mastery totals.
    pub fn is_mastered(&self) -> bool {
        matches!(self, Self::Mastered | Self::Retired)
    }
}

/// CEFR proficiency tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A1" => Some(Self::A1),
            "A2" => Some(Self::A2),
            "B1" => Some(Self::B1),
            "B2" => Some(Self::B2),
            "C1" => Some(Self::C1),
            "C2" => Some(Self::C2),
            _ => None,
        }
    }

    /// Next tier up, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::A1 => Some(Self::A2),
            Self::A2 => Some(Self::B1),
            Self::B1 => Some(Self::B2),
            Self::B2 => Some(Self::C1),
            Self::C1 => Some(Self::C2),
            Self::C2 => None,
        }
    }
}

/// Source/target language codes for a deck of words.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new("en", "es")
    }
}

/// Immutable vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub source_lang: String,
    pub target_lang: String,
    pub headword: String,
    pub translation: String,
    pub category: String,
    pub difficulty: u8,
    pub frequency_rank: u32,
    pub cefr_level: CefrLevel,
}

impl Word {
    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(&self.source_lang, &self.target_lang)
    }

    pub fn shares_pair(&self, other: &Word) -> bool {
        self.source_lang == other.source_lang && self.target_lang == other.target_lang
    }
}

/// Per-word learning state.
///
/// `times_shown` always equals `times_correct + times_incorrect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordMasteryRecord {
    pub word_id: i64,
    pub status: WordStatus,
    pub confidence_level: u8,
    pub times_shown: u32,
    pub times_correct: u32,
    pub times_incorrect: u32,
    pub consecutive_correct: u32,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub next_review_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<NaiveDateTime>,
}

impl WordMasteryRecord {
    /// Fresh record for a word seen for the first time.
    pub fn new(word_id: i64, today: NaiveDate) -> Self {
        Self {
            word_id,
            status: WordStatus::New,
            confidence_level: 0,
            times_shown: 0,
            times_correct: 0,
            times_incorrect: 0,
            consecutive_correct: 0,
            ease_factor: 2.5,
            interval_days: 0,
            next_review_date: today,
            last_reviewed_at: None,
        }
    }

    /// Fraction of answers that were correct, 0.0 when never shown.
    pub fn accuracy(&self) -> f64 {
        if self.times_shown == 0 {
            0.0
        } else {
            self.times_correct as f64 / self.times_shown as f64
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date <= today
    }

    pub(crate) fn schedule_from(&mut self, today: NaiveDate) {
        self.next_review_date = today + Duration::days(i64::from(self.interval_days));
    }
}

/// Daily practice streak for one learner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<NaiveDate>,
}

/// Session log entry. Finalized once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
    pub words_count: u32,
    pub correct_count: u32,
    pub duration_seconds: u32,
    pub hour_of_day: u32,
}

impl SessionSummary {
    pub fn is_finalized(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Accuracy as a percentage, 0.0 for an empty session.
    pub fn accuracy_percent(&self) -> f64 {
        if self.words_count == 0 {
            0.0
        } else {
            self.correct_count as f64 * 100.0 / self.words_count as f64
        }
    }
}

/// Learner-facing engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub daily_reset_hour: u32,
    pub new_words_per_day: u32,
    pub reviews_per_day: u32,
    pub distractor_count: usize,
    pub reverse_direction: bool,
    pub language_pair: LanguagePair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cefr_level: Option<CefrLevel>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            daily_reset_hour: 0,
            new_words_per_day: 20,
            reviews_per_day: 200,
            distractor_count: 3,
            reverse_direction: false,
            language_pair: LanguagePair::default(),
            cefr_level: None,
        }
    }
}

/// Words to study next: due reviews first, then new words.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyQueue {
    pub due_words: Vec<Word>,
    pub new_words: Vec<Word>,
    pub due_remaining: usize,
    pub new_remaining: usize,
}

impl StudyQueue {
    pub fn is_empty(&self) -> bool {
        self.due_words.is_empty() && self.new_words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.due_words.len() + self.new_words.len()
    }

    /// Iterate in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.due_words.iter().chain(self.new_words.iter())
    }
}
