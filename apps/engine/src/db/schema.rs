//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema for the local SQLite database.
pub const SCHEMA: &str = r#"
-- Vocabulary reference data
CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY,
    source_lang TEXT NOT NULL,
    target_lang TEXT NOT NULL,
    headword TEXT NOT NULL,
    translation TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'general',
    difficulty INTEGER NOT NULL DEFAULT 1,
    frequency_rank INTEGER NOT NULL DEFAULT 0,
    cefr_level TEXT NOT NULL DEFAULT 'A1'
);

-- Per-word learning state
CREATE TABLE IF NOT EXISTS mastery_records (
    word_id INTEGER PRIMARY KEY REFERENCES words(id),
    status TEXT NOT NULL DEFAULT 'new',
    confidence_level INTEGER NOT NULL DEFAULT 0,
    times_shown INTEGER NOT NULL DEFAULT 0,
    times_correct INTEGER NOT NULL DEFAULT 0,
    times_incorrect INTEGER NOT NULL DEFAULT 0,
    consecutive_correct INTEGER NOT NULL DEFAULT 0,
    ease_factor REAL NOT NULL DEFAULT 2.5,
    interval_days INTEGER NOT NULL DEFAULT 0,
    next_review_date TEXT NOT NULL,
    last_reviewed_at TEXT
);

-- One row per answer
CREATE TABLE IF NOT EXISTS review_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    word_id INTEGER NOT NULL REFERENCES words(id),
    session_id TEXT,
    reviewed_at TEXT NOT NULL,
    study_date TEXT NOT NULL,
    was_correct INTEGER NOT NULL,
    was_new INTEGER NOT NULL DEFAULT 0,
    response_time_ms INTEGER,
    confidence_before INTEGER NOT NULL,
    confidence_after INTEGER NOT NULL
);

-- Learning sessions
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    words_count INTEGER NOT NULL DEFAULT 0,
    correct_count INTEGER NOT NULL DEFAULT 0,
    duration_seconds INTEGER NOT NULL DEFAULT 0,
    hour_of_day INTEGER NOT NULL
);

-- Daily streak
CREATE TABLE IF NOT EXISTS streak (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    current_streak_days INTEGER NOT NULL DEFAULT 0,
    longest_streak_days INTEGER NOT NULL DEFAULT 0,
    last_activity_date TEXT
);

-- Achievement catalog
CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    rarity TEXT NOT NULL,
    points INTEGER NOT NULL,
    criteria TEXT NOT NULL,
    hidden INTEGER NOT NULL DEFAULT 0,
    tier TEXT NOT NULL,
    sort_order INTEGER NOT NULL
);

-- Per-learner achievement progress
CREATE TABLE IF NOT EXISTS achievement_progress (
    achievement_id TEXT PRIMARY KEY REFERENCES achievements(id),
    progress_value INTEGER NOT NULL DEFAULT 0,
    progress_max INTEGER NOT NULL DEFAULT 1,
    is_completed INTEGER NOT NULL DEFAULT 0,
    unlocked_at TEXT,
    notification_shown INTEGER NOT NULL DEFAULT 0
);

-- Learner settings
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    daily_reset_hour INTEGER NOT NULL DEFAULT 0,
    new_words_per_day INTEGER NOT NULL DEFAULT 20,
    reviews_per_day INTEGER NOT NULL DEFAULT 200,
    distractor_count INTEGER NOT NULL DEFAULT 3,
    reverse_direction INTEGER NOT NULL DEFAULT 0,
    source_lang TEXT NOT NULL DEFAULT 'en',
    target_lang TEXT NOT NULL DEFAULT 'es',
    cefr_level TEXT,
    change_count INTEGER NOT NULL DEFAULT 0,
    levels_advanced INTEGER NOT NULL DEFAULT 0
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_words_pair ON words(source_lang, target_lang);
CREATE INDEX IF NOT EXISTS idx_mastery_due ON mastery_records(next_review_date);
CREATE INDEX IF NOT EXISTS idx_review_log_date ON review_log(study_date);
CREATE INDEX IF NOT EXISTS idx_progress_pending ON achievement_progress(is_completed, notification_shown);
"#;

/// Initialize singleton rows if not exists.
pub const INIT_SINGLETONS: &str = r#"
INSERT OR IGNORE INTO settings (id) VALUES (1);
INSERT OR IGNORE INTO streak (id) VALUES (1);
"#;

/// SQL predicate excluding grammatical noise from distractor candidates.
///
/// Mirrors `vocab_core::composer::is_grammatical_noise`; the composer checks
/// again in memory.
pub const NOISE_FILTER: &str = "LOWER(headword) NOT LIKE '%form of%'
    AND LOWER(headword) NOT LIKE '%nominative%'
    AND LOWER(headword) NOT LIKE '%genitive%'
    AND LOWER(headword) NOT LIKE '%plural of%'
    AND LOWER(headword) NOT LIKE '%participle of%'
    AND LOWER(translation) NOT LIKE '%form of%'
    AND LOWER(translation) NOT LIKE '%nominative%'
    AND LOWER(translation) NOT LIKE '%genitive%'
    AND LOWER(translation) NOT LIKE '%plural of%'
    AND LOWER(translation) NOT LIKE '%participle of%'
    AND LENGTH(headword) < 100
    AND LENGTH(translation) < 100";
