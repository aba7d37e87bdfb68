//! Repository pattern for database access.

use crate::db::date_utils::{format_date, format_datetime, parse_date, parse_datetime};
use crate::db::error::DbError;
use crate::db::schema::{INIT_SINGLETONS, NOISE_FILTER, SCHEMA, SCHEMA_VERSION};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use vocab_core::achievements::AchievementCategory;
use vocab_core::{
    AchievementDefinition, AchievementProgress, AchievementStore, CandidateFilter, CefrLevel,
    DistractorSource, EngineError, EngineSettings, EvaluationTier, LanguagePair, LifetimeStats,
    Rarity, SessionLog, SessionSummary, SessionTotals, SettingsStore, StatsSource, StreakState,
    StreakStore, UnlockCriteria, Word, WordMasteryRecord, WordRepository, WordStatus,
};

type Result<T> = std::result::Result<T, DbError>;

const WORD_COLUMNS: &str = "w.id, w.source_lang, w.target_lang, w.headword, w.translation, w.category, w.difficulty, w.frequency_rank, w.cefr_level";

const MASTERY_COLUMNS: &str = "word_id, status, confidence_level, times_shown, times_correct, times_incorrect, consecutive_correct, ease_factor, interval_days, next_review_date, last_reviewed_at";

const SESSION_COLUMNS: &str =
    "id, started_at, completed_at, words_count, correct_count, duration_seconds, hour_of_day";

const PROGRESS_COLUMNS: &str =
    "achievement_id, progress_value, progress_max, is_completed, unlocked_at, notification_shown";

/// One answer, as written to the review log.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    pub word_id: i64,
    pub session_id: Option<String>,
    pub reviewed_at: NaiveDateTime,
    pub study_date: NaiveDate,
    pub was_correct: bool,
    /// First answer ever for this word.
    pub was_new: bool,
    pub response_time_ms: Option<u64>,
    pub confidence_before: u8,
    pub confidence_after: u8,
}

/// Answers already given on one study day, split by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DailyCounts {
    pub reviews: usize,
    pub new_words: usize,
}

/// SQLite implementation of every storage port.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(SCHEMA)?;
        self.conn.execute_batch(INIT_SINGLETONS)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i32> {
        let version = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Insert or update catalog definitions in one transaction.
    ///
    /// A duplicate id or invalid criterion rolls back the whole batch.
    pub fn seed_catalog(&mut self, definitions: &[AchievementDefinition]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut seen = HashSet::new();
        for (order, def) in definitions.iter().enumerate() {
            if !seen.insert(def.id.as_str()) {
                return Err(DbError::InvalidData(format!(
                    "duplicate achievement id {}",
                    def.id
                )));
            }
            def.criteria
                .validate(&def.id)
                .map_err(|e| DbError::InvalidData(e.to_string()))?;
            tx.execute(
                "INSERT INTO achievements (id, name, description, category, rarity, points, criteria, hidden, tier, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name, description = excluded.description,
                    category = excluded.category, rarity = excluded.rarity,
                    points = excluded.points, criteria = excluded.criteria,
                    hidden = excluded.hidden, tier = excluded.tier,
                    sort_order = excluded.sort_order",
                params![
                    def.id,
                    def.name,
                    def.description,
                    def.category.as_str(),
                    def.rarity.as_str(),
                    def.points,
                    def.criteria.to_json()?,
                    def.hidden,
                    def.tier.as_str(),
                    order
                ],
            )?;
        }
        tx.commit()?;
        tracing::info!(count = definitions.len(), "achievement catalog seeded");
        Ok(definitions.len())
    }

    /// Insert or update vocabulary in one transaction.
    pub fn import_words(&mut self, words: &[Word]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for word in words {
            if !(1..=10).contains(&word.difficulty) {
                return Err(DbError::InvalidData(format!(
                    "word {} has difficulty {} outside 1-10",
                    word.id, word.difficulty
                )));
            }
            tx.execute(
                "INSERT INTO words (id, source_lang, target_lang, headword, translation, category, difficulty, frequency_rank, cefr_level)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    source_lang = excluded.source_lang, target_lang = excluded.target_lang,
                    headword = excluded.headword, translation = excluded.translation,
                    category = excluded.category, difficulty = excluded.difficulty,
                    frequency_rank = excluded.frequency_rank, cefr_level = excluded.cefr_level",
                params![
                    word.id,
                    word.source_lang,
                    word.target_lang,
                    word.headword,
                    word.translation,
                    word.category,
                    word.difficulty,
                    word.frequency_rank,
                    word.cefr_level.as_str()
                ],
            )?;
        }
        tx.commit()?;
        tracing::info!(count = words.len(), "words imported");
        Ok(words.len())
    }

    /// Restore mastery records in one transaction.
    pub fn import_mastery_records(&mut self, records: &[WordMasteryRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for record in records {
            if record.times_shown != record.times_correct + record.times_incorrect {
                return Err(DbError::InvalidData(format!(
                    "record for word {} has inconsistent counters",
                    record.word_id
                )));
            }
            Self::write_mastery_record(&tx, record)?;
        }
        tx.commit()?;
        tracing::info!(count = records.len(), "mastery records imported");
        Ok(records.len())
    }

    /// Drop all learner progress, keeping words, catalog and settings.
    pub fn reset_progress(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM review_log;
             DELETE FROM mastery_records;
             DELETE FROM sessions;
             DELETE FROM achievement_progress;
             UPDATE streak SET current_streak_days = 0, longest_streak_days = 0, last_activity_date = NULL WHERE id = 1;
             UPDATE settings SET change_count = 0, levels_advanced = 0 WHERE id = 1;",
        )?;
        tx.commit()?;
        tracing::info!("learner progress reset");
        Ok(())
    }

    pub fn log_review(&self, entry: &ReviewEntry) -> Result<i64> {
        Self::insert_review(&self.conn, entry)
    }

    /// Save a graded record together with its review-log row.
    ///
    /// Both rows commit or neither does.
    pub fn record_answer(&self, record: &WordMasteryRecord, entry: &ReviewEntry) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        Self::write_mastery_record(&tx, record)?;
        let review_id = Self::insert_review(&tx, entry)?;
        tx.commit()?;
        Ok(review_id)
    }

    /// Finalize an open session and save the streak it produced in one
    /// transaction.
    ///
    /// Returns false, writing nothing, when the session is unknown or already
    /// finalized.
    pub fn close_session(
        &self,
        session_id: &str,
        totals: &SessionTotals,
        completed_at: NaiveDateTime,
        streak: Option<&StreakState>,
    ) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = Self::update_session(&tx, session_id, totals, completed_at)?;
        if changed == 0 {
            return Ok(false);
        }
        if let Some(state) = streak {
            Self::write_streak(&tx, state)?;
        }
        tx.commit()?;
        Ok(true)
    }

    fn insert_review(conn: &Connection, entry: &ReviewEntry) -> Result<i64> {
        conn.execute(
            "INSERT INTO review_log (word_id, session_id, reviewed_at, study_date, was_correct, was_new, response_time_ms, confidence_before, confidence_after)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.word_id,
                entry.session_id,
                format_datetime(entry.reviewed_at),
                format_date(entry.study_date),
                entry.was_correct,
                entry.was_new,
                entry.response_time_ms,
                entry.confidence_before,
                entry.confidence_after
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Answers already logged for `study_date`.
    pub fn daily_counts(&self, study_date: NaiveDate) -> Result<DailyCounts> {
        let (reviews, new_words): (usize, usize) = self.conn.query_row(
            "SELECT COALESCE(SUM(CASE WHEN was_new = 0 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN was_new = 1 THEN 1 ELSE 0 END), 0)
             FROM review_log WHERE study_date = ?1",
            params![format_date(study_date)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(DailyCounts { reviews, new_words })
    }

    pub fn sessions_completed(&self) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE completed_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn word_count(&self, pair: &LanguagePair) -> Result<usize> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM words WHERE source_lang = ?1 AND target_lang = ?2",
            params![pair.source, pair.target],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn query_words_due(
        &self,
        pair: &LanguagePair,
        cefr_level: Option<CefrLevel>,
        limit: usize,
        today: NaiveDate,
    ) -> Result<Vec<Word>> {
        let sql = format!(
            "SELECT {WORD_COLUMNS}
             FROM words w
             JOIN mastery_records mr ON w.id = mr.word_id
             WHERE w.source_lang = ?1 AND w.target_lang = ?2
               AND (?3 IS NULL OR w.cefr_level = ?3)
               AND mr.times_shown > 0 AND mr.next_review_date <= ?4
             ORDER BY mr.next_review_date, w.id
             LIMIT ?5"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let words = stmt
            .query_map(
                params![
                    pair.source,
                    pair.target,
                    cefr_level.map(|c| c.as_str()),
                    format_date(today),
                    limit
                ],
                Self::row_to_word,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(words)
    }

    fn query_new_words(
        &self,
        pair: &LanguagePair,
        cefr_level: Option<CefrLevel>,
        limit: usize,
    ) -> Result<Vec<Word>> {
        let sql = format!(
            "SELECT {WORD_COLUMNS}
             FROM words w
             LEFT JOIN mastery_records mr ON w.id = mr.word_id
             WHERE w.source_lang = ?1 AND w.target_lang = ?2
               AND (?3 IS NULL OR w.cefr_level = ?3)
               AND (mr.word_id IS NULL OR mr.times_shown = 0)
             ORDER BY w.frequency_rank, w.id
             LIMIT ?4"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let words = stmt
            .query_map(
                params![pair.source, pair.target, cefr_level.map(|c| c.as_str()), limit],
                Self::row_to_word,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(words)
    }

    fn query_candidates(
        &self,
        filter: &CandidateFilter,
        exclude_ids: &HashSet<i64>,
        limit: usize,
    ) -> Result<Vec<Word>> {
        let mut sql = format!(
            "SELECT {WORD_COLUMNS} FROM words w
             WHERE w.source_lang = ? AND w.target_lang = ? AND {NOISE_FILTER}"
        );
        let mut values = vec![
            Value::Text(filter.language_pair.source.clone()),
            Value::Text(filter.language_pair.target.clone()),
        ];
        if let Some(category) = &filter.category {
            sql.push_str(" AND w.category = ?");
            values.push(Value::Text(category.clone()));
        }
        if let Some(range) = &filter.difficulty_range {
            sql.push_str(" AND w.difficulty BETWEEN ? AND ?");
            values.push(Value::Integer(i64::from(*range.start())));
            values.push(Value::Integer(i64::from(*range.end())));
        }
        if !exclude_ids.is_empty() {
            let placeholders = vec!["?"; exclude_ids.len()].join(", ");
            sql.push_str(&format!(" AND w.id NOT IN ({placeholders})"));
            values.extend(exclude_ids.iter().map(|id| Value::Integer(*id)));
        }
        sql.push_str(" ORDER BY RANDOM() LIMIT ?");
        values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

        let mut stmt = self.conn.prepare(&sql)?;
        let words = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_word)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(words)
    }

    fn query_word(&self, word_id: i64) -> Result<Option<Word>> {
        let sql = format!("SELECT {WORD_COLUMNS} FROM words w WHERE w.id = ?1");
        self.conn
            .query_row(&sql, params![word_id], Self::row_to_word)
            .optional()
            .map_err(Into::into)
    }

    fn query_mastery_record(&self, word_id: i64) -> Result<Option<WordMasteryRecord>> {
        let sql = format!("SELECT {MASTERY_COLUMNS} FROM mastery_records WHERE word_id = ?1");
        self.conn
            .query_row(&sql, params![word_id], Self::row_to_mastery)
            .optional()
            .map_err(Into::into)
    }

    fn write_mastery_record(conn: &Connection, record: &WordMasteryRecord) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO mastery_records ({MASTERY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                record.word_id,
                record.status.as_str(),
                record.confidence_level,
                record.times_shown,
                record.times_correct,
                record.times_incorrect,
                record.consecutive_correct,
                record.ease_factor,
                record.interval_days,
                format_date(record.next_review_date),
                record.last_reviewed_at.map(format_datetime)
            ],
        )?;
        Ok(())
    }

    fn query_catalog_rows(&self) -> Result<Vec<(AchievementDefinition, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, category, rarity, points, criteria, hidden, tier
             FROM achievements ORDER BY sort_order",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let category: String = row.get(3)?;
                let rarity: String = row.get(4)?;
                let tier: String = row.get(8)?;
                let definition = AchievementDefinition {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    category: AchievementCategory::parse(&category)
                        .ok_or_else(|| invalid_text(3, "category", &category))?,
                    rarity: Rarity::parse(&rarity)
                        .ok_or_else(|| invalid_text(4, "rarity", &rarity))?,
                    points: row.get(5)?,
                    // Replaced by the parsed criteria below.
                    criteria: UnlockCriteria::WordsPracticed { count: 1 },
                    hidden: row.get(7)?,
                    tier: EvaluationTier::parse(&tier)
                        .ok_or_else(|| invalid_text(8, "tier", &tier))?,
                };
                Ok((definition, row.get::<_, String>(6)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn query_progress(&self, achievement_id: &str) -> Result<Option<AchievementProgress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM achievement_progress WHERE achievement_id = ?1"
        );
        self.conn
            .query_row(&sql, params![achievement_id], Self::row_to_progress)
            .optional()
            .map_err(Into::into)
    }

    fn write_progress(&self, progress: &AchievementProgress) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO achievement_progress ({PROGRESS_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ),
            params![
                progress.achievement_id,
                progress.progress_value,
                progress.progress_max,
                progress.is_completed,
                progress.unlocked_at.map(format_datetime),
                progress.notification_shown
            ],
        )?;
        Ok(())
    }

    fn query_pending_notifications(&self) -> Result<Vec<AchievementProgress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM achievement_progress
             WHERE is_completed = 1 AND notification_shown = 0
             ORDER BY unlocked_at, achievement_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pending = stmt
            .query_map([], Self::row_to_progress)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pending)
    }

    fn insert_session(&self, started_at: NaiveDateTime) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO sessions (id, started_at, hour_of_day) VALUES (?1, ?2, ?3)",
            params![session_id, format_datetime(started_at), started_at.hour()],
        )?;
        Ok(session_id)
    }

    fn query_session(&self, session_id: &str) -> Result<Option<SessionSummary>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
        self.conn
            .query_row(&sql, params![session_id], Self::row_to_session)
            .optional()
            .map_err(Into::into)
    }

    fn update_session(
        conn: &Connection,
        session_id: &str,
        totals: &SessionTotals,
        completed_at: NaiveDateTime,
    ) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE sessions SET completed_at = ?1, words_count = ?2, correct_count = ?3, duration_seconds = ?4
             WHERE id = ?5 AND completed_at IS NULL",
            params![
                format_datetime(completed_at),
                totals.words_count,
                totals.correct_count,
                totals.duration_seconds,
                session_id
            ],
        )?;
        Ok(changed)
    }

    fn query_streak(&self) -> Result<StreakState> {
        self.conn
            .query_row(
                "SELECT current_streak_days, longest_streak_days, last_activity_date FROM streak WHERE id = 1",
                [],
                |row| {
                    Ok(StreakState {
                        current_streak_days: row.get(0)?,
                        longest_streak_days: row.get(1)?,
                        last_activity_date: optional_date(row, 2)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    fn write_streak(conn: &Connection, state: &StreakState) -> Result<()> {
        conn.execute(
            "UPDATE streak SET current_streak_days = ?1, longest_streak_days = ?2, last_activity_date = ?3 WHERE id = 1",
            params![
                state.current_streak_days,
                state.longest_streak_days,
                state.last_activity_date.map(format_date)
            ],
        )?;
        Ok(())
    }

    fn query_settings(&self) -> Result<EngineSettings> {
        self.conn
            .query_row(
                "SELECT daily_reset_hour, new_words_per_day, reviews_per_day, distractor_count, reverse_direction, source_lang, target_lang, cefr_level
                 FROM settings WHERE id = 1",
                [],
                |row| {
                    let cefr: Option<String> = row.get(7)?;
                    Ok(EngineSettings {
                        daily_reset_hour: row.get(0)?,
                        new_words_per_day: row.get(1)?,
                        reviews_per_day: row.get(2)?,
                        distractor_count: row.get(3)?,
                        reverse_direction: row.get(4)?,
                        language_pair: LanguagePair::new(
                            row.get::<_, String>(5)?,
                            row.get::<_, String>(6)?,
                        ),
                        cefr_level: cefr.as_deref().and_then(CefrLevel::parse),
                    })
                },
            )
            .map_err(Into::into)
    }

    fn write_settings(&self, settings: &EngineSettings) -> Result<()> {
        if settings.daily_reset_hour > 23 {
            return Err(DbError::InvalidData(format!(
                "daily_reset_hour {} outside 0-23",
                settings.daily_reset_hour
            )));
        }
        let current = self.query_settings()?;
        if current == *settings {
            return Ok(());
        }
        // An unset level counts as A1.
        let advanced = match settings.cefr_level {
            Some(after) => after > current.cefr_level.unwrap_or(CefrLevel::A1),
            None => false,
        };
        self.conn.execute(
            "UPDATE settings SET daily_reset_hour = ?1, new_words_per_day = ?2, reviews_per_day = ?3,
                distractor_count = ?4, reverse_direction = ?5, source_lang = ?6, target_lang = ?7,
                cefr_level = ?8, change_count = change_count + 1,
                levels_advanced = levels_advanced + ?9
             WHERE id = 1",
            params![
                settings.daily_reset_hour,
                settings.new_words_per_day,
                settings.reviews_per_day,
                settings.distractor_count,
                settings.reverse_direction,
                settings.language_pair.source,
                settings.language_pair.target,
                settings.cefr_level.map(|c| c.as_str()),
                u32::from(advanced)
            ],
        )?;
        Ok(())
    }

    fn query_lifetime_stats(&self, today: NaiveDate) -> Result<LifetimeStats> {
        let (words_practiced, words_mastered, total_reviews, total_correct, categories, languages) =
            self.conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN mr.status IN ('mastered', 'retired') THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(mr.times_shown), 0),
                        COALESCE(SUM(mr.times_correct), 0),
                        COUNT(DISTINCT w.category),
                        COUNT(DISTINCT w.source_lang || '-' || w.target_lang)
                 FROM mastery_records mr
                 JOIN words w ON w.id = mr.word_id
                 WHERE mr.times_shown > 0",
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )?;

        let today_str = format_date(today);
        let days_practiced = self.conn.query_row(
            "SELECT COUNT(DISTINCT study_date) FROM review_log WHERE study_date <= ?1",
            params![today_str],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT study_date FROM review_log WHERE study_date <= ?1
             ORDER BY study_date DESC LIMIT 2",
        )?;
        let recent = stmt
            .query_map(params![today_str], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let recent: Vec<NaiveDate> = recent.iter().filter_map(|s| parse_date(s)).collect();
        let days_inactive = match recent.as_slice() {
            [latest, previous] => (*latest - *previous).num_days().max(0) as u32,
            _ => 0,
        };

        let (settings_changed, levels_advanced) = self.conn.query_row(
            "SELECT change_count, levels_advanced FROM settings WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(LifetimeStats {
            words_practiced,
            words_mastered,
            total_reviews,
            total_correct,
            sessions_completed: self.sessions_completed()?,
            days_practiced,
            categories_practiced: categories,
            languages_practiced: languages,
            days_inactive,
            settings_changed,
            levels_advanced,
        })
    }
}

impl SqliteRepository {
    fn row_to_word(row: &rusqlite::Row) -> rusqlite::Result<Word> {
        let cefr: String = row.get(8)?;
        Ok(Word {
            id: row.get(0)?,
            source_lang: row.get(1)?,
            target_lang: row.get(2)?,
            headword: row.get(3)?,
            translation: row.get(4)?,
            category: row.get(5)?,
            difficulty: row.get(6)?,
            frequency_rank: row.get(7)?,
            cefr_level: CefrLevel::parse(&cefr).unwrap_or(CefrLevel::A1),
        })
    }

    fn row_to_mastery(row: &rusqlite::Row) -> rusqlite::Result<WordMasteryRecord> {
        let status: String = row.get(1)?;
        let next_review: String = row.get(9)?;
        let last_reviewed: Option<String> = row.get(10)?;
        Ok(WordMasteryRecord {
            word_id: row.get(0)?,
            status: WordStatus::parse(&status).unwrap_or_default(),
            confidence_level: row.get(2)?,
            times_shown: row.get(3)?,
            times_correct: row.get(4)?,
            times_incorrect: row.get(5)?,
            consecutive_correct: row.get(6)?,
            ease_factor: row.get(7)?,
            interval_days: row.get(8)?,
            next_review_date: parse_date(&next_review)
                .ok_or_else(|| invalid_text(9, "date", &next_review))?,
            last_reviewed_at: last_reviewed.as_deref().and_then(parse_datetime),
        })
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<SessionSummary> {
        let started: String = row.get(1)?;
        let completed: Option<String> = row.get(2)?;
        Ok(SessionSummary {
            session_id: row.get(0)?,
            started_at: parse_datetime(&started)
                .ok_or_else(|| invalid_text(1, "timestamp", &started))?,
            completed_at: completed.as_deref().and_then(parse_datetime),
            words_count: row.get(3)?,
            correct_count: row.get(4)?,
            duration_seconds: row.get(5)?,
            hour_of_day: row.get(6)?,
        })
    }

    fn row_to_progress(row: &rusqlite::Row) -> rusqlite::Result<AchievementProgress> {
        let unlocked: Option<String> = row.get(4)?;
        Ok(AchievementProgress {
            achievement_id: row.get(0)?,
            progress_value: row.get(1)?,
            progress_max: row.get(2)?,
            is_completed: row.get(3)?,
            unlocked_at: unlocked.as_deref().and_then(parse_datetime),
            notification_shown: row.get(5)?,
        })
    }
}

fn invalid_text(column: usize, what: &str, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        format!("invalid {what} '{raw}'").into(),
    )
}

fn optional_date(row: &rusqlite::Row, column: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| parse_date(&s).ok_or_else(|| invalid_text(column, "date", &s)))
        .transpose()
}

impl DistractorSource for SqliteRepository {
    fn find_distractor_candidates(
        &self,
        filter: &CandidateFilter,
        exclude_ids: &HashSet<i64>,
        limit: usize,
    ) -> vocab_core::Result<Vec<Word>> {
        Ok(self.query_candidates(filter, exclude_ids, limit)?)
    }
}

impl WordRepository for SqliteRepository {
    fn find_words_due(
        &self,
        pair: &LanguagePair,
        cefr_level: Option<CefrLevel>,
        limit: usize,
        today: NaiveDate,
    ) -> vocab_core::Result<Vec<Word>> {
        Ok(self.query_words_due(pair, cefr_level, limit, today)?)
    }

    fn find_new_words(
        &self,
        pair: &LanguagePair,
        cefr_level: Option<CefrLevel>,
        limit: usize,
    ) -> vocab_core::Result<Vec<Word>> {
        Ok(self.query_new_words(pair, cefr_level, limit)?)
    }

    fn get_word(&self, word_id: i64) -> vocab_core::Result<Option<Word>> {
        Ok(self.query_word(word_id)?)
    }

    fn get_mastery_record(&self, word_id: i64) -> vocab_core::Result<Option<WordMasteryRecord>> {
        Ok(self.query_mastery_record(word_id)?)
    }

    fn save_mastery_record(&self, record: &WordMasteryRecord) -> vocab_core::Result<()> {
        Ok(Self::write_mastery_record(&self.conn, record)?)
    }
}

impl AchievementStore for SqliteRepository {
    fn get_catalog(&self) -> vocab_core::Result<Vec<AchievementDefinition>> {
        self.query_catalog_rows()?
            .into_iter()
            .map(|(mut def, json)| -> vocab_core::Result<AchievementDefinition> {
                def.criteria = UnlockCriteria::from_json(&def.id, &json)?;
                Ok(def)
            })
            .collect()
    }

    fn get_progress(&self, achievement_id: &str) -> vocab_core::Result<Option<AchievementProgress>> {
        Ok(self.query_progress(achievement_id)?)
    }

    fn save_progress(&self, progress: &AchievementProgress) -> vocab_core::Result<()> {
        Ok(self.write_progress(progress)?)
    }

    fn mark_unlocked(&self, achievement_id: &str, at: NaiveDateTime) -> vocab_core::Result<()> {
        self.conn
            .execute(
                "UPDATE achievement_progress SET is_completed = 1, unlocked_at = COALESCE(unlocked_at, ?1)
                 WHERE achievement_id = ?2",
                params![format_datetime(at), achievement_id],
            )
            .map_err(DbError::from)?;
        Ok(())
    }

    fn get_pending_notifications(&self) -> vocab_core::Result<Vec<AchievementProgress>> {
        Ok(self.query_pending_notifications()?)
    }

    fn mark_notified(&self, achievement_id: &str) -> vocab_core::Result<()> {
        self.conn
            .execute(
                "UPDATE achievement_progress SET notification_shown = 1 WHERE achievement_id = ?1",
                params![achievement_id],
            )
            .map_err(DbError::from)?;
        Ok(())
    }
}

impl SessionLog for SqliteRepository {
    fn create_session(&self, started_at: NaiveDateTime) -> vocab_core::Result<String> {
        Ok(self.insert_session(started_at)?)
    }

    /// Finalizing twice returns the first summary unchanged.
    fn finalize_session(
        &self,
        session_id: &str,
        totals: &SessionTotals,
        completed_at: NaiveDateTime,
    ) -> vocab_core::Result<SessionSummary> {
        Self::update_session(&self.conn, session_id, totals, completed_at)?;
        self.query_session(session_id)?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))
    }

    fn get_session(&self, session_id: &str) -> vocab_core::Result<Option<SessionSummary>> {
        Ok(self.query_session(session_id)?)
    }
}

impl StreakStore for SqliteRepository {
    fn get_streak(&self) -> vocab_core::Result<StreakState> {
        Ok(self.query_streak()?)
    }

    fn save_streak(&self, state: &StreakState) -> vocab_core::Result<()> {
        Ok(Self::write_streak(&self.conn, state)?)
    }
}

impl StatsSource for SqliteRepository {
    fn lifetime_stats(&self, today: NaiveDate) -> vocab_core::Result<LifetimeStats> {
        Ok(self.query_lifetime_stats(today)?)
    }
}

impl SettingsStore for SqliteRepository {
    fn get_settings(&self) -> vocab_core::Result<EngineSettings> {
        Ok(self.query_settings()?)
    }

    /// Saving identical settings is a no-op and does not count as a change.
    fn save_settings(&self, settings: &EngineSettings) -> vocab_core::Result<()> {
        Ok(self.write_settings(settings)?)
    }
}
