//! One learning step end to end: question, answer, session completion.

use crate::config::EngineConfig;
use crate::db::date_utils::study_day;
use crate::db::{ReviewEntry, SqliteRepository};
use anyhow::Context;
use chrono::NaiveDateTime;
use rand::Rng;
use serde::Serialize;
use vocab_core::{
    default_catalog, AchievementEngine, AchievementStore, Catalog, CefrLevel, EngineError,
    EngineSettings, Milestone, Question, QuestionComposer, Result, Scheduler, SessionContext,
    SessionLog, SessionSummary, SettingsStore, StatsSource, StreakState, StreakStore,
    StreakTracker, StudyQueue, UnlockedAchievement, Word, WordMasteryRecord, WordRepository,
};

/// Result of one submitted answer.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub record: WordMasteryRecord,
    pub unlocked: Vec<UnlockedAchievement>,
}

/// Result of completing a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub summary: SessionSummary,
    pub streak: StreakState,
    pub milestone: Option<Milestone>,
    pub unlocked: Vec<UnlockedAchievement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelUp {
    pub level: CefrLevel,
    pub unlocked: Vec<UnlockedAchievement>,
}

/// Drives the scheduler, composer, streak tracker and achievements over one
/// SQLite repository.
pub struct LearningEngine {
    repo: SqliteRepository,
    scheduler: Scheduler,
    catalog: Catalog,
    retry_attempts: u32,
}

impl LearningEngine {
    /// Seed the built-in catalog and load it back from storage.
    pub fn new(mut repo: SqliteRepository) -> Result<Self> {
        repo.seed_catalog(&default_catalog())?;
        let catalog = Catalog::new(repo.get_catalog()?)?;
        Ok(Self {
            repo,
            scheduler: Scheduler::default(),
            catalog,
            retry_attempts: crate::config::DEFAULT_RETRY_ATTEMPTS,
        })
    }

    /// Open the database named by `config`, creating its directory.
    pub fn open(config: &EngineConfig) -> anyhow::Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let repo = SqliteRepository::open(&config.db_path)
            .with_context(|| format!("opening database {}", config.db_path.display()))?;
        tracing::info!(path = %config.db_path.display(), "database opened");
        let engine = Self::new(repo)?.with_retry_attempts(config.retry_attempts);
        Ok(engine)
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn repository(&self) -> &SqliteRepository {
        &self.repo
    }

    /// Mutable access for imports and resets.
    pub fn repository_mut(&mut self) -> &mut SqliteRepository {
        &mut self.repo
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn achievements(&self) -> AchievementEngine<'_, SqliteRepository> {
        AchievementEngine::new(&self.repo, &self.catalog)
    }

    /// Run a storage call, retrying recoverable failures.
    pub fn with_retry<T, F>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_recoverable() && attempt < self.retry_attempts => {
                    tracing::warn!(operation, attempt, error = %err, "storage call failed, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn settings(&self) -> Result<EngineSettings> {
        self.repo.get_settings()
    }

    /// Open a session and capture the counters achievements need.
    pub fn start_session(&self, now: NaiveDateTime) -> Result<SessionContext> {
        let session_id = self.with_retry("create_session", || self.repo.create_session(now))?;
        let lifetime = self.repo.lifetime_stats(now.date())?;
        tracing::info!(session_id = %session_id, "session started");
        Ok(SessionContext::new(session_id, now, lifetime.words_practiced))
    }

    /// Due reviews first, then new words, each capped by what is left of
    /// today's allowance.
    pub fn study_queue(&self, now: NaiveDateTime) -> Result<StudyQueue> {
        let settings = self.repo.get_settings()?;
        let today = study_day(now, settings.daily_reset_hour);
        let done = self.repo.daily_counts(today)?;

        let due_remaining = (settings.reviews_per_day as usize).saturating_sub(done.reviews);
        let new_remaining = (settings.new_words_per_day as usize).saturating_sub(done.new_words);

        let due_words = self.repo.find_words_due(
            &settings.language_pair,
            settings.cefr_level,
            due_remaining,
            today,
        )?;
        let new_words =
            self.repo
                .find_new_words(&settings.language_pair, settings.cefr_level, new_remaining)?;

        Ok(StudyQueue {
            due_words,
            new_words,
            due_remaining,
            new_remaining,
        })
    }

    /// Question for the next queued word, if any.
    pub fn next_question(&self, now: NaiveDateTime) -> Result<Option<Question>> {
        self.next_question_with_rng(now, &mut rand::thread_rng())
    }

    pub fn next_question_with_rng<R: Rng + ?Sized>(
        &self,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> Result<Option<Question>> {
        let queue = self.study_queue(now)?;
        let Some(word) = queue.iter().next() else {
            return Ok(None);
        };
        let settings = self.repo.get_settings()?;
        Ok(Some(self.question_for(word, &settings, rng)))
    }

    pub fn question_for<R: Rng + ?Sized>(
        &self,
        word: &Word,
        settings: &EngineSettings,
        rng: &mut R,
    ) -> Question {
        QuestionComposer::new(&self.repo).compose(
            word,
            settings.distractor_count,
            settings.reverse_direction,
            rng,
        )
    }

    /// Grade one answer, persist it, and run the per-answer checks.
    pub fn submit_answer(
        &self,
        ctx: &mut SessionContext,
        word_id: i64,
        is_correct: bool,
        response_time_ms: Option<u64>,
        now: NaiveDateTime,
    ) -> Result<AnswerOutcome> {
        let before = self.with_retry("get_mastery_record", || self.repo.get_mastery_record(word_id))?;
        let first_time = before.as_ref().map_or(true, |r| r.times_shown == 0);

        let record = self
            .scheduler
            .update(before.as_ref(), word_id, is_correct, response_time_ms, now);

        let settings = self.repo.get_settings()?;
        let entry = ReviewEntry {
            word_id,
            session_id: Some(ctx.session_id.clone()),
            reviewed_at: now,
            study_date: study_day(now, settings.daily_reset_hour),
            was_correct: is_correct,
            was_new: first_time,
            response_time_ms,
            confidence_before: before.as_ref().map_or(0, |r| r.confidence_level),
            confidence_after: record.confidence_level,
        };
        self.with_retry("record_answer", || {
            self.repo
                .record_answer(&record, &entry)
                .map_err(EngineError::from)
        })?;

        ctx.record_answer(is_correct, first_time);
        tracing::debug!(
            word_id,
            is_correct,
            confidence = record.confidence_level,
            status = record.status.as_str(),
            "answer recorded"
        );

        let unlocked = self
            .achievements()
            .check_immediate(ctx, now)
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "immediate achievement check failed");
                Vec::new()
            });

        Ok(AnswerOutcome { record, unlocked })
    }

    /// Finalize the session, update the streak once, and run the session and
    /// comprehensive checks.
    ///
    /// Completing an already finalized session changes nothing.
    pub fn complete_session(
        &self,
        ctx: &SessionContext,
        now: NaiveDateTime,
    ) -> Result<SessionOutcome> {
        let existing = self
            .repo
            .get_session(&ctx.session_id)?
            .ok_or_else(|| EngineError::SessionNotFound(ctx.session_id.clone()))?;
        if existing.is_finalized() {
            tracing::debug!(session_id = %ctx.session_id, "session already completed");
            return self.unchanged_outcome(existing);
        }

        let totals = ctx.totals(now);
        let update = if totals.words_count > 0 {
            let settings = self.repo.get_settings()?;
            let today = study_day(now, settings.daily_reset_hour);
            Some(StreakTracker::record_session(&self.repo.get_streak()?, today))
        } else {
            None
        };

        // Session row and streak commit together.
        let closed = self.with_retry("close_session", || {
            self.repo
                .close_session(&ctx.session_id, &totals, now, update.as_ref().map(|u| &u.state))
                .map_err(EngineError::from)
        })?;
        let summary = self
            .repo
            .get_session(&ctx.session_id)?
            .ok_or_else(|| EngineError::SessionNotFound(ctx.session_id.clone()))?;

        let update = match update {
            Some(update) if closed => update,
            Some(_) => {
                tracing::debug!(session_id = %ctx.session_id, "session completed concurrently");
                return self.unchanged_outcome(summary);
            }
            None => {
                tracing::info!(session_id = %summary.session_id, "empty session completed");
                return self.unchanged_outcome(summary);
            }
        };

        if let Some(milestone) = update.milestone {
            tracing::info!(streak = milestone.threshold, tier = milestone.tier, "streak milestone reached");
        }

        let mut unlocked = self.session_checks(&summary, now);
        unlocked.extend(self.comprehensive_checks(&update.state, now));

        tracing::info!(
            session_id = %summary.session_id,
            words = summary.words_count,
            correct = summary.correct_count,
            streak = update.state.current_streak_days,
            unlocked = unlocked.len(),
            "session completed"
        );

        Ok(SessionOutcome {
            summary,
            streak: update.state,
            milestone: update.milestone,
            unlocked,
        })
    }

    fn unchanged_outcome(&self, summary: SessionSummary) -> Result<SessionOutcome> {
        Ok(SessionOutcome {
            summary,
            streak: self.repo.get_streak()?,
            milestone: None,
            unlocked: Vec::new(),
        })
    }

    fn session_checks(&self, summary: &SessionSummary, now: NaiveDateTime) -> Vec<UnlockedAchievement> {
        let result = self
            .repo
            .sessions_completed()
            .map_err(EngineError::from)
            .and_then(|completed| self.achievements().check_session(summary, completed, now));
        result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "session achievement check failed");
            Vec::new()
        })
    }

    fn comprehensive_checks(&self, streak: &StreakState, now: NaiveDateTime) -> Vec<UnlockedAchievement> {
        let result = self.settings().and_then(|settings| {
            let today = study_day(now, settings.daily_reset_hour);
            let lifetime = self.repo.lifetime_stats(today)?;
            self.achievements().check_comprehensive(&lifetime, streak, now)
        });
        result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "comprehensive achievement check failed");
            Vec::new()
        })
    }

    /// Persist settings and re-run the lifetime checks.
    pub fn save_settings(
        &self,
        settings: &EngineSettings,
        now: NaiveDateTime,
    ) -> Result<Vec<UnlockedAchievement>> {
        self.with_retry("save_settings", || self.repo.save_settings(settings))?;
        let streak = self.repo.get_streak()?;
        Ok(self.comprehensive_checks(&streak, now))
    }

    /// Move to the next CEFR level. `None` at the top level.
    pub fn advance_level(&self, now: NaiveDateTime) -> Result<Option<LevelUp>> {
        let mut settings = self.repo.get_settings()?;
        let current = settings.cefr_level.unwrap_or(CefrLevel::A1);
        let Some(level) = current.next() else {
            return Ok(None);
        };
        settings.cefr_level = Some(level);
        let unlocked = self.save_settings(&settings, now)?;
        tracing::info!(level = level.as_str(), "level advanced");
        Ok(Some(LevelUp { level, unlocked }))
    }

    /// Unlocked achievements not yet shown to the learner.
    pub fn pending_notifications(&self) -> Result<Vec<UnlockedAchievement>> {
        self.achievements().pending_notifications()
    }

    /// Mark an unlock as shown.
    pub fn acknowledge(&self, achievement_id: &str) -> Result<()> {
        self.with_retry("mark_notified", || self.achievements().mark_notified(achievement_id))
    }

    pub fn earned_points(&self) -> Result<u32> {
        self.achievements().earned_points()
    }

    /// Current streak as seen from `now`, zero once it has lapsed.
    pub fn current_streak(&self, now: NaiveDateTime) -> Result<u32> {
        let settings = self.repo.get_settings()?;
        let state = self.repo.get_streak()?;
        let today = study_day(now, settings.daily_reset_hour);
        let reconciliation = StreakTracker::reconcile(&state, today);
        Ok(if reconciliation.resets {
            0
        } else {
            state.current_streak_days
        })
    }
}
