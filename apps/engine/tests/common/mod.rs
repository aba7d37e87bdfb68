//! Common test utilities and fixtures for integration tests.
//!
//! Every test gets its own in-memory database seeded with the fixture
//! vocabulary and the built-in achievement catalog.

#![allow(dead_code)]

pub mod fixtures;

use chrono::{Duration, NaiveDateTime};
use vocab_core::{SessionContext, UnlockedAchievement};
use vocab_engine::{LearningEngine, SessionOutcome, SqliteRepository};

/// Test context wrapping a fresh engine.
pub struct TestContext {
    pub engine: LearningEngine,
}

impl TestContext {
    pub fn new() -> Self {
        let mut repo = SqliteRepository::open_in_memory().expect("Failed to open test database");
        repo.import_words(&fixtures::vocabulary())
            .expect("Failed to import fixture words");
        let engine = LearningEngine::new(repo).expect("Failed to create engine");
        Self { engine }
    }

    /// Answer the next `count` queued words, `spacing` apart.
    ///
    /// Returns the context plus everything unlocked along the way.
    pub fn answer_queued(
        &self,
        start: NaiveDateTime,
        count: usize,
        spacing: Duration,
        correct: bool,
    ) -> (SessionContext, Vec<UnlockedAchievement>) {
        let mut ctx = self.engine.start_session(start).expect("start session");
        let queue = self.engine.study_queue(start).expect("study queue");
        let mut unlocked = Vec::new();
        for (i, word) in queue.iter().take(count).enumerate() {
            let answered_at = start + spacing * (i as i32 + 1);
            let outcome = self
                .engine
                .submit_answer(&mut ctx, word.id, correct, Some(1500), answered_at)
                .expect("submit answer");
            unlocked.extend(outcome.unlocked);
        }
        (ctx, unlocked)
    }

    /// Start, answer `count` words correctly, and complete one session.
    pub fn quick_session(&self, start: NaiveDateTime, count: usize) -> SessionOutcome {
        let (ctx, _) = self.answer_queued(start, count, Duration::seconds(20), true);
        self.engine
            .complete_session(&ctx, start + Duration::minutes(5))
            .expect("complete session")
    }
}

pub fn ids(unlocked: &[UnlockedAchievement]) -> Vec<&str> {
    unlocked.iter().map(|u| u.id.as_str()).collect()
}
