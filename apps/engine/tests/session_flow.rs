//! End-to-end session tests against in-memory SQLite.

mod common;

use chrono::Duration;
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use vocab_core::{
    AchievementStore, EngineSettings, SessionLog, SettingsStore, StatsSource, WordRepository,
    WordStatus,
};

use common::fixtures::{self, at};
use common::{ids, TestContext};

/// 20 words, all correct, finished in 9 minutes.
#[test]
fn test_perfect_fast_first_session() {
    let ctx = TestContext::new();
    let start = at(3, 10, 0);

    let (session, during) = ctx.answer_queued(start, 20, Duration::seconds(27), true);
    assert_eq!(ids(&during), vec!["first_word", "consecutive_10", "consecutive_20"]);
    assert_eq!(session.words_count, 20);
    assert_eq!(session.best_consecutive, 20);

    let outcome = ctx
        .engine
        .complete_session(&session, start + Duration::minutes(9))
        .unwrap();
    assert_eq!(
        ids(&outcome.unlocked),
        vec![
            "first_session",
            "session_100_percent",
            "speed_20_in_10min",
            "first_day"
        ]
    );
    assert_eq!(outcome.summary.duration_seconds, 540);
    assert_eq!(outcome.summary.correct_count, 20);
    assert_eq!(outcome.streak.current_streak_days, 1);
    assert_eq!(outcome.milestone, None);

    let stats = ctx.engine.repository().lifetime_stats(start.date()).unwrap();
    assert_eq!(stats.words_practiced, 20);
    assert_eq!(stats.sessions_completed, 1);
    assert_eq!(stats.days_practiced, 1);
}

#[test]
fn test_completing_twice_changes_nothing() {
    let ctx = TestContext::new();
    let start = at(3, 10, 0);
    let (session, _) = ctx.answer_queued(start, 3, Duration::seconds(30), true);

    let first = ctx
        .engine
        .complete_session(&session, start + Duration::minutes(2))
        .unwrap();
    assert!(!first.unlocked.is_empty());

    let again = ctx.engine.complete_session(&session, start + Duration::hours(2)).unwrap();
    assert_eq!(again.summary, first.summary);
    assert_eq!(again.streak, first.streak);
    assert!(again.unlocked.is_empty());
}

#[test]
fn test_achievements_unlock_once_across_sessions() {
    let ctx = TestContext::new();
    let first = ctx.quick_session(at(3, 10, 0), 2);
    assert!(ids(&first.unlocked).contains(&"first_session"));

    let second = ctx.quick_session(at(3, 15, 0), 2);
    assert!(second.unlocked.is_empty());
    assert_eq!(second.streak.current_streak_days, 1);

    let progress = ctx.engine.repository().get_progress("first_session").unwrap().unwrap();
    assert!(progress.is_completed);
    assert_eq!(progress.unlocked_at, Some(at(3, 10, 5)));
}

#[test]
fn test_incorrect_answer_resets_consecutive_run() {
    let ctx = TestContext::new();
    let start = at(3, 10, 0);
    let mut session = ctx.engine.start_session(start).unwrap();
    let queue = ctx.engine.study_queue(start).unwrap();
    let words: Vec<i64> = queue.iter().map(|w| w.id).take(12).collect();

    let mut unlocked = Vec::new();
    for (i, word_id) in words.iter().enumerate() {
        let correct = i != 5;
        let answered_at = start + Duration::seconds(i as i64 * 10);
        let outcome = ctx
            .engine
            .submit_answer(&mut session, *word_id, correct, Some(2500), answered_at)
            .unwrap();
        if !correct {
            assert_eq!(outcome.record.consecutive_correct, 0);
            assert_eq!(outcome.record.interval_days, 1);
            assert_eq!(outcome.record.status, WordStatus::New);
        }
        unlocked.extend(outcome.unlocked);
    }
    assert_eq!(ids(&unlocked), vec!["first_word"]);
    assert_eq!(session.consecutive_correct, 6);
}

#[test]
fn test_answer_persists_mastery_record() {
    let ctx = TestContext::new();
    let start = at(3, 10, 0);
    let mut session = ctx.engine.start_session(start).unwrap();
    let outcome = ctx.engine.submit_answer(&mut session, 7, true, Some(1200), start).unwrap();

    let stored = ctx.engine.repository().get_mastery_record(7).unwrap().unwrap();
    assert_eq!(stored, outcome.record);
    assert_eq!(stored.times_shown, 1);
    assert_eq!(stored.next_review_date, start.date() + Duration::days(1));
}

#[test]
fn test_early_bird_and_night_owl() {
    let ctx = TestContext::new();
    let early = ctx.quick_session(at(3, 7, 0), 1);
    assert!(ids(&early.unlocked).contains(&"early_bird"));
    assert!(!ids(&early.unlocked).contains(&"night_owl"));

    let night = ctx.quick_session(at(4, 2, 0), 1);
    assert!(ids(&night.unlocked).contains(&"night_owl"));
}

#[test]
fn test_empty_session_is_finalized_without_side_effects() {
    let ctx = TestContext::new();
    let start = at(3, 10, 0);
    let session = ctx.engine.start_session(start).unwrap();
    let outcome = ctx.engine.complete_session(&session, start + Duration::minutes(1)).unwrap();

    assert!(outcome.summary.is_finalized());
    assert!(outcome.unlocked.is_empty());
    assert_eq!(outcome.streak.current_streak_days, 0);
    assert!(ctx
        .engine
        .repository()
        .get_session(&session.session_id)
        .unwrap()
        .unwrap()
        .is_finalized());
}

#[test]
fn test_notifications_cleared_only_by_acknowledge() {
    let ctx = TestContext::new();
    ctx.quick_session(at(3, 10, 0), 1);

    let pending = ctx.engine.pending_notifications().unwrap();
    let mut pending_ids = ids(&pending);
    pending_ids.sort();
    assert_eq!(pending_ids, vec!["first_day", "first_session", "first_word"]);

    // Re-evaluation does not resurface or clear anything.
    ctx.quick_session(at(3, 11, 0), 1);
    assert_eq!(ctx.engine.pending_notifications().unwrap().len(), 3);

    ctx.engine.acknowledge("first_word").unwrap();
    let pending = ctx.engine.pending_notifications().unwrap();
    let mut remaining = ids(&pending);
    remaining.sort();
    assert_eq!(remaining, vec!["first_day", "first_session"]);
    assert_eq!(ctx.engine.earned_points().unwrap(), 25);
}

#[test]
fn test_study_queue_respects_daily_limits() {
    let ctx = TestContext::new();
    let settings = EngineSettings {
        new_words_per_day: 5,
        ..EngineSettings::default()
    };
    ctx.engine.save_settings(&settings, at(3, 9, 0)).unwrap();

    let queue = ctx.engine.study_queue(at(3, 10, 0)).unwrap();
    assert_eq!(queue.new_words.len(), 5);
    assert!(queue.due_words.is_empty());

    let (session, _) = ctx.answer_queued(at(3, 10, 0), 2, Duration::seconds(10), true);
    ctx.engine.complete_session(&session, at(3, 10, 5)).unwrap();

    let queue = ctx.engine.study_queue(at(3, 12, 0)).unwrap();
    assert_eq!(queue.new_remaining, 3);
    assert_eq!(queue.new_words.len(), 3);

    // Next day the answered words are due and the allowance is fresh.
    let queue = ctx.engine.study_queue(at(4, 10, 0)).unwrap();
    assert_eq!(queue.due_words.len(), 2);
    assert_eq!(queue.new_words.len(), 5);
    assert_eq!(queue.iter().next().map(|w| w.id), Some(queue.due_words[0].id));
}

#[test]
fn test_question_options_stay_in_language_pair() {
    let ctx = TestContext::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let settings = ctx.engine.settings().unwrap();

    for id in 1..=40 {
        let target = ctx.engine.repository().get_word(id).unwrap().unwrap();
        let question = ctx.engine.question_for(&target, &settings, &mut rng);
        assert_eq!(question.correct_id, id);
        assert_eq!(question.options.len(), 4);
        assert_eq!(question.direction_label, "English → Spanish");

        let mut option_ids: Vec<i64> = question.options.iter().map(|o| o.word_id).collect();
        assert!(option_ids.contains(&id));
        option_ids.sort();
        option_ids.dedup();
        assert_eq!(option_ids.len(), 4);
        for option_id in option_ids {
            assert!(option_id <= 40, "option {} outside en-es pool", option_id);
            assert_ne!(option_id, fixtures::NOISE_WORD_ID);
        }
    }
}

#[test]
fn test_next_question_follows_queue_and_direction() {
    let ctx = TestContext::new();
    let settings = EngineSettings {
        reverse_direction: true,
        ..EngineSettings::default()
    };
    ctx.engine.save_settings(&settings, at(3, 9, 0)).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let question = ctx
        .engine
        .next_question_with_rng(at(3, 10, 0), &mut rng)
        .unwrap()
        .expect("a queued word");
    assert_eq!(question.correct_id, 1);
    assert_eq!(question.prompt, "palabra 1");
    assert_eq!(question.direction_label, "Spanish → English");
    let correct = question.options.iter().find(|o| o.word_id == 1).unwrap();
    assert_eq!(correct.text, "word 1");
}

#[test]
fn test_settings_and_level_achievements() {
    let ctx = TestContext::new();
    let level_up = ctx.engine.advance_level(at(3, 9, 0)).unwrap().expect("can advance");
    assert_eq!(level_up.level, vocab_core::CefrLevel::A2);
    assert_eq!(ids(&level_up.unlocked), vec!["tinkerer", "level_up"]);
    assert_eq!(ctx.engine.settings().unwrap().cefr_level, Some(vocab_core::CefrLevel::A2));

    let mut settings = ctx.engine.repository().get_settings().unwrap();
    settings.cefr_level = Some(vocab_core::CefrLevel::C2);
    assert!(ctx.engine.save_settings(&settings, at(3, 9, 5)).unwrap().is_empty());
    assert!(ctx.engine.advance_level(at(3, 9, 10)).unwrap().is_none());
}

#[test]
fn test_reset_progress_clears_learner_state() {
    let mut ctx = TestContext::new();
    ctx.quick_session(at(3, 10, 0), 4);

    ctx.engine.repository_mut().reset_progress().unwrap();
    let repo = ctx.engine.repository();
    let stats = repo.lifetime_stats(at(3, 0, 0).date()).unwrap();
    assert_eq!(stats, vocab_core::LifetimeStats::default());
    assert!(ctx.engine.pending_notifications().unwrap().is_empty());
    assert_eq!(ctx.engine.current_streak(at(3, 12, 0)).unwrap(), 0);
    assert_eq!(repo.get_catalog().unwrap().len(), 35);
    assert_eq!(ctx.engine.study_queue(at(3, 12, 0)).unwrap().new_words.len(), 20);
}
