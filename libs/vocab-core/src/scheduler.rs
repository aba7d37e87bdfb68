//! Progress scheduler.
//!
//! SM-2 variant: the review interval grows geometrically by the ease factor
//! while a word keeps being answered correctly, and the ease factor drifts
//! with response latency. Status is a pure function of the confidence score.

use crate::types::{WordMasteryRecord, WordStatus};
use chrono::NaiveDateTime;

/// Scheduler with configurable parameters.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub maximum_ease: f64,
    pub fast_response_ms: u64,
    pub slow_response_ms: u64,
    pub fast_bonus: f64,
    pub slow_penalty: f64,
    pub lapse_penalty: f64,
    pub first_interval: u32,
    pub second_interval: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            minimum_ease: 1.3,
            maximum_ease: 3.0,
            fast_response_ms: 2000,
            slow_response_ms: 5000,
            fast_bonus: 0.1,
            slow_penalty: 0.05,
            lapse_penalty: 0.2,
            first_interval: 1,
            second_interval: 6,
        }
    }
}

impl Scheduler {
    /// Produce the next mastery record after an answer.
    ///
    /// A missing record is initialized in place, so this never fails.
    pub fn update(
        &self,
        record: Option<&WordMasteryRecord>,
        word_id: i64,
        is_correct: bool,
        response_time_ms: Option<u64>,
        now: NaiveDateTime,
    ) -> WordMasteryRecord {
        let today = now.date();
        let mut next = match record {
            Some(existing) => existing.clone(),
            None => {
                tracing::debug!(word_id, "no mastery record yet, starting fresh");
                let mut fresh = WordMasteryRecord::new(word_id, today);
                fresh.ease_factor = self.initial_ease;
                fresh
            }
        };

        next.times_shown += 1;
        next.last_reviewed_at = Some(now);

        if is_correct {
            next.times_correct += 1;
            next.consecutive_correct += 1;
            next.interval_days = self.correct_interval(&next);
            next.ease_factor = self.drift_ease(next.ease_factor, response_time_ms);
        } else {
            next.times_incorrect += 1;
            next.consecutive_correct = 0;
            next.interval_days = self.first_interval;
            next.ease_factor = (next.ease_factor - self.lapse_penalty).max(self.minimum_ease);
        }

        next.confidence_level = self.confidence_score(&next);
        next.status = WordStatus::from_confidence(next.confidence_level);
        next.schedule_from(today);
        next
    }

    /// Confidence score (0-100) blending streak, accuracy, ease and interval.
    pub fn confidence_score(&self, record: &WordMasteryRecord) -> u8 {
        let streak_part = f64::from(record.consecutive_correct.min(5)) * 10.0;
        let accuracy_part = record.accuracy() * 30.0;
        let ease_span = self.maximum_ease - self.minimum_ease;
        let ease_part = (record.ease_factor - self.minimum_ease) / ease_span * 10.0;
        let interval_part = if record.interval_days > 30 { 10.0 } else { 0.0 };

        let score = streak_part + accuracy_part + ease_part + interval_part;
        score.round().clamp(0.0, 100.0) as u8
    }

    /// Replay a run of outcomes from a fresh record, returning each record.
    pub fn replay(
        &self,
        word_id: i64,
        outcomes: &[(bool, Option<u64>)],
        start: NaiveDateTime,
    ) -> Vec<WordMasteryRecord> {
        let mut history: Vec<WordMasteryRecord> = Vec::with_capacity(outcomes.len());
        for &(is_correct, latency) in outcomes {
            let next = self.update(history.last(), word_id, is_correct, latency, start);
            history.push(next);
        }
        history
    }

    /// Interval after each answer in `outcomes`.
    pub fn interval_sequence(
        &self,
        outcomes: &[(bool, Option<u64>)],
        start: NaiveDateTime,
    ) -> Vec<u32> {
        self.replay(0, outcomes, start)
            .iter()
            .map(|r| r.interval_days)
            .collect()
    }

    fn correct_interval(&self, record: &WordMasteryRecord) -> u32 {
        match record.consecutive_correct {
            0 | 1 => self.first_interval,
            2 => self.second_interval,
            _ => {
                let grown = (f64::from(record.interval_days) * record.ease_factor).round();
                (grown as u32).max(self.first_interval)
            }
        }
    }

    fn drift_ease(&self, ease: f64, response_time_ms: Option<u64>) -> f64 {
        match response_time_ms {
            Some(ms) if ms < self.fast_response_ms => {
                (ease + self.fast_bonus).min(self.maximum_ease)
            }
            Some(ms) if ms > self.slow_response_ms => {
                (ease - self.slow_penalty).max(self.minimum_ease)
            }
            _ => ease,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_first_answer_initializes_record() {
        let scheduler = Scheduler::default();
        let record = scheduler.update(None, 42, true, Some(3000), now());
        assert_eq!(record.word_id, 42);
        assert_eq!(record.times_shown, 1);
        assert_eq!(record.times_correct, 1);
        assert_eq!(record.consecutive_correct, 1);
        assert_eq!(record.interval_days, 1);
        assert_eq!(record.ease_factor, 2.5);
        assert_eq!(record.next_review_date, now().date() + Duration::days(1));
        assert_eq!(record.last_reviewed_at, Some(now()));
    }

    #[test]
    fn test_interval_sequence_follows_ease_factor() {
        let scheduler = Scheduler::default();
        // Moderate latency leaves the ease factor at 2.5.
        let outcomes = vec![(true, Some(3000)); 5];
        assert_eq!(
            scheduler.interval_sequence(&outcomes, now()),
            vec![1, 6, 15, 38, 95]
        );
    }

    #[test]
    fn test_fast_answers_raise_ease_until_cap() {
        let scheduler = Scheduler::default();
        let outcomes = vec![(true, Some(800)); 8];
        let history = scheduler.replay(1, &outcomes, now());
        let eases: Vec<f64> = history.iter().map(|r| r.ease_factor).collect();
        assert!((eases[0] - 2.6).abs() < 1e-9);
        assert!((eases[4] - 3.0).abs() < 1e-9);
        assert!((eases[7] - 3.0).abs() < 1e-9);
        // Third interval uses the ease before this answer's drift: round(6 * 2.7).
        assert_eq!(history[2].interval_days, 16);
    }

    #[test]
    fn test_slow_answers_lower_ease_with_floor() {
        let scheduler = Scheduler::default();
        let record = WordMasteryRecord {
            ease_factor: 1.32,
            ..WordMasteryRecord::new(1, now().date())
        };
        let next = scheduler.update(Some(&record), 1, true, Some(9000), now());
        assert!((next.ease_factor - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_incorrect_answer_resets_progress() {
        let scheduler = Scheduler::default();
        let record = WordMasteryRecord {
            consecutive_correct: 4,
            interval_days: 38,
            ease_factor: 2.5,
            times_shown: 4,
            times_correct: 4,
            ..WordMasteryRecord::new(1, now().date())
        };
        let next = scheduler.update(Some(&record), 1, false, Some(1000), now());
        assert_eq!(next.consecutive_correct, 0);
        assert_eq!(next.interval_days, 1);
        assert!((next.ease_factor - 2.3).abs() < 1e-9);
        assert_eq!(next.times_incorrect, 1);
        assert_eq!(next.times_shown, next.times_correct + next.times_incorrect);
    }

    #[test]
    fn test_ease_factor_never_below_minimum() {
        let scheduler = Scheduler::default();
        let record = WordMasteryRecord {
            ease_factor: 1.4,
            ..WordMasteryRecord::new(1, now().date())
        };
        let next = scheduler.update(Some(&record), 1, false, None, now());
        assert!(next.ease_factor >= scheduler.minimum_ease);
    }

    #[test]
    fn test_familiar_word_answered_incorrectly_loses_confidence() {
        let scheduler = Scheduler::default();
        let record = WordMasteryRecord {
            status: WordStatus::Familiar,
            confidence_level: 65,
            times_shown: 10,
            times_correct: 8,
            times_incorrect: 2,
            consecutive_correct: 3,
            ease_factor: 2.4,
            interval_days: 14,
            ..WordMasteryRecord::new(9, now().date())
        };
        let next = scheduler.update(Some(&record), 9, false, Some(2500), now());
        assert_eq!(next.consecutive_correct, 0);
        assert_eq!(next.interval_days, 1);
        assert!((next.ease_factor - 2.2).abs() < 1e-9);
        // 0 + (8/11)*30 + (0.9/1.7)*10 = 21.8 + 5.3 = 27
        assert_eq!(next.confidence_level, 27);
        assert_eq!(next.status, WordStatus::Learning);
    }

    #[test]
    fn test_confidence_is_monotonic_for_correct_runs() {
        let scheduler = Scheduler::default();
        for latency in [Some(800), Some(3000), None] {
            let history = scheduler.replay(1, &vec![(true, latency); 12], now());
            for pair in history.windows(2) {
                assert!(pair[1].confidence_level >= pair[0].confidence_level);
            }
        }
    }

    #[test]
    fn test_status_tracks_confidence() {
        let scheduler = Scheduler::default();
        let history = scheduler.replay(1, &vec![(true, Some(800)); 10], now());
        for record in &history {
            assert_eq!(record.status, WordStatus::from_confidence(record.confidence_level));
        }
        assert_eq!(history.last().map(|r| r.status), Some(WordStatus::Retired));
    }

    #[test]
    fn test_update_is_deterministic() {
        let scheduler = Scheduler::default();
        let record = WordMasteryRecord::new(3, now().date());
        let a = scheduler.update(Some(&record), 3, true, Some(1500), now());
        let b = scheduler.update(Some(&record), 3, true, Some(1500), now());
        assert_eq!(a, b);
    }
}
