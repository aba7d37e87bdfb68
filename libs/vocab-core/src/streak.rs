//! Daily streak tracking.
//!
//! Reconciled once per completed session against the learner's study day.

use crate::types::StreakState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Streak milestones and their tier names, ascending.
pub const MILESTONES: &[(u32, &str)] = &[(7, "week"), (30, "month"), (100, "century"), (365, "year")];

/// Day gap between the last activity and today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayDelta {
    SameDay,
    NextDay,
    Broken,
}

impl DayDelta {
    /// Numeric form: 0, 1, or -1 for a broken streak.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::SameDay => 0,
            Self::NextDay => 1,
            Self::Broken => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub day_delta: DayDelta,
    pub resets: bool,
}

/// Streak threshold crossed by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub threshold: u32,
    pub tier: &'static str,
}

/// Result of recording one completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub state: StreakState,
    pub reconciliation: Reconciliation,
    pub milestone: Option<Milestone>,
}

pub struct StreakTracker;

impl StreakTracker {
    pub fn reconcile(state: &StreakState, today: NaiveDate) -> Reconciliation {
        let day_delta = match state.last_activity_date {
            None if state.current_streak_days > 0 => DayDelta::Broken,
            None => DayDelta::SameDay,
            Some(last) => match (today - last).num_days() {
                // A future last date (clock moved back) is treated as today.
                i64::MIN..=0 => DayDelta::SameDay,
                1 => DayDelta::NextDay,
                _ => DayDelta::Broken,
            },
        };
        Reconciliation {
            day_delta,
            resets: day_delta == DayDelta::Broken,
        }
    }

    pub fn apply(state: &StreakState, day_delta: DayDelta, today: NaiveDate) -> StreakState {
        let current = match day_delta {
            DayDelta::Broken => 1,
            DayDelta::NextDay => state.current_streak_days + 1,
            DayDelta::SameDay => state.current_streak_days.max(1),
        };
        StreakState {
            current_streak_days: current,
            longest_streak_days: state.longest_streak_days.max(current),
            last_activity_date: Some(today),
        }
    }

    /// Highest milestone crossed going from `old` to `new`, if any.
    ///
    /// A jump over several thresholds reports only the highest one.
    pub fn detect_milestone(old: u32, new: u32) -> Option<Milestone> {
        MILESTONES
            .iter()
            .rev()
            .find(|(threshold, _)| old < *threshold && *threshold <= new)
            .map(|&(threshold, tier)| Milestone { threshold, tier })
    }

    /// Reconcile, apply, and detect in one step.
    pub fn record_session(state: &StreakState, today: NaiveDate) -> StreakUpdate {
        let reconciliation = Self::reconcile(state, today);
        let next = Self::apply(state, reconciliation.day_delta, today);
        let milestone = Self::detect_milestone(state.current_streak_days, next.current_streak_days);
        if reconciliation.resets {
            tracing::debug!(previous = state.current_streak_days, "streak broken");
        }
        StreakUpdate {
            state: next,
            reconciliation,
            milestone,
        }
    }
}
