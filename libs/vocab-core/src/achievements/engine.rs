//! Tiered achievement evaluation.

use super::catalog::{AchievementDefinition, Catalog, EvaluationTier, Rarity};
use super::stats::{AchievementStats, LifetimeStats, SessionContext};
use crate::error::Result;
use crate::store::AchievementStore;
use crate::types::{SessionSummary, StreakState};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Per-learner progress row for one definition.
///
/// `is_completed` never goes back to false once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub achievement_id: String,
    pub progress_value: u32,
    pub progress_max: u32,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<NaiveDateTime>,
    pub notification_shown: bool,
}

impl AchievementProgress {
    pub fn new(achievement_id: impl Into<String>, progress_max: u32) -> Self {
        Self {
            achievement_id: achievement_id.into(),
            progress_value: 0,
            progress_max,
            is_completed: false,
            unlocked_at: None,
            notification_shown: false,
        }
    }
}

/// An achievement that was just unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub points: u32,
    pub unlocked_at: NaiveDateTime,
}

impl UnlockedAchievement {
    fn from_definition(def: &AchievementDefinition, at: NaiveDateTime) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            rarity: def.rarity,
            points: def.points,
            unlocked_at: at,
        }
    }
}

/// Evaluates a catalog against statistics and records progress in a store.
pub struct AchievementEngine<'a, S: AchievementStore + ?Sized> {
    store: &'a S,
    catalog: &'a Catalog,
}

impl<'a, S: AchievementStore + ?Sized> AchievementEngine<'a, S> {
    pub fn new(store: &'a S, catalog: &'a Catalog) -> Self {
        Self { store, catalog }
    }

    /// Evaluate every definition of `tier`, returning only new unlocks.
    pub fn evaluate(
        &self,
        tier: EvaluationTier,
        stats: &AchievementStats,
        now: NaiveDateTime,
    ) -> Result<Vec<UnlockedAchievement>> {
        let mut newly_unlocked = Vec::new();

        for def in self.catalog.for_tier(tier) {
            let outcome = def.criteria.progress(stats);
            let mut progress = self
                .store
                .get_progress(&def.id)?
                .unwrap_or_else(|| AchievementProgress::new(&def.id, outcome.max));

            if progress.is_completed {
                progress.progress_value = progress.progress_value.max(outcome.value);
                self.store.save_progress(&progress)?;
                continue;
            }

            progress.progress_value = outcome.value;
            progress.progress_max = outcome.max;
            if outcome.is_met() {
                progress.is_completed = true;
                progress.unlocked_at = Some(now);
                self.store.save_progress(&progress)?;
                self.store.mark_unlocked(&def.id, now)?;
                tracing::info!(achievement_id = %def.id, points = def.points, "achievement unlocked");
                newly_unlocked.push(UnlockedAchievement::from_definition(def, now));
            } else {
                self.store.save_progress(&progress)?;
            }
        }

        Ok(newly_unlocked)
    }

    /// Per-answer checks: consecutive-correct runs and the first word.
    pub fn check_immediate(
        &self,
        ctx: &SessionContext,
        now: NaiveDateTime,
    ) -> Result<Vec<UnlockedAchievement>> {
        self.evaluate(EvaluationTier::Immediate, &AchievementStats::immediate(ctx), now)
    }

    /// End-of-session checks from the finalized summary.
    pub fn check_session(
        &self,
        summary: &SessionSummary,
        sessions_completed: u32,
        now: NaiveDateTime,
    ) -> Result<Vec<UnlockedAchievement>> {
        let stats = AchievementStats::session(summary, sessions_completed);
        self.evaluate(EvaluationTier::Session, &stats, now)
    }

    /// Full sweep over lifetime aggregates.
    pub fn check_comprehensive(
        &self,
        lifetime: &LifetimeStats,
        streak: &StreakState,
        now: NaiveDateTime,
    ) -> Result<Vec<UnlockedAchievement>> {
        let stats = AchievementStats::comprehensive(lifetime, streak);
        self.evaluate(EvaluationTier::Comprehensive, &stats, now)
    }

    /// Unlock a definition regardless of its criteria.
    ///
    /// Returns `None` for unknown ids and ones already unlocked.
    pub fn unlock(
        &self,
        achievement_id: &str,
        now: NaiveDateTime,
    ) -> Result<Option<UnlockedAchievement>> {
        let Some(def) = self.catalog.get(achievement_id) else {
            return Ok(None);
        };
        let target = def.criteria.progress(&AchievementStats::default()).max;
        let mut progress = self
            .store
            .get_progress(achievement_id)?
            .unwrap_or_else(|| AchievementProgress::new(achievement_id, target));
        if progress.is_completed {
            return Ok(None);
        }
        progress.progress_value = progress.progress_max;
        progress.is_completed = true;
        progress.unlocked_at = Some(now);
        self.store.save_progress(&progress)?;
        self.store.mark_unlocked(achievement_id, now)?;
        Ok(Some(UnlockedAchievement::from_definition(def, now)))
    }

    /// Unlocked achievements the UI has not displayed yet.
    pub fn pending_notifications(&self) -> Result<Vec<UnlockedAchievement>> {
        let pending = self.store.get_pending_notifications()?;
        Ok(pending
            .into_iter()
            .filter_map(|p| {
                let def = self.catalog.get(&p.achievement_id)?;
                Some(UnlockedAchievement::from_definition(def, p.unlocked_at?))
            })
            .collect())
    }

    /// Record that the UI has shown the unlock.
    pub fn mark_notified(&self, achievement_id: &str) -> Result<()> {
        self.store.mark_notified(achievement_id)
    }

    /// Points from every completed achievement.
    pub fn earned_points(&self) -> Result<u32> {
        let mut total = 0;
        for def in self.catalog.iter() {
            if let Some(progress) = self.store.get_progress(&def.id)? {
                if progress.is_completed {
                    total += def.points;
                }
            }
        }
        Ok(total)
    }
}
