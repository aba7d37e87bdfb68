//! Achievements: catalog, unlock criteria, and tiered evaluation.
//!
//! Checks run in three tiers, matching when their statistics are cheap:
//! immediate (per answer), session (at session end), and comprehensive
//! (lifetime aggregates).

mod catalog;
mod criteria;
mod engine;
mod stats;

pub use catalog::{
    default_catalog, AchievementCategory, AchievementDefinition, Catalog, EvaluationTier, Rarity,
};
pub use criteria::{CriteriaProgress, UnlockCriteria};
pub use engine::{AchievementEngine, AchievementProgress, UnlockedAchievement};
pub use stats::{AchievementStats, LifetimeStats, SessionContext};
