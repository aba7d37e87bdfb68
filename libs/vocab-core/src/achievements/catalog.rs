//! Achievement definitions.
//!
//! The catalog is seeded once and never mutated afterwards.

use super::criteria::UnlockCriteria;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Learning,
    Mastery,
    Streak,
    Session,
    Speed,
    Time,
    Accuracy,
    Exploration,
    Dedication,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Mastery => "mastery",
            Self::Streak => "streak",
            Self::Session => "session",
            Self::Speed => "speed",
            Self::Time => "time",
            Self::Accuracy => "accuracy",
            Self::Exploration => "exploration",
            Self::Dedication => "dedication",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "learning" => Some(Self::Learning),
            "mastery" => Some(Self::Mastery),
            "streak" => Some(Self::Streak),
            "session" => Some(Self::Session),
            "speed" => Some(Self::Speed),
            "time" => Some(Self::Time),
            "accuracy" => Some(Self::Accuracy),
            "exploration" => Some(Self::Exploration),
            "dedication" => Some(Self::Dedication),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "common" => Some(Self::Common),
            "uncommon" => Some(Self::Uncommon),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }
}

/// When a definition is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationTier {
    /// After every answer, from the session context alone.
    Immediate,
    /// At session completion, from that session's counters.
    Session,
    /// Full sweep over lifetime aggregates.
    Comprehensive,
}

impl EvaluationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Session => "session",
            Self::Comprehensive => "comprehensive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "immediate" => Some(Self::Immediate),
            "session" => Some(Self::Session),
            "comprehensive" => Some(Self::Comprehensive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub points: u32,
    pub criteria: UnlockCriteria,
    pub hidden: bool,
    pub tier: EvaluationTier,
}

/// Validated, immutable set of definitions.
#[derive(Debug, Clone)]
pub struct Catalog {
    definitions: Vec<AchievementDefinition>,
}

impl Catalog {
    /// Validate every definition. Any bad entry fails the whole load.
    pub fn new(definitions: Vec<AchievementDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.id.as_str()) {
                return Err(EngineError::DuplicateAchievement(def.id.clone()));
            }
            def.criteria.validate(&def.id)?;
        }
        Ok(Self { definitions })
    }

    pub fn get(&self, id: &str) -> Option<&AchievementDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn for_tier(&self, tier: EvaluationTier) -> impl Iterator<Item = &AchievementDefinition> {
        self.definitions.iter().filter(move |d| d.tier == tier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AchievementDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[allow(clippy::too_many_arguments)]
fn def(
    id: &str,
    name: &str,
    description: &str,
    category: AchievementCategory,
    rarity: Rarity,
    points: u32,
    tier: EvaluationTier,
    criteria: UnlockCriteria,
) -> AchievementDefinition {
    AchievementDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        rarity,
        points,
        criteria,
        hidden: false,
        tier,
    }
}

fn hidden(mut definition: AchievementDefinition) -> AchievementDefinition {
    definition.hidden = true;
    definition
}

/// Built-in catalog seeded into a fresh database.
pub fn default_catalog() -> Vec<AchievementDefinition> {
    use AchievementCategory as C;
    use EvaluationTier::{Comprehensive, Immediate, Session};
    use Rarity::*;
    use UnlockCriteria as U;

    let mut catalog = vec![
        // === IMMEDIATE ===
        def("first_word", "First Word", "Answer your very first word", C::Learning, Common, 5, Immediate, U::WordsPracticed { count: 1 }),
        def("consecutive_10", "On a Roll", "Answer 10 words correctly in a row", C::Accuracy, Uncommon, 15, Immediate, U::ConsecutiveCorrect { count: 10 }),
        def("consecutive_20", "Unstoppable", "Answer 20 words correctly in a row", C::Accuracy, Rare, 30, Immediate, U::ConsecutiveCorrect { count: 20 }),
        // === SESSION ===
        def("first_session", "First Steps", "Complete your first session", C::Session, Common, 10, Session, U::SessionsCompleted { count: 1 }),
        def("session_100_percent", "Flawless", "Finish a session of at least 20 words without a mistake", C::Accuracy, Rare, 40, Session, U::SessionAccuracy { percent: 100, min_words: 20 }),
        def("speed_20_in_10min", "Quick Study", "Practice 20 words within 10 minutes", C::Speed, Uncommon, 20, Session, U::SessionSpeed { words: 20, max_seconds: 600 }),
        def("session_50_words", "Marathon", "Practice 50 words in one session", C::Session, Uncommon, 25, Session, U::SessionWords { count: 50 }),
        def("session_100_words", "Ultra Marathon", "Practice 100 words in one session", C::Session, Epic, 60, Session, U::SessionWords { count: 100 }),
        def("early_bird", "Early Bird", "Start a session before 8 AM", C::Time, Uncommon, 15, Session, U::SessionHour { min: None, max: Some(8) }),
        hidden(def("night_owl", "Night Owl", "Start a session between midnight and 5 AM", C::Time, Rare, 25, Session, U::SessionHour { min: Some(0), max: Some(5) })),
        // === COMPREHENSIVE ===
        def("first_day", "Day One", "Practice on your first day", C::Dedication, Common, 10, Comprehensive, U::DaysPracticed { count: 1 }),
        def("week_of_practice", "Regular", "Practice on 7 different days", C::Dedication, Uncommon, 20, Comprehensive, U::DaysPracticed { count: 7 }),
        def("words_100", "Word Collector", "Practice 100 different words", C::Learning, Uncommon, 20, Comprehensive, U::WordsPracticed { count: 100 }),
        def("words_1000", "Lexicon", "Practice 1000 different words", C::Learning, Epic, 75, Comprehensive, U::WordsPracticed { count: 1000 }),
        def("accuracy_90", "Sharpshooter", "Keep 90% accuracy over at least 100 reviews", C::Accuracy, Rare, 40, Comprehensive, U::OverallAccuracy { percent: 90, min_words: 100 }),
        def("category_explorer", "Explorer", "Practice words from 10 categories", C::Exploration, Uncommon, 25, Comprehensive, U::CategoriesCount { count: 10 }),
        def("polyglot_2", "Bilingual", "Practice 2 language pairs", C::Exploration, Uncommon, 20, Comprehensive, U::LanguagesCount { count: 2 }),
        def("polyglot_3", "Trilingual", "Practice 3 language pairs", C::Exploration, Rare, 40, Comprehensive, U::LanguagesCount { count: 3 }),
        def("polyglot_5", "Polyglot", "Practice 5 language pairs", C::Exploration, Epic, 80, Comprehensive, U::LanguagesCount { count: 5 }),
        hidden(def("comeback", "Welcome Back", "Return after 30 days away", C::Dedication, Rare, 30, Comprehensive, U::DaysInactive { days: 30 })),
        def("tinkerer", "Tinkerer", "Adjust your learning settings", C::Dedication, Common, 5, Comprehensive, U::SettingsChanged { count: 1 }),
        def("level_up", "Level Up", "Advance to the next CEFR level", C::Learning, Rare, 50, Comprehensive, U::LevelAdvanced { count: 1 }),
    ];

    let streaks = [
        (3, Common, 10),
        (7, Uncommon, 25),
        (14, Rare, 50),
        (30, Epic, 100),
        (100, Legendary, 250),
        (365, Legendary, 500),
    ];
    for (days, rarity, points) in streaks {
        catalog.push(def(
            &format!("streak_{}", days),
            &format!("{}-Day Streak", days),
            &format!("Practice {} days in a row", days),
            C::Streak,
            rarity,
            points,
            Comprehensive,
            U::StreakDays { days },
        ));
    }

    let mastery = [
        (10, Common, 10),
        (50, Uncommon, 25),
        (100, Rare, 50),
        (250, Rare, 75),
        (500, Epic, 150),
        (1000, Legendary, 300),
        (5000, Legendary, 1000),
    ];
    for (count, rarity, points) in mastery {
        catalog.push(def(
            &format!("mastered_{}", count),
            &format!("{} Words Mastered", count),
            &format!("Master {} words", count),
            C::Mastery,
            rarity,
            points,
            Comprehensive,
            U::WordsMastered { count },
        ));
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = Catalog::new(default_catalog()).expect("default catalog validates");
        assert_eq!(catalog.len(), 35);
        assert!(catalog.get("streak_365").is_some());
        assert!(catalog.get("mastered_5000").is_some());
        assert_eq!(catalog.for_tier(EvaluationTier::Immediate).count(), 3);
        assert_eq!(catalog.for_tier(EvaluationTier::Session).count(), 7);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut defs = default_catalog();
        let first = defs[0].clone();
        defs.push(first);
        let err = Catalog::new(defs).expect_err("duplicate");
        assert!(matches!(err, EngineError::DuplicateAchievement(id) if id == "first_word"));
    }

    #[test]
    fn test_invalid_criteria_fail_catalog_load() {
        let mut defs = default_catalog();
        defs[0].criteria = UnlockCriteria::StreakDays { days: 0 };
        assert!(matches!(
            Catalog::new(defs),
            Err(EngineError::InvalidCriteria { .. })
        ));
    }

    #[test]
    fn test_hidden_entries_are_marked() {
        let catalog = Catalog::new(default_catalog()).expect("valid");
        let hidden: Vec<&str> = catalog
            .iter()
            .filter(|d| d.hidden)
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(hidden, vec!["night_owl", "comeback"]);
    }
}
