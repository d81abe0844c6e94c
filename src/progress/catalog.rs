//! Achievement and badge definitions
//!
//! Achievements and badges share one record shape and differ only by
//! [`ItemKind`]. The static definitions here are rebuilt into
//! [`CatalogItem`]s on every evaluation pass; unlock state lives in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::requirements::{MetricType, Requirement};

/// Whether a catalog item is an achievement or a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Achievement,
    Badge,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Achievement => "achievement",
            Self::Badge => "badge",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "achievement" => Some(Self::Achievement),
            "badge" => Some(Self::Badge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
        }
    }
}

/// Static definition of an achievement or badge
#[derive(Debug, Clone)]
pub struct ItemDefinition {
    pub id: &'static str,
    pub kind: ItemKind,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rarity: Rarity,
    pub category: &'static str,
    pub xp_reward: u64,
    pub metric: MetricType,
    pub target: f64,
}

/// All achievement definitions
pub static ACHIEVEMENTS: &[ItemDefinition] = &[
    // === LEARNING ===
    ItemDefinition {
        id: "first_steps",
        kind: ItemKind::Achievement,
        name: "First Steps",
        description: "Complete your first lesson",
        icon: "👣",
        rarity: Rarity::Common,
        category: "learning",
        xp_reward: 50,
        metric: MetricType::Lessons,
        target: 1.0,
    },
    ItemDefinition {
        id: "dedicated_learner",
        kind: ItemKind::Achievement,
        name: "Dedicated Learner",
        description: "Complete 10 lessons",
        icon: "📚",
        rarity: Rarity::Common,
        category: "learning",
        xp_reward: 100,
        metric: MetricType::Lessons,
        target: 10.0,
    },
    ItemDefinition {
        id: "lesson_master",
        kind: ItemKind::Achievement,
        name: "Lesson Master",
        description: "Complete 50 lessons",
        icon: "🎓",
        rarity: Rarity::Epic,
        category: "learning",
        xp_reward: 300,
        metric: MetricType::Lessons,
        target: 50.0,
    },
    // === STREAK ===
    ItemDefinition {
        id: "streak_3",
        kind: ItemKind::Achievement,
        name: "On Fire",
        description: "Practice 3 days in a row",
        icon: "🔥",
        rarity: Rarity::Common,
        category: "streak",
        xp_reward: 30,
        metric: MetricType::Streak,
        target: 3.0,
    },
    ItemDefinition {
        id: "week_warrior",
        kind: ItemKind::Achievement,
        name: "Week Warrior",
        description: "Practice 7 days in a row",
        icon: "📅",
        rarity: Rarity::Rare,
        category: "streak",
        xp_reward: 150,
        metric: MetricType::Streak,
        target: 7.0,
    },
    ItemDefinition {
        id: "month_master",
        kind: ItemKind::Achievement,
        name: "Monthly Master",
        description: "Practice 30 days in a row",
        icon: "👑",
        rarity: Rarity::Epic,
        category: "streak",
        xp_reward: 500,
        metric: MetricType::Streak,
        target: 30.0,
    },
    // === ACCURACY ===
    ItemDefinition {
        id: "sharp_mind",
        kind: ItemKind::Achievement,
        name: "Sharp Mind",
        description: "Finish a session with 90% accuracy",
        icon: "🎯",
        rarity: Rarity::Common,
        category: "accuracy",
        xp_reward: 75,
        metric: MetricType::Accuracy,
        target: 90.0,
    },
    ItemDefinition {
        id: "perfectionist",
        kind: ItemKind::Achievement,
        name: "Perfectionist",
        description: "Finish a session with 100% accuracy",
        icon: "💎",
        rarity: Rarity::Rare,
        category: "accuracy",
        xp_reward: 200,
        metric: MetricType::Accuracy,
        target: 100.0,
    },
    // === CHARACTERS ===
    ItemDefinition {
        id: "character_collector",
        kind: ItemKind::Achievement,
        name: "Character Collector",
        description: "Master 50 characters",
        icon: "✍️",
        rarity: Rarity::Rare,
        category: "characters",
        xp_reward: 150,
        metric: MetricType::Characters,
        target: 50.0,
    },
    ItemDefinition {
        id: "character_master",
        kind: ItemKind::Achievement,
        name: "Character Master",
        description: "Master 500 characters",
        icon: "🏯",
        rarity: Rarity::Legendary,
        category: "characters",
        xp_reward: 1000,
        metric: MetricType::Characters,
        target: 500.0,
    },
    // === TIME ===
    ItemDefinition {
        id: "time_investor",
        kind: ItemKind::Achievement,
        name: "Time Investor",
        description: "Practice for 60 minutes",
        icon: "⏳",
        rarity: Rarity::Common,
        category: "time",
        xp_reward: 100,
        metric: MetricType::PracticeTime,
        target: 60.0,
    },
    ItemDefinition {
        id: "marathon",
        kind: ItemKind::Achievement,
        name: "Marathon",
        description: "Practice for 600 minutes",
        icon: "🏃",
        rarity: Rarity::Epic,
        category: "time",
        xp_reward: 300,
        metric: MetricType::PracticeTime,
        target: 600.0,
    },
];

/// All badge definitions
pub static BADGES: &[ItemDefinition] = &[
    ItemDefinition {
        id: "badge_spark",
        kind: ItemKind::Badge,
        name: "Spark",
        description: "Keep a 3-day streak",
        icon: "✨",
        rarity: Rarity::Common,
        category: "dedication",
        xp_reward: 25,
        metric: MetricType::Streak,
        target: 3.0,
    },
    ItemDefinition {
        id: "badge_dedication",
        kind: ItemKind::Badge,
        name: "Dedication",
        description: "Keep a 7-day streak",
        icon: "🏅",
        rarity: Rarity::Rare,
        category: "dedication",
        xp_reward: 75,
        metric: MetricType::Streak,
        target: 7.0,
    },
    ItemDefinition {
        id: "badge_scholar",
        kind: ItemKind::Badge,
        name: "Scholar",
        description: "Complete 25 lessons",
        icon: "📜",
        rarity: Rarity::Rare,
        category: "study",
        xp_reward: 100,
        metric: MetricType::Lessons,
        target: 25.0,
    },
    ItemDefinition {
        id: "badge_accuracy_ace",
        kind: ItemKind::Badge,
        name: "Accuracy Ace",
        description: "Finish a session with 95% accuracy",
        icon: "🏹",
        rarity: Rarity::Rare,
        category: "precision",
        xp_reward: 100,
        metric: MetricType::Accuracy,
        target: 95.0,
    },
    ItemDefinition {
        id: "badge_hanzi_hero",
        kind: ItemKind::Badge,
        name: "Hanzi Hero",
        description: "Master 100 characters",
        icon: "🐉",
        rarity: Rarity::Epic,
        category: "characters",
        xp_reward: 250,
        metric: MetricType::Characters,
        target: 100.0,
    },
    ItemDefinition {
        id: "badge_devoted",
        kind: ItemKind::Badge,
        name: "Devoted",
        description: "Practice for 300 minutes",
        icon: "🌙",
        rarity: Rarity::Legendary,
        category: "dedication",
        xp_reward: 400,
        metric: MetricType::PracticeTime,
        target: 300.0,
    },
];

impl ItemDefinition {
    /// Every achievement and badge, achievements first
    pub fn all() -> impl Iterator<Item = &'static ItemDefinition> {
        ACHIEVEMENTS.iter().chain(BADGES.iter())
    }

    /// Get a definition by id
    pub fn get(id: &str) -> Option<&'static ItemDefinition> {
        Self::all().find(|d| d.id == id)
    }

    /// Number of definitions of a kind
    pub fn total_count(kind: ItemKind) -> usize {
        Self::all().filter(|d| d.kind == kind).count()
    }

    /// Total XP obtainable from a kind
    pub fn total_xp(kind: ItemKind) -> u64 {
        Self::all()
            .filter(|d| d.kind == kind)
            .map(|d| d.xp_reward)
            .sum()
    }
}

/// An achievement or badge with its live unlock state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub xp_reward: u64,
    pub rarity: Rarity,
    pub category: String,
    pub requirements: Vec<Requirement>,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl CatalogItem {
    /// Fresh, locked item built from its definition
    pub fn locked(def: &ItemDefinition) -> Self {
        Self {
            id: def.id.to_string(),
            kind: def.kind,
            name: def.name.to_string(),
            description: def.description.to_string(),
            icon: def.icon.to_string(),
            xp_reward: def.xp_reward,
            rarity: def.rarity,
            category: def.category.to_string(),
            requirements: vec![Requirement::new(def.metric, def.target, def.description)],
            unlocked: false,
            unlocked_at: None,
        }
    }

    /// True if any requirement tracks this metric
    pub fn tracks(&self, metric: MetricType) -> bool {
        self.requirements.iter().any(|r| r.metric == metric)
    }

    /// Progress percentage (0.0 - 1.0), averaged over requirements
    pub fn progress(&self) -> f32 {
        if self.unlocked || self.requirements.is_empty() {
            return 1.0;
        }
        let sum: f32 = self.requirements.iter().map(Requirement::progress).sum();
        sum / self.requirements.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ids_unique() {
        let mut ids: Vec<_> = ItemDefinition::all().map(|d| d.id).collect();
        ids.sort();
        let count = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), count, "Catalog ids should be unique across kinds");
    }

    #[test]
    fn test_kinds_match_tables() {
        assert!(ACHIEVEMENTS.iter().all(|d| d.kind == ItemKind::Achievement));
        assert!(BADGES.iter().all(|d| d.kind == ItemKind::Badge));
        assert_eq!(ItemDefinition::total_count(ItemKind::Achievement), ACHIEVEMENTS.len());
        assert_eq!(ItemDefinition::total_count(ItemKind::Badge), BADGES.len());
    }

    #[test]
    fn test_total_xp_per_kind() {
        assert_eq!(ItemDefinition::total_xp(ItemKind::Achievement), 2955);
        assert_eq!(ItemDefinition::total_xp(ItemKind::Badge), 950);
    }

    #[test]
    fn test_first_steps_definition() {
        let def = ItemDefinition::get("first_steps").unwrap();
        assert_eq!(def.xp_reward, 50);
        assert_eq!(def.metric, MetricType::Lessons);
        assert_eq!(def.target, 1.0);
    }

    #[test]
    fn test_streak_7_has_achievement_and_badge() {
        let streak_7: Vec<_> = ItemDefinition::all()
            .filter(|d| d.metric == MetricType::Streak && d.target == 7.0)
            .map(|d| d.kind)
            .collect();
        assert!(streak_7.contains(&ItemKind::Achievement));
        assert!(streak_7.contains(&ItemKind::Badge));
    }

    #[test]
    fn test_locked_item_has_one_requirement() {
        let item = CatalogItem::locked(&BADGES[0]);
        assert!(!item.unlocked);
        assert!(item.unlocked_at.is_none());
        assert_eq!(item.requirements.len(), 1);
        assert_eq!(item.progress(), 0.0);
    }
}
