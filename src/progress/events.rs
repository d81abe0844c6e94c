//! Outward events and the observer bridge
//!
//! Every state transition produces exactly one [`ProgressEvent`]. The bridge
//! delivers each event to all observers synchronously, in emission order,
//! without filtering or coalescing.

use serde::{Deserialize, Serialize};

use super::catalog::{CatalogItem, ItemKind};
use super::challenges::Challenge;
use super::levels::LevelUp;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    LevelUp(LevelUp),
    Unlocked(CatalogItem),
    ChallengeCompleted(Challenge),
}

impl ProgressEvent {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::LevelUp(_) => "level_up",
            Self::Unlocked(item) => match item.kind {
                ItemKind::Achievement => "achievement_unlocked",
                ItemKind::Badge => "badge_earned",
            },
            Self::ChallengeCompleted(_) => "challenge_completed",
        }
    }

    /// Render the transient toast the UI shows for this event
    pub fn notification(&self, timing: &NotificationTiming) -> Notification {
        match self {
            Self::LevelUp(level_up) => Notification {
                title: format!("Level {}!", level_up.level),
                message: format!(
                    "You are now a {}. +{} coins, +{} gems",
                    level_up.title, level_up.reward.coins, level_up.reward.gems
                ),
                icon: "⭐".to_string(),
                display_secs: timing.level_up_display_secs,
            },
            Self::Unlocked(item) => Notification {
                title: match item.kind {
                    ItemKind::Achievement => format!("Achievement unlocked: {}", item.name),
                    ItemKind::Badge => format!("Badge earned: {}", item.name),
                },
                message: format!(
                    "{} ({}, +{} XP)",
                    item.description,
                    item.rarity.label(),
                    item.xp_reward
                ),
                icon: item.icon.clone(),
                display_secs: timing.display_secs,
            },
            Self::ChallengeCompleted(challenge) => Notification {
                title: format!("Challenge complete: {}", challenge.title),
                message: challenge
                    .rewards
                    .iter()
                    .map(|r| r.description.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                icon: "🏆".to_string(),
                display_secs: timing.display_secs,
            },
        }
    }
}

/// Auto-dismiss hints carried on notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTiming {
    #[serde(default = "default_display_secs")]
    pub display_secs: u64,
    #[serde(default = "default_level_up_display_secs")]
    pub level_up_display_secs: u64,
}

fn default_display_secs() -> u64 {
    4
}

fn default_level_up_display_secs() -> u64 {
    6
}

impl Default for NotificationTiming {
    fn default() -> Self {
        Self {
            display_secs: default_display_secs(),
            level_up_display_secs: default_level_up_display_secs(),
        }
    }
}

/// Toast content for the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub icon: String,
    pub display_secs: u64,
}

/// Receives engine events at the moment of transition.
///
/// Implement the typed callbacks, or override [`on_event`](Self::on_event)
/// to see every event. Closures taking `&ProgressEvent` are observers too.
pub trait ProgressObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::LevelUp(level_up) => self.on_level_up(level_up.level),
            ProgressEvent::Unlocked(item) => match item.kind {
                ItemKind::Achievement => self.on_achievement_unlocked(item),
                ItemKind::Badge => self.on_badge_earned(item),
            },
            ProgressEvent::ChallengeCompleted(challenge) => self.on_challenge_completed(challenge),
        }
    }

    fn on_level_up(&mut self, _level: u64) {}

    fn on_achievement_unlocked(&mut self, _achievement: &CatalogItem) {}

    fn on_badge_earned(&mut self, _badge: &CatalogItem) {}

    fn on_challenge_completed(&mut self, _challenge: &Challenge) {}
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressEvent),
{
    fn on_event(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Ordered fan-out to registered observers
#[derive(Default)]
pub struct EventBridge {
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// Deliver a batch to every observer in order, then hand it back
    pub fn publish(&mut self, events: Vec<ProgressEvent>) -> Vec<ProgressEvent> {
        for event in &events {
            for observer in &mut self.observers {
                observer.on_event(event);
            }
        }
        events
    }
}
