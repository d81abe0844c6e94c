//! Time-boxed challenge system
//!
//! Daily and weekly challenges are instantiated from templates once per
//! calendar period. A challenge accepts progress only inside its
//! `[start_date, end_date]` window; once past `end_date` it is inert.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ledger::ProgressLedger;
use super::levels::{apply_xp, LevelUp};
use super::requirements::{all_completed, evaluate, MetricType, Requirement};
use crate::error::{ProgressError, Result};
use crate::time_bucket::{day_bucket, week_bucket};

/// Challenge cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    Daily,
    Weekly,
    /// One-off challenge registered from outside the template catalog
    Event,
}

impl ChallengeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Event => "event",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "event" => Some(Self::Event),
            _ => None,
        }
    }

    /// Window length for periodic kinds
    pub fn period_length(&self) -> Option<Duration> {
        match self {
            Self::Daily => Some(Duration::hours(24)),
            Self::Weekly => Some(Duration::days(7)),
            Self::Event => None,
        }
    }

    /// Key of the calendar period containing `now`
    pub fn period_key(&self, now: DateTime<Utc>) -> Option<String> {
        match self {
            Self::Daily => Some(day_bucket(now)),
            Self::Weekly => Some(week_bucket(now)),
            Self::Event => None,
        }
    }
}

/// What a completed challenge pays out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    Xp,
    Coins,
    Gems,
    StreakProtection,
}

impl RewardType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Xp => "XP",
            Self::Coins => "coins",
            Self::Gems => "gems",
            Self::StreakProtection => "streak protection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    #[serde(rename = "type")]
    pub kind: RewardType,
    pub value: u64,
    pub description: String,
}

impl Reward {
    pub fn new(kind: RewardType, value: u64) -> Self {
        Self {
            kind,
            value,
            description: format!("+{} {}", value, kind.label()),
        }
    }
}

/// Lifecycle state, derived from dates and the completion flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    /// Window has not opened yet
    Upcoming,
    Active,
    Completed,
    Expired,
}

impl ChallengeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }
}

/// Outcome of feeding one observation to a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeUpdate {
    /// Outside the window, or already completed
    Dropped,
    /// Metric not tracked or nothing moved
    Unchanged,
    Progressed,
    /// Transitioned to completed by this observation
    Completed,
}

/// A challenge instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    pub title: String,
    pub description: String,
    pub requirements: Vec<Requirement>,
    pub rewards: Vec<Reward>,
    pub participants: BTreeSet<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Challenge {
    pub fn status(&self, now: DateTime<Utc>) -> ChallengeStatus {
        if self.completed {
            ChallengeStatus::Completed
        } else if now > self.end_date {
            ChallengeStatus::Expired
        } else if now < self.start_date {
            ChallengeStatus::Upcoming
        } else {
            ChallengeStatus::Active
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == ChallengeStatus::Active
    }

    pub fn tracks(&self, metric: MetricType) -> bool {
        self.requirements.iter().any(|r| r.metric == metric)
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.contains(user_id)
    }

    /// Feed one observation. All requirements must hold for completion.
    pub fn observe(&mut self, metric: MetricType, value: f64, now: DateTime<Utc>) -> ChallengeUpdate {
        if !self.is_active(now) {
            return ChallengeUpdate::Dropped;
        }
        if !self.tracks(metric) {
            return ChallengeUpdate::Unchanged;
        }

        let updated: Vec<Requirement> = self
            .requirements
            .iter()
            .map(|r| evaluate(r, metric, value))
            .collect();
        let changed = updated != self.requirements;
        self.requirements = updated;

        if all_completed(&self.requirements) {
            self.completed = true;
            self.completed_at = Some(now);
            ChallengeUpdate::Completed
        } else if changed {
            ChallengeUpdate::Progressed
        } else {
            ChallengeUpdate::Unchanged
        }
    }

    /// Progress percentage (0.0 - 1.0), averaged over requirements
    pub fn progress(&self) -> f32 {
        if self.completed || self.requirements.is_empty() {
            return 1.0;
        }
        let sum: f32 = self.requirements.iter().map(Requirement::progress).sum();
        sum / self.requirements.len() as f32
    }
}

/// Requirement slot of a template
#[derive(Debug, Clone, Copy)]
pub struct RequirementTemplate {
    pub metric: MetricType,
    pub target: f64,
    pub description: &'static str,
}

/// Periodic challenge blueprint
#[derive(Debug, Clone)]
pub struct ChallengeTemplate {
    pub id: &'static str,
    pub kind: ChallengeKind,
    pub title: &'static str,
    pub description: &'static str,
    pub requirements: &'static [RequirementTemplate],
    pub rewards: &'static [(RewardType, u64)],
}

/// Daily challenge templates
pub static DAILY_CHALLENGES: &[ChallengeTemplate] = &[
    ChallengeTemplate {
        id: "daily-focus",
        kind: ChallengeKind::Daily,
        title: "Focused Practice",
        description: "Practice for 15 minutes today",
        requirements: &[RequirementTemplate {
            metric: MetricType::PracticeTime,
            target: 15.0,
            description: "Practice for 15 minutes",
        }],
        rewards: &[(RewardType::Xp, 50), (RewardType::Coins, 20)],
    },
    ChallengeTemplate {
        id: "daily-accuracy",
        kind: ChallengeKind::Daily,
        title: "Sharp Shooter",
        description: "Finish a session with at least 90% accuracy",
        requirements: &[RequirementTemplate {
            metric: MetricType::Accuracy,
            target: 90.0,
            description: "Reach 90% accuracy",
        }],
        rewards: &[(RewardType::Xp, 30), (RewardType::Gems, 2)],
    },
];

/// Weekly challenge templates
pub static WEEKLY_CHALLENGES: &[ChallengeTemplate] = &[
    ChallengeTemplate {
        id: "weekly-streak",
        kind: ChallengeKind::Weekly,
        title: "Streak Keeper",
        description: "Reach a 7-day practice streak this week",
        requirements: &[RequirementTemplate {
            metric: MetricType::Streak,
            target: 7.0,
            description: "Keep a 7-day streak",
        }],
        rewards: &[(RewardType::Xp, 200), (RewardType::StreakProtection, 1)],
    },
    ChallengeTemplate {
        id: "weekly-marathon",
        kind: ChallengeKind::Weekly,
        title: "Marathon Learner",
        description: "Practice for 120 minutes this week",
        requirements: &[RequirementTemplate {
            metric: MetricType::PracticeTime,
            target: 120.0,
            description: "Practice for 120 minutes",
        }],
        rewards: &[(RewardType::Xp, 150), (RewardType::Coins, 100)],
    },
];

impl ChallengeTemplate {
    /// Templates for a cadence
    pub fn for_kind(kind: ChallengeKind) -> &'static [ChallengeTemplate] {
        match kind {
            ChallengeKind::Daily => DAILY_CHALLENGES,
            ChallengeKind::Weekly => WEEKLY_CHALLENGES,
            ChallengeKind::Event => &[],
        }
    }

    /// Id of the instance for the period containing `now`
    pub fn instance_id(&self, now: DateTime<Utc>) -> String {
        match self.kind.period_key(now) {
            Some(key) => format!("{}-{}", self.id, key),
            None => self.id.to_string(),
        }
    }

    /// Build the instance for the period containing `now`.
    ///
    /// The window runs one full period length from `now`, not to the end of
    /// the calendar period. An instance generated late in the day therefore
    /// overlaps the next day's instance, and an event inside the overlap
    /// counts toward both.
    pub fn instantiate(&self, now: DateTime<Utc>, user_id: &str) -> Challenge {
        let length = self.kind.period_length().unwrap_or_else(|| Duration::hours(24));
        Challenge {
            id: self.instance_id(now),
            kind: self.kind,
            title: self.title.to_string(),
            description: self.description.to_string(),
            requirements: self
                .requirements
                .iter()
                .map(|r| Requirement::new(r.metric, r.target, r.description))
                .collect(),
            rewards: self
                .rewards
                .iter()
                .map(|(kind, value)| Reward::new(*kind, *value))
                .collect(),
            participants: BTreeSet::from([user_id.to_string()]),
            start_date: now,
            end_date: now + length,
            completed: false,
            completed_at: None,
        }
    }
}

/// Challenges missing for the current period.
///
/// A template is skipped when a challenge with its instance id already
/// exists, whatever its state, so calling this twice in one period yields
/// nothing the second time.
pub fn pending_instances(
    existing: &[Challenge],
    kinds: &[ChallengeKind],
    now: DateTime<Utc>,
    user_id: &str,
) -> Vec<Challenge> {
    kinds
        .iter()
        .flat_map(|kind| ChallengeTemplate::for_kind(*kind).iter())
        .filter(|template| {
            let id = template.instance_id(now);
            !existing.iter().any(|c| c.id == id)
        })
        .map(|template| template.instantiate(now, user_id))
        .collect()
}

/// Pay out challenge rewards into the ledger.
///
/// XP goes through the leveling function, so crossing levels also pays out
/// level rewards; the resulting level-ups are returned in order.
pub fn grant_rewards(ledger: &mut ProgressLedger, rewards: &[Reward]) -> Result<Vec<LevelUp>> {
    let mut staged = ledger.clone();
    let mut level_ups = Vec::new();
    for reward in rewards {
        match reward.kind {
            RewardType::Xp => {
                let amount = i64::try_from(reward.value).map_err(|_| {
                    ProgressError::invalid(format!("XP reward too large: {}", reward.value))
                })?;
                level_ups.extend(apply_xp(&mut staged, amount)?);
            }
            RewardType::Coins => staged.add_coins(reward.value)?,
            RewardType::Gems => staged.add_gems(reward.value)?,
            RewardType::StreakProtection => staged.add_streak_protection(reward.value)?,
        }
    }
    *ledger = staged;
    Ok(level_ups)
}
