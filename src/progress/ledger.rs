//! Progress ledger
//!
//! The learner's cumulative counters and virtual-currency balances.

use serde::{Deserialize, Serialize};

use super::requirements::MetricType;
use crate::error::{ProgressError, Result};

/// Mutable record of a learner's progress.
///
/// All counters only grow, except `streak_protection_items` (consumable) and
/// `streak` (reset by the caller after a missed day).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLedger {
    pub current_xp: u64,
    pub coins: u64,
    pub gems: u64,
    pub streak_protection_items: u64,
    pub streak: u64,
    pub lessons_completed: u64,
    pub mastered_character_count: u64,
}

impl ProgressLedger {
    /// Current level derived from XP
    pub fn level(&self) -> u64 {
        super::levels::level_of(self.current_xp)
    }

    /// Ledger counter backing a metric, if there is one.
    ///
    /// `accuracy` and `practice_time` are per-session observations and have
    /// no cumulative counter.
    pub fn metric_value(&self, metric: MetricType) -> Option<u64> {
        match metric {
            MetricType::Lessons => Some(self.lessons_completed),
            MetricType::Streak => Some(self.streak),
            MetricType::Characters => Some(self.mastered_character_count),
            MetricType::Accuracy | MetricType::PracticeTime => None,
        }
    }

    /// Fold an already-validated observation into the matching counter.
    pub(crate) fn record_observation(&mut self, metric: MetricType, value: f64) {
        // Count metrics are validated as whole numbers before they get here.
        let count = value as u64;
        match metric {
            MetricType::Lessons => {
                self.lessons_completed = self.lessons_completed.max(count);
            }
            MetricType::Characters => {
                self.mastered_character_count = self.mastered_character_count.max(count);
            }
            MetricType::Streak => self.streak = count,
            MetricType::Accuracy | MetricType::PracticeTime => {}
        }
    }

    pub(crate) fn add_coins(&mut self, amount: u64) -> Result<()> {
        self.coins = checked_add(self.coins, amount, "coins")?;
        Ok(())
    }

    pub(crate) fn add_gems(&mut self, amount: u64) -> Result<()> {
        self.gems = checked_add(self.gems, amount, "gems")?;
        Ok(())
    }

    pub(crate) fn add_streak_protection(&mut self, amount: u64) -> Result<()> {
        self.streak_protection_items =
            checked_add(self.streak_protection_items, amount, "streak protection")?;
        Ok(())
    }

    /// Use one streak protection item. Returns false if none are left.
    pub fn consume_streak_protection(&mut self) -> bool {
        if self.streak_protection_items == 0 {
            return false;
        }
        self.streak_protection_items -= 1;
        true
    }

    pub fn reset_streak(&mut self) {
        self.streak = 0;
    }
}

pub(crate) fn checked_add(current: u64, amount: u64, what: &str) -> Result<u64> {
    current
        .checked_add(amount)
        .ok_or_else(|| ProgressError::invalid(format!("{} counter would overflow", what)))
}
