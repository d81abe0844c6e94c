//! XP and Level system
//!
//! Levels are a pure function of cumulative XP: every 100 XP is one level.
//! Crossing a level pays out coins, gems and a streak protection item.

use serde::Serialize;

use super::ledger::{checked_add, ProgressLedger};
use crate::error::{ProgressError, Result};

/// XP needed per level
pub const XP_PER_LEVEL: u64 = 100;

/// Most levels a single grant may cross (100,000 XP from a level boundary)
pub const MAX_LEVELS_PER_GRANT: u64 = 1_000;

/// Level for a cumulative XP total: `floor(xp / 100) + 1`
pub fn level_of(xp: u64) -> u64 {
    xp / XP_PER_LEVEL + 1
}

/// XP at which a level starts
pub fn xp_for_level(level: u64) -> u64 {
    level.saturating_sub(1).saturating_mul(XP_PER_LEVEL)
}

/// Rank shown next to the level number
pub fn title_for(level: u64) -> &'static str {
    match level {
        0..=2 => "Beginner",
        3..=5 => "Learner",
        6..=9 => "Conversationalist",
        10..=14 => "Storyteller",
        15..=19 => "Scholar",
        20..=29 => "Linguist",
        _ => "Polyglot",
    }
}

/// Payout for reaching a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelReward {
    pub coins: u64,
    pub gems: u64,
    pub streak_protection: u64,
}

impl LevelReward {
    pub fn for_level(level: u64) -> Self {
        Self {
            coins: level.saturating_mul(50),
            gems: level.saturating_mul(5),
            streak_protection: 1,
        }
    }

    /// Combined payout for every level in `from + 1 ..= to`
    pub fn for_levels(from: u64, to: u64) -> Result<Self> {
        let crossed = to.saturating_sub(from);
        // Sum of an arithmetic series: crossed * (first + last) / 2
        let level_sum = u128::from(crossed)
            .checked_mul(u128::from(from) + u128::from(to) + 1)
            .map(|doubled| doubled / 2);

        let scaled = |per_level: u128, what: &str| {
            level_sum
                .and_then(|sum| sum.checked_mul(per_level))
                .and_then(|total| u64::try_from(total).ok())
                .ok_or_else(|| ProgressError::invalid(format!("{} payout would overflow", what)))
        };

        Ok(Self {
            coins: scaled(50, "coins")?,
            gems: scaled(5, "gems")?,
            streak_protection: crossed,
        })
    }
}

/// A single level crossed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    pub level: u64,
    pub title: String,
    pub reward: LevelReward,
}

/// Add XP to the ledger and pay out every level crossed.
///
/// Returns one [`LevelUp`] per level crossed, in ascending order. Negative
/// amounts, grants crossing more than [`MAX_LEVELS_PER_GRANT`] levels and
/// counter overflows are rejected and leave the ledger untouched.
pub fn apply_xp(ledger: &mut ProgressLedger, amount: i64) -> Result<Vec<LevelUp>> {
    let amount = u64::try_from(amount)
        .map_err(|_| ProgressError::invalid(format!("XP amount must be non-negative, got {}", amount)))?;

    let new_xp = checked_add(ledger.current_xp, amount, "XP")?;
    let level_before = level_of(ledger.current_xp);
    let level_after = level_of(new_xp);

    let crossed = level_after - level_before;
    if crossed > MAX_LEVELS_PER_GRANT {
        return Err(ProgressError::invalid(format!(
            "grant of {} XP crosses {} levels, at most {} allowed",
            amount, crossed, MAX_LEVELS_PER_GRANT
        )));
    }

    let payout = LevelReward::for_levels(level_before, level_after)?;
    let mut staged = ledger.clone();
    staged.current_xp = new_xp;
    staged.add_coins(payout.coins)?;
    staged.add_gems(payout.gems)?;
    staged.add_streak_protection(payout.streak_protection)?;
    *ledger = staged;

    Ok((level_before + 1..=level_after)
        .map(|level| LevelUp {
            level,
            title: title_for(level).to_string(),
            reward: LevelReward::for_level(level),
        })
        .collect())
}

/// Where the learner stands inside the current level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: u64,
    pub xp_into_level: u64,
    pub xp_for_next: u64,
}

impl LevelProgress {
    pub fn new(total_xp: u64) -> Self {
        let level = level_of(total_xp);
        Self {
            level,
            xp_into_level: total_xp - xp_for_level(level),
            xp_for_next: XP_PER_LEVEL,
        }
    }

    /// Calculate progress percentage to next level (0.0 - 1.0)
    pub fn fraction(&self) -> f32 {
        self.xp_into_level as f32 / self.xp_for_next as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_xp() {
        assert_eq!(level_of(0), 1);
        assert_eq!(level_of(50), 1);
        assert_eq!(level_of(99), 1);
        assert_eq!(level_of(100), 2);
        assert_eq!(level_of(345), 4);
        assert_eq!(level_of(10_000), 101);
    }

    #[test]
    fn test_level_is_monotonic() {
        let mut previous = level_of(0);
        for xp in 0..5_000 {
            let level = level_of(xp);
            assert_eq!(level, xp / 100 + 1);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn test_level_for_huge_xp() {
        assert_eq!(level_of(500_000_000_000), 5_000_000_001);
        assert_eq!(level_of(u64::MAX), u64::MAX / 100 + 1);
        assert!(level_of(u64::MAX) > level_of(u64::MAX - 100));

        let progress = LevelProgress::new(u64::MAX);
        assert_eq!(progress.xp_into_level, u64::MAX % 100);
    }

    #[test]
    fn test_multi_level_grant() {
        let mut ledger = ProgressLedger {
            current_xp: 95,
            ..Default::default()
        };
        let level_ups = apply_xp(&mut ledger, 250).unwrap();

        assert_eq!(ledger.current_xp, 345);
        assert_eq!(ledger.level(), 4);
        let levels: Vec<u64> = level_ups.iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![2, 3, 4]);

        // 100 + 150 + 200 coins, 10 + 15 + 20 gems, one item per level
        assert_eq!(ledger.coins, 450);
        assert_eq!(ledger.gems, 45);
        assert_eq!(ledger.streak_protection_items, 3);
    }

    #[test]
    fn test_grant_within_level_pays_nothing() {
        let mut ledger = ProgressLedger::default();
        let level_ups = apply_xp(&mut ledger, 50).unwrap();
        assert!(level_ups.is_empty());
        assert_eq!(ledger.current_xp, 50);
        assert_eq!(ledger.coins, 0);
    }

    #[test]
    fn test_negative_xp_rejected_without_mutation() {
        let mut ledger = ProgressLedger {
            current_xp: 120,
            ..Default::default()
        };
        let err = apply_xp(&mut ledger, -5).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(ledger.current_xp, 120);
    }

    #[test]
    fn test_level_progress() {
        let progress = LevelProgress::new(175);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.xp_into_level, 75);
        assert!((progress.fraction() - 0.75).abs() < 0.01);
    }

    #[test]
    fn test_payout_matches_per_level_rewards() {
        let combined = LevelReward::for_levels(1, 4).unwrap();
        let coins: u64 = (2..=4).map(|l| LevelReward::for_level(l).coins).sum();
        let gems: u64 = (2..=4).map(|l| LevelReward::for_level(l).gems).sum();
        assert_eq!(combined.coins, coins);
        assert_eq!(combined.gems, gems);
        assert_eq!(combined.streak_protection, 3);

        assert_eq!(LevelReward::for_levels(7, 7).unwrap().coins, 0);
        assert!(LevelReward::for_levels(0, u64::MAX).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_grant_at_level_cap() {
        let mut ledger = ProgressLedger::default();
        let level_ups = apply_xp(&mut ledger, 100_000).unwrap();

        assert_eq!(level_ups.len(), 1_000);
        assert_eq!(ledger.level(), 1_001);
        // 50 * (2 + 3 + ... + 1001)
        assert_eq!(ledger.coins, 25_075_000);
        assert_eq!(ledger.gems, 2_507_500);
        assert_eq!(ledger.streak_protection_items, 1_000);
    }

    #[test]
    fn test_huge_grant_rejected_without_mutation() {
        let mut ledger = ProgressLedger {
            current_xp: 40,
            ..Default::default()
        };
        for amount in [100_100, i64::MAX] {
            let err = apply_xp(&mut ledger, amount).unwrap_err();
            assert!(err.is_invalid_input(), "{}", amount);
        }
        assert_eq!(ledger.current_xp, 40);
        assert_eq!(ledger.coins, 0);
    }
}
