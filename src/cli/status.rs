//! Status and reset command implementations

use anyhow::{bail, Result};

use lingo_progress::progress::{title_for, ItemDefinition, ItemKind};
use lingo_progress::store::ProgressStore;

use super::Context;

/// Show the ledger and level progress
pub fn status_command(ctx: &Context) -> Result<()> {
    let (config, engine) = ctx.open_engine()?;
    let ledger = engine.ledger();
    let progress = engine.level_progress();

    println!("Learner {}\n", config.profile.user_id);
    println!(
        "  Level {} - {} ({}/{} XP, {:.0}%)",
        progress.level,
        title_for(progress.level),
        progress.xp_into_level,
        progress.xp_for_next,
        progress.fraction() * 100.0
    );
    println!("  Total XP:           {}", ledger.current_xp);
    println!("  Coins:              {}", ledger.coins);
    println!("  Gems:               {}", ledger.gems);
    println!("  Streak:             {} days", ledger.streak);
    println!("  Streak protection:  {}", ledger.streak_protection_items);
    println!("  Lessons completed:  {}", ledger.lessons_completed);
    println!("  Characters:         {}", ledger.mastered_character_count);
    println!();

    let store = engine.store();
    for (label, kind, unlocked) in [
        ("Achievements", ItemKind::Achievement, store.unlocked_achievements()?),
        ("Badges", ItemKind::Badge, store.badges()?),
    ] {
        let earned: u64 = unlocked
            .iter()
            .filter_map(|u| ItemDefinition::get(&u.id))
            .map(|d| d.xp_reward)
            .sum();
        println!(
            "  {:<13} {}/{} ({}/{} XP)",
            format!("{}:", label),
            unlocked.len(),
            ItemDefinition::total_count(kind),
            earned,
            ItemDefinition::total_xp(kind)
        );
    }

    Ok(())
}

/// Delete all recorded progress
pub fn reset_command(ctx: &Context, yes: bool) -> Result<()> {
    if !yes {
        bail!("This deletes all XP, unlocks and challenges. Re-run with --yes to confirm.");
    }
    let (_, mut engine) = ctx.load_engine()?;
    engine.reset()?;
    println!("Progress reset.");
    Ok(())
}
