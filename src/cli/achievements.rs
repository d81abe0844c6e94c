//! Achievements command implementation

use anyhow::Result;

use lingo_progress::progress::ItemKind;

use super::Context;

/// List achievements or badges with their unlock state
pub fn achievements_command(ctx: &Context, badges: bool, locked_only: bool) -> Result<()> {
    let (_, engine) = ctx.open_engine()?;
    let kind = if badges {
        ItemKind::Badge
    } else {
        ItemKind::Achievement
    };

    let items: Vec<_> = engine
        .catalog()?
        .into_iter()
        .filter(|item| item.kind == kind)
        .filter(|item| !locked_only || !item.unlocked)
        .collect();

    if items.is_empty() {
        println!("Nothing to show.");
        return Ok(());
    }

    for item in items {
        let state = match item.unlocked_at {
            Some(at) => format!("unlocked {}", at.format("%Y-%m-%d")),
            None => format!("{:.0}%", item.progress() * 100.0),
        };
        println!(
            "  {} {:<22} [{:<9}] +{:<5} XP  {}",
            item.icon,
            item.name,
            item.rarity.label(),
            item.xp_reward,
            state
        );
        println!("     {}", item.description);
    }

    Ok(())
}
