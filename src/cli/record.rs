//! Record and grant-xp command implementations

use anyhow::Result;

use super::Context;

/// Feed one learning event
pub fn record_command(ctx: &Context, metric: &str, value: f64) -> Result<()> {
    let (_, mut engine) = ctx.open_engine()?;
    let events = engine.record(metric, value)?;

    if events.is_empty() {
        println!("Recorded {} = {}. Nothing new unlocked.", metric, value);
    }

    let ledger = engine.ledger();
    println!(
        "Level {} ({} XP) | {} coins | {} gems",
        ledger.level(),
        ledger.current_xp,
        ledger.coins,
        ledger.gems
    );
    Ok(())
}

/// Grant bonus XP
pub fn grant_xp_command(ctx: &Context, amount: i64) -> Result<()> {
    let (_, mut engine) = ctx.open_engine()?;
    engine.grant_xp(amount)?;
    println!(
        "Granted {} XP. Now level {} ({} XP).",
        amount,
        engine.ledger().level(),
        engine.ledger().current_xp
    );
    Ok(())
}
