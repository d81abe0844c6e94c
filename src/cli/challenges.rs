//! Challenges command implementation

use anyhow::Result;
use chrono::Utc;

use lingo_progress::progress::ChallengeStatus;

use super::Context;

/// List current (or all) challenges
pub fn challenges_command(ctx: &Context, all: bool) -> Result<()> {
    let (_, engine) = ctx.open_engine()?;
    let now = Utc::now();

    let challenges: Vec<_> = engine
        .challenges()?
        .into_iter()
        .filter(|c| all || c.status(now) == ChallengeStatus::Active)
        .collect();

    if challenges.is_empty() {
        println!("No challenges found.");
        return Ok(());
    }

    println!("Challenges ({}):\n", challenges.len());

    for challenge in challenges {
        println!(
            "  {} [{} / {}] {:.0}%",
            challenge.title,
            challenge.kind.as_str(),
            challenge.status(now).label(),
            challenge.progress() * 100.0
        );
        println!("    {}", challenge.description);
        for requirement in &challenge.requirements {
            println!(
                "    - {}: {}/{}",
                requirement.description, requirement.current, requirement.target
            );
        }
        let rewards: Vec<_> = challenge.rewards.iter().map(|r| r.description.as_str()).collect();
        println!("    Rewards: {}", rewards.join(", "));
        println!("    Ends: {}", challenge.end_date.format("%Y-%m-%d %H:%M UTC"));
        println!();
    }

    Ok(())
}
