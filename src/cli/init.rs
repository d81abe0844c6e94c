//! Init command implementation

use anyhow::{bail, Result};

use lingo_progress::config::Config;

use super::Context;

/// Write a fresh configuration file
pub fn init_command(ctx: &Context, force: bool) -> Result<()> {
    let config_path = ctx.config_path();

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    // Keep the learner id when overwriting so progress stays attributed
    let mut config = Config::with_defaults();
    if config_path.exists() {
        if let Ok(existing) = Config::from_file(&config_path) {
            if !existing.profile.user_id.is_empty() {
                config.profile.user_id = existing.profile.user_id;
            }
        }
    }

    config.save_to_file(&config_path)?;
    println!("Created: {}", config_path.display());
    Ok(())
}
