//! CLI command implementations

pub mod achievements;
pub mod challenges;
pub mod init;
pub mod record;
pub mod status;

use std::path::PathBuf;

use anyhow::Result;

use lingo_progress::config::Config;
use lingo_progress::progress::{ProgressEngine, ProgressEvent};
use lingo_progress::store::SqliteStore;

/// Paths resolved from global CLI flags
pub struct Context {
    config_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>, db_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            db_path,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(Config::global_config_path)
    }

    pub fn load_config(&self) -> Result<Config> {
        Config::load_or_init(&self.config_path())
    }

    /// Open the store and load the engine without starting a session
    pub fn load_engine(&self) -> Result<(Config, ProgressEngine<SqliteStore>)> {
        let config = self.load_config()?;
        let db_path = self.db_path.clone().unwrap_or_else(|| config.database_path());
        let store = SqliteStore::open(&db_path)?;

        let engine = ProgressEngine::load(store, config.profile.user_id.clone())?
            .with_periodic_challenges(config.challenges.enabled_kinds());
        Ok((config, engine))
    }

    /// Load the engine, print notifications as they happen and start a session
    pub fn open_engine(&self) -> Result<(Config, ProgressEngine<SqliteStore>)> {
        let (config, mut engine) = self.load_engine()?;

        let timing = config.notifications.clone();
        engine.subscribe(move |event: &ProgressEvent| {
            let toast = event.notification(&timing);
            println!("{} {}", toast.icon, toast.title);
            if !toast.message.is_empty() {
                println!("   {}", toast.message);
            }
        });

        engine.start_session()?;
        Ok((config, engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn context(dir: &tempfile::TempDir) -> Context {
        Context::new(
            Some(dir.path().join("config.toml")),
            Some(dir.path().join("progress.db")),
        )
    }

    #[test]
    fn test_load_engine_skips_session() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir);

        let (_, engine) = ctx.load_engine().unwrap();
        assert!(engine.challenges().unwrap().is_empty());

        let (_, engine) = ctx.open_engine().unwrap();
        assert_eq!(engine.challenges().unwrap().len(), 4);
    }

    #[test]
    fn test_reset_leaves_empty_database() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir);
        record::record_command(&ctx, "lessons", 1.0).unwrap();

        assert!(status::reset_command(&ctx, false).is_err());
        status::reset_command(&ctx, true).unwrap();

        let (_, engine) = ctx.load_engine().unwrap();
        assert_eq!(engine.ledger().current_xp, 0);
        assert!(engine.challenges().unwrap().is_empty());
        assert!(engine.catalog().unwrap().iter().all(|i| !i.unlocked));
    }
}
