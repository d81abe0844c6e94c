//! Configuration file I/O operations

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Config;

const CONFIG_HEADER: &str = "# lingo-progress configuration\n\
# profile.user_id identifies this learner in challenges; keep it stable.\n\n";

/// Exclusive lock on `<config>.lock`, released when the file is dropped.
/// Creates the config directory if needed.
fn lock_config(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let lock_path = path.with_extension("toml.lock");
    let lock = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
    lock.lock_exclusive().context("Failed to acquire config lock")?;
    Ok(lock)
}

impl Config {
    /// Get the global config directory path (~/.lingo-progress/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lingo-progress")
    }

    /// Get the global config file path (~/.lingo-progress/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Default SQLite database path (~/.lingo-progress/progress.db)
    pub fn default_database_path() -> PathBuf {
        Self::global_config_dir().join("progress.db")
    }

    /// Save configuration atomically while holding the config lock
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let _lock = lock_config(path)?;
        self.write_locked(path)
    }

    /// Load configuration from a path, creating it with defaults if missing.
    ///
    /// The config lock is held from read to write-back, so concurrent first
    /// runs agree on one generated learner id.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        let _lock = lock_config(path)?;

        if !path.exists() {
            let config = Self::with_defaults();
            config.write_locked(path)?;
            tracing::info!("Created {}", path.display());
            return Ok(config);
        }

        let mut config = Self::from_file(path)?;
        if config.ensure_user_id() {
            if let Err(e) = config.write_locked(path) {
                tracing::warn!("Failed to save config after generating learner id: {}", e);
            }
        }
        Ok(config)
    }

    /// Write via temp file + rename. Caller holds the config lock.
    fn write_locked(&self, path: &Path) -> Result<()> {
        let body = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let temp_path = path.with_extension("toml.tmp");
        let mut temp_file = File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
        let contents = format!("{}{}", CONFIG_HEADER, body);
        temp_file
            .write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        temp_file.sync_all().context("Failed to sync config file")?;

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to replace config file: {}", path.display()))?;
        Ok(())
    }

    /// Load global configuration from ~/.lingo-progress/config.toml
    pub fn load() -> Result<Self> {
        Self::load_or_init(&Self::global_config_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_or_init_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let created = Config::load_or_init(&path).unwrap();
        assert!(path.exists());
        assert!(!created.profile.user_id.is_empty());

        let reloaded = Config::load_or_init(&path).unwrap();
        assert_eq!(reloaded.profile.user_id, created.profile.user_id);
    }

    #[test]
    fn test_missing_user_id_is_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[challenges]\ndaily = false\n").unwrap();

        let first = Config::load_or_init(&path).unwrap();
        assert!(!first.challenges.daily);
        let second = Config::from_file(&path).unwrap();
        assert_eq!(second.profile.user_id, first.profile.user_id);
        assert!(!second.challenges.daily);
    }

    #[test]
    fn test_saved_file_has_header_and_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::with_defaults();
        config.challenges.weekly = false;
        config.save_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# lingo-progress configuration"));
        assert!(!dir.path().join("config.toml.tmp").exists());

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.profile.user_id, config.profile.user_id);
        assert!(!loaded.challenges.weekly);
    }
}
