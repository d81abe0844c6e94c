//! Configuration loading and management

mod io;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::progress::{ChallengeKind, NotificationTiming};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Learner identity
    #[serde(default)]
    pub profile: ProfileSettings,

    /// Where progress is stored
    #[serde(default)]
    pub storage: StorageSettings,

    /// Periodic challenge generation
    #[serde(default)]
    pub challenges: ChallengeSettings,

    /// Auto-dismiss hints for notifications
    #[serde(default)]
    pub notifications: NotificationTiming,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Stable local learner id, generated on first load
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite database path (defaults to ~/.lingo-progress/progress.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeSettings {
    #[serde(default = "default_true")]
    pub daily: bool,

    #[serde(default = "default_true")]
    pub weekly: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ChallengeSettings {
    fn default() -> Self {
        Self {
            daily: true,
            weekly: true,
        }
    }
}

impl ChallengeSettings {
    /// Cadences to generate on session start
    pub fn enabled_kinds(&self) -> Vec<ChallengeKind> {
        let mut kinds = Vec::new();
        if self.daily {
            kinds.push(ChallengeKind::Daily);
        }
        if self.weekly {
            kinds.push(ChallengeKind::Weekly);
        }
        kinds
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Create a config with a fresh learner id
    pub fn with_defaults() -> Self {
        let mut config = Self::default();
        config.ensure_user_id();
        config
    }

    /// Fill in a learner id if none is set. Returns true if one was generated.
    pub fn ensure_user_id(&mut self) -> bool {
        if !self.profile.user_id.trim().is_empty() {
            return false;
        }
        self.profile.user_id = uuid::Uuid::new_v4().to_string();
        true
    }

    /// Database path, honouring `[storage] database`
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database
            .clone()
            .unwrap_or_else(Self::default_database_path)
    }
}
