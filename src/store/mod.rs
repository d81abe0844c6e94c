//! Persistence boundary for the progression engine
//!
//! The engine reads and writes all durable state through [`ProgressStore`].
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: in-process maps, for tests and embedding
//! - [`SqliteStore`]: `~/.lingo-progress/progress.db`
//!
//! ```text
//! learning event ──▶ ProgressEngine ──▶ ProgressStore
//!                          │
//!                          └──▶ EventBridge ──▶ UI observers
//! ```

mod db;
mod memory;

pub use db::SqliteStore;
pub use memory::MemoryStore;

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::{CatalogItem, Challenge, ItemKind, ProgressLedger};

/// Persisted unlock record of an achievement or badge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockedItem {
    pub id: String,
    pub kind: ItemKind,
    pub unlocked_at: DateTime<Utc>,
}

/// Durable state consumed by the engine.
///
/// `add_unlocked` and `add_challenge` are insert-or-ignore: the first record
/// for an id wins.
pub trait ProgressStore {
    fn ledger(&self) -> Result<ProgressLedger>;

    fn save_ledger(&mut self, ledger: &ProgressLedger) -> Result<()>;

    /// Every unlocked achievement and badge
    fn unlocked_items(&self) -> Result<Vec<UnlockedItem>>;

    fn add_unlocked(&mut self, item: &CatalogItem) -> Result<()>;

    /// Last observed requirement value per catalog id
    fn item_progress(&self) -> Result<HashMap<String, f64>>;

    fn save_item_progress(&mut self, id: &str, current: f64) -> Result<()>;

    fn challenges(&self) -> Result<Vec<Challenge>>;

    /// Returns false if a challenge with this id already existed
    fn add_challenge(&mut self, challenge: &Challenge) -> Result<bool>;

    /// Persist requirement progress of an existing challenge
    fn update_challenge(&mut self, challenge: &Challenge) -> Result<()>;

    fn complete_challenge(&mut self, id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Wipe all progress
    fn reset(&mut self) -> Result<()>;

    fn unlocked_achievements(&self) -> Result<Vec<UnlockedItem>> {
        self.unlocked_of(ItemKind::Achievement)
    }

    fn badges(&self) -> Result<Vec<UnlockedItem>> {
        self.unlocked_of(ItemKind::Badge)
    }

    fn unlocked_of(&self, kind: ItemKind) -> Result<Vec<UnlockedItem>> {
        Ok(self
            .unlocked_items()?
            .into_iter()
            .filter(|u| u.kind == kind)
            .collect())
    }
}
