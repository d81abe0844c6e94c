//! In-memory store

use std::collections::HashMap;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use super::{ProgressStore, UnlockedItem};
use crate::progress::{CatalogItem, Challenge, ProgressLedger};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    ledger: ProgressLedger,
    unlocked: Vec<UnlockedItem>,
    progress: HashMap<String, f64>,
    challenges: Vec<Challenge>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing ledger
    pub fn with_ledger(ledger: ProgressLedger) -> Self {
        Self {
            ledger,
            ..Self::default()
        }
    }
}

impl ProgressStore for MemoryStore {
    fn ledger(&self) -> Result<ProgressLedger> {
        Ok(self.ledger.clone())
    }

    fn save_ledger(&mut self, ledger: &ProgressLedger) -> Result<()> {
        self.ledger = ledger.clone();
        Ok(())
    }

    fn unlocked_items(&self) -> Result<Vec<UnlockedItem>> {
        Ok(self.unlocked.clone())
    }

    fn add_unlocked(&mut self, item: &CatalogItem) -> Result<()> {
        if self.unlocked.iter().any(|u| u.id == item.id) {
            return Ok(());
        }
        let Some(unlocked_at) = item.unlocked_at else {
            bail!("Cannot record unlock of {} without a timestamp", item.id);
        };
        self.unlocked.push(UnlockedItem {
            id: item.id.clone(),
            kind: item.kind,
            unlocked_at,
        });
        Ok(())
    }

    fn item_progress(&self) -> Result<HashMap<String, f64>> {
        Ok(self.progress.clone())
    }

    fn save_item_progress(&mut self, id: &str, current: f64) -> Result<()> {
        self.progress.insert(id.to_string(), current);
        Ok(())
    }

    fn challenges(&self) -> Result<Vec<Challenge>> {
        Ok(self.challenges.clone())
    }

    fn add_challenge(&mut self, challenge: &Challenge) -> Result<bool> {
        if self.challenges.iter().any(|c| c.id == challenge.id) {
            return Ok(false);
        }
        self.challenges.push(challenge.clone());
        Ok(true)
    }

    fn update_challenge(&mut self, challenge: &Challenge) -> Result<()> {
        match self.challenges.iter_mut().find(|c| c.id == challenge.id) {
            Some(existing) => {
                *existing = challenge.clone();
                Ok(())
            }
            None => bail!("Unknown challenge: {}", challenge.id),
        }
    }

    fn complete_challenge(&mut self, id: &str, at: DateTime<Utc>) -> Result<()> {
        match self.challenges.iter_mut().find(|c| c.id == id) {
            Some(existing) => {
                if !existing.completed {
                    existing.completed = true;
                    existing.completed_at = Some(at);
                }
                Ok(())
            }
            None => bail!("Unknown challenge: {}", id),
        }
    }

    fn reset(&mut self) -> Result<()> {
        *self = Self::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ItemDefinition, ACHIEVEMENTS, DAILY_CHALLENGES};

    #[test]
    fn test_first_unlock_wins() {
        let mut store = MemoryStore::new();
        let mut item = CatalogItem::locked(&ACHIEVEMENTS[0]);
        let first = Utc::now();
        item.unlocked = true;
        item.unlocked_at = Some(first);
        store.add_unlocked(&item).unwrap();

        item.unlocked_at = Some(first + chrono::Duration::hours(1));
        store.add_unlocked(&item).unwrap();

        let unlocked = store.unlocked_achievements().unwrap();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].unlocked_at, first);
        assert!(store.badges().unwrap().is_empty());
    }

    #[test]
    fn test_unlock_without_timestamp_fails() {
        let mut store = MemoryStore::new();
        let def = ItemDefinition::get("first_steps").unwrap();
        assert!(store.add_unlocked(&CatalogItem::locked(def)).is_err());
    }

    #[test]
    fn test_add_challenge_is_insert_or_ignore() {
        let mut store = MemoryStore::new();
        let challenge = DAILY_CHALLENGES[0].instantiate(Utc::now(), "u");
        assert!(store.add_challenge(&challenge).unwrap());
        assert!(!store.add_challenge(&challenge).unwrap());
        assert_eq!(store.challenges().unwrap().len(), 1);
    }

    #[test]
    fn test_complete_unknown_challenge_fails() {
        let mut store = MemoryStore::new();
        assert!(store.complete_challenge("nope", Utc::now()).is_err());
    }
}
