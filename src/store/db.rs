//! SQLite-backed progress store
//!
//! Manages the `~/.lingo-progress/progress.db` database with automatic
//! schema migration.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{ProgressStore, UnlockedItem};
use crate::progress::{
    CatalogItem, Challenge, ChallengeKind, ItemKind, ProgressLedger, Requirement, Reward,
};
use crate::time_bucket::{from_millis, to_millis};

/// Database wrapper around a shared connection
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open progress db: {}", path.display()))?;

        // Another tab or process may hold the same file; last writer wins
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::from_connection(conn)
    }

    /// Private database that disappears with the store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory progress db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Progress DB lock poisoned"))
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    /// Run any pending migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        // Migration 2: per-item progress for still-locked achievements and badges
        if version < 2 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS item_progress (
                    id TEXT PRIMARY KEY,
                    current REAL NOT NULL DEFAULT 0,
                    updated_at INTEGER
                );
                "#,
            )?;
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        Ok(())
    }

    /// Current schema version
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn()?;
        let version = conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?;
        Ok(version)
    }
}

type ChallengeRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    i64,
    i64,
    bool,
    Option<i64>,
);

fn counter_to_sql(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("Counter too large to store: {}", value))
}

fn counter_from_sql(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("Negative counter in progress db: {}", value))
}

fn timestamp(ms: i64) -> Result<DateTime<Utc>> {
    from_millis(ms).ok_or_else(|| anyhow!("Timestamp out of range: {}", ms))
}

fn challenge_from_row(row: ChallengeRow) -> Result<Challenge> {
    let (id, kind, title, description, requirements, rewards, participants, start, end, completed, completed_at) =
        row;
    let kind = ChallengeKind::from_str(&kind)
        .ok_or_else(|| anyhow!("Unknown challenge type '{}' for {}", kind, id))?;
    let requirements: Vec<Requirement> = serde_json::from_str(&requirements)
        .with_context(|| format!("Corrupt requirements for challenge {}", id))?;
    let rewards: Vec<Reward> = serde_json::from_str(&rewards)
        .with_context(|| format!("Corrupt rewards for challenge {}", id))?;
    let participants = serde_json::from_str(&participants)
        .with_context(|| format!("Corrupt participants for challenge {}", id))?;

    Ok(Challenge {
        id,
        kind,
        title,
        description,
        requirements,
        rewards,
        participants,
        start_date: timestamp(start)?,
        end_date: timestamp(end)?,
        completed,
        completed_at: completed_at.map(timestamp).transpose()?,
    })
}

impl ProgressStore for SqliteStore {
    fn ledger(&self) -> Result<ProgressLedger> {
        let conn = self.conn()?;
        let raw = conn.query_row(
            r#"SELECT current_xp, coins, gems, streak_protection_items, streak,
                      lessons_completed, mastered_character_count
               FROM ledger WHERE id = 1"#,
            [],
            |r| {
                Ok([
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, i64>(3)?,
                    r.get::<_, i64>(4)?,
                    r.get::<_, i64>(5)?,
                    r.get::<_, i64>(6)?,
                ])
            },
        )?;
        let [current_xp, coins, gems, streak_protection_items, streak, lessons, characters] =
            raw.map(counter_from_sql);
        Ok(ProgressLedger {
            current_xp: current_xp?,
            coins: coins?,
            gems: gems?,
            streak_protection_items: streak_protection_items?,
            streak: streak?,
            lessons_completed: lessons?,
            mastered_character_count: characters?,
        })
    }

    fn save_ledger(&mut self, ledger: &ProgressLedger) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"UPDATE ledger SET
                 current_xp = ?1, coins = ?2, gems = ?3, streak_protection_items = ?4,
                 streak = ?5, lessons_completed = ?6, mastered_character_count = ?7,
                 updated_at = ?8
               WHERE id = 1"#,
            params![
                counter_to_sql(ledger.current_xp)?,
                counter_to_sql(ledger.coins)?,
                counter_to_sql(ledger.gems)?,
                counter_to_sql(ledger.streak_protection_items)?,
                counter_to_sql(ledger.streak)?,
                counter_to_sql(ledger.lessons_completed)?,
                counter_to_sql(ledger.mastered_character_count)?,
                to_millis(Utc::now()),
            ],
        )?;
        Ok(())
    }

    fn unlocked_items(&self) -> Result<Vec<UnlockedItem>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, kind, unlocked_at FROM unlocked_items ORDER BY unlocked_at, id")?;
        let rows: Vec<(String, String, i64)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;

        rows.into_iter()
            .map(|(id, kind, unlocked_at)| {
                let kind = ItemKind::from_str(&kind)
                    .ok_or_else(|| anyhow!("Unknown item kind '{}' for {}", kind, id))?;
                Ok(UnlockedItem {
                    id,
                    kind,
                    unlocked_at: timestamp(unlocked_at)?,
                })
            })
            .collect()
    }

    fn add_unlocked(&mut self, item: &CatalogItem) -> Result<()> {
        let Some(unlocked_at) = item.unlocked_at else {
            bail!("Cannot record unlock of {} without a timestamp", item.id);
        };
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO unlocked_items (id, kind, unlocked_at) VALUES (?1, ?2, ?3)",
            params![item.id, item.kind.as_str(), to_millis(unlocked_at)],
        )?;
        Ok(())
    }

    fn item_progress(&self) -> Result<HashMap<String, f64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, current FROM item_progress")?;
        let progress = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, f64>(1)?)))?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(progress)
    }

    fn save_item_progress(&mut self, id: &str, current: f64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT INTO item_progress (id, current, updated_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(id) DO UPDATE SET current = ?2, updated_at = ?3"#,
            params![id, current, to_millis(Utc::now())],
        )?;
        Ok(())
    }

    fn challenges(&self) -> Result<Vec<Challenge>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, kind, title, description, requirements, rewards, participants,
                      start_date, end_date, completed, completed_at
               FROM challenges ORDER BY start_date, id"#,
        )?;
        let rows: Vec<ChallengeRow> = stmt
            .query_map([], |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                    r.get(7)?,
                    r.get(8)?,
                    r.get(9)?,
                    r.get(10)?,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;

        rows.into_iter().map(challenge_from_row).collect()
    }

    fn add_challenge(&mut self, challenge: &Challenge) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"INSERT OR IGNORE INTO challenges
               (id, kind, title, description, requirements, rewards, participants,
                start_date, end_date, completed, completed_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                challenge.id,
                challenge.kind.as_str(),
                challenge.title,
                challenge.description,
                serde_json::to_string(&challenge.requirements)?,
                serde_json::to_string(&challenge.rewards)?,
                serde_json::to_string(&challenge.participants)?,
                to_millis(challenge.start_date),
                to_millis(challenge.end_date),
                challenge.completed,
                challenge.completed_at.map(to_millis),
            ],
        )?;
        Ok(inserted > 0)
    }

    fn update_challenge(&mut self, challenge: &Challenge) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"UPDATE challenges SET requirements = ?2, participants = ?3
               WHERE id = ?1 AND completed = 0"#,
            params![
                challenge.id,
                serde_json::to_string(&challenge.requirements)?,
                serde_json::to_string(&challenge.participants)?,
            ],
        )?;
        if updated == 0 {
            let exists: Option<i64> = conn
                .query_row("SELECT 1 FROM challenges WHERE id = ?1", [&challenge.id], |r| r.get(0))
                .optional()?;
            if exists.is_none() {
                bail!("Unknown challenge: {}", challenge.id);
            }
        }
        Ok(())
    }

    fn complete_challenge(&mut self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"UPDATE challenges SET completed = 1, completed_at = COALESCE(completed_at, ?2)
               WHERE id = ?1"#,
            params![id, to_millis(at)],
        )?;
        if updated == 0 {
            bail!("Unknown challenge: {}", id);
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            DELETE FROM unlocked_items;
            DELETE FROM item_progress;
            DELETE FROM challenges;
            UPDATE ledger SET current_xp = 0, coins = 0, gems = 0, streak_protection_items = 0,
                streak = 0, lessons_completed = 0, mastered_character_count = 0 WHERE id = 1;
            "#,
        )?;
        Ok(())
    }
}

/// SQL schema for the progress database
const SCHEMA_SQL: &str = r#"
-- Ledger (singleton row)
CREATE TABLE IF NOT EXISTS ledger (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    current_xp INTEGER NOT NULL DEFAULT 0,
    coins INTEGER NOT NULL DEFAULT 0,
    gems INTEGER NOT NULL DEFAULT 0,
    streak_protection_items INTEGER NOT NULL DEFAULT 0,
    streak INTEGER NOT NULL DEFAULT 0,
    lessons_completed INTEGER NOT NULL DEFAULT 0,
    mastered_character_count INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER
);
INSERT OR IGNORE INTO ledger (id) VALUES (1);

-- Unlocked achievements and badges
CREATE TABLE IF NOT EXISTS unlocked_items (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    unlocked_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_unlocked_kind ON unlocked_items(kind);

-- Challenge instances (requirements, rewards, participants as JSON)
CREATE TABLE IF NOT EXISTS challenges (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    requirements TEXT NOT NULL,
    rewards TEXT NOT NULL,
    participants TEXT NOT NULL,
    start_date INTEGER NOT NULL,
    end_date INTEGER NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at INTEGER
);
CREATE INDEX IF NOT EXISTS idx_challenge_end ON challenges(end_date);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;
