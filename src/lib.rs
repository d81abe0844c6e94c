//! lingo-progress - progression engine for language learners
//!
//! Tracks experience points, levels, achievements, badges, daily and weekly
//! challenges and the virtual economy (coins, gems, streak protection) of a
//! language-learning app, keeping these counters consistent as learning
//! events stream in.
//!
//! ## Pieces
//!
//! 1. **Engine** ([`progress::ProgressEngine`]): consumes `(metric, value)`
//!    learning events, updates the ledger, unlocks catalog items exactly once,
//!    advances challenges and emits ordered [`progress::ProgressEvent`]s.
//!
//! 2. **Store** ([`store::ProgressStore`]): the persistence boundary, with an
//!    in-memory and a SQLite implementation.

pub mod config;
pub mod error;
pub mod progress;
pub mod store;
pub mod time_bucket;

pub use error::{ProgressError, Result};
