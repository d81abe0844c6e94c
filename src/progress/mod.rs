//! Gamification engine: XP, levels, achievements, badges and challenges
//!
//! # Architecture
//!
//! ```text
//! ("lessons", 3) ──▶ ProgressLedger ──▶ unlock pass ──▶ challenge pass
//!                                           │                 │
//!                                      apply_xp ◀─────── grant_rewards
//!                                           │
//!                                      EventBridge ──▶ observers
//! ```
//!
//! Every call runs to completion before returning: ledger, store and
//! observers are all up to date when it does.
//!
//! # Usage
//!
//! ```
//! use lingo_progress::progress::ProgressEngine;
//! use lingo_progress::store::MemoryStore;
//!
//! let mut engine = ProgressEngine::load(MemoryStore::new(), "learner-1").unwrap();
//! let events = engine.record("lessons", 1.0).unwrap();
//! assert_eq!(events.len(), 1);
//! assert_eq!(engine.ledger().current_xp, 50);
//! ```

mod catalog;
mod challenges;
mod events;
mod ledger;
mod levels;
mod requirements;
mod unlock;

pub use catalog::{CatalogItem, ItemDefinition, ItemKind, Rarity, ACHIEVEMENTS, BADGES};
pub use challenges::{
    grant_rewards, pending_instances, Challenge, ChallengeKind, ChallengeStatus,
    ChallengeTemplate, ChallengeUpdate, RequirementTemplate, Reward, RewardType,
    DAILY_CHALLENGES, WEEKLY_CHALLENGES,
};
pub use events::{EventBridge, Notification, NotificationTiming, ProgressEvent, ProgressObserver};
pub use ledger::ProgressLedger;
pub use levels::{
    apply_xp, level_of, title_for, xp_for_level, LevelProgress, LevelReward, LevelUp,
    XP_PER_LEVEL,
};
pub use requirements::{all_completed, evaluate, MetricType, Requirement};
pub use unlock::{check_catalog, merge_catalog, UnlockPass};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{ProgressError, Result};
use crate::store::ProgressStore;

/// The progression engine for one learner
pub struct ProgressEngine<S: ProgressStore> {
    store: S,
    ledger: ProgressLedger,
    user_id: String,
    periodic: Vec<ChallengeKind>,
    bridge: EventBridge,
}

impl<S: ProgressStore> ProgressEngine<S> {
    /// Load the ledger from the store. Daily and weekly challenges are enabled.
    pub fn load(store: S, user_id: impl Into<String>) -> Result<Self> {
        let ledger = store.ledger()?;
        Ok(Self {
            store,
            ledger,
            user_id: user_id.into(),
            periodic: vec![ChallengeKind::Daily, ChallengeKind::Weekly],
            bridge: EventBridge::new(),
        })
    }

    /// Choose which periodic challenge cadences are generated
    pub fn with_periodic_challenges(mut self, kinds: Vec<ChallengeKind>) -> Self {
        self.periodic = kinds;
        self
    }

    /// Register a UI observer; it is called synchronously on every transition
    pub fn subscribe(&mut self, observer: impl ProgressObserver + 'static) {
        self.bridge.subscribe(Box::new(observer));
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress::new(self.ledger.current_xp)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Catalog definitions merged with persisted unlock state and progress
    pub fn catalog(&self) -> Result<Vec<CatalogItem>> {
        let unlocked = self.store.unlocked_items()?;
        let progress = self.store.item_progress()?;
        Ok(merge_catalog(&unlocked, &progress))
    }

    pub fn challenges(&self) -> Result<Vec<Challenge>> {
        Ok(self.store.challenges()?)
    }

    /// Session start: generate this period's challenges, then catch up the
    /// catalog against the ledger.
    pub fn start_session_at(&mut self, now: DateTime<Utc>) -> Result<Vec<ProgressEvent>> {
        self.generate_challenges_at(now)?;
        self.check_ledger_at(now)
    }

    pub fn start_session(&mut self) -> Result<Vec<ProgressEvent>> {
        self.start_session_at(Utc::now())
    }

    /// Instantiate missing periodic challenges for the period containing `now`.
    ///
    /// Returns the challenges that were created; repeated calls in the same
    /// period create nothing.
    pub fn generate_challenges_at(&mut self, now: DateTime<Utc>) -> Result<Vec<Challenge>> {
        let existing = self.store.challenges()?;
        let mut created = Vec::new();
        for challenge in pending_instances(&existing, &self.periodic, now, &self.user_id) {
            if self.store.add_challenge(&challenge)? {
                info!(id = %challenge.id, kind = challenge.kind.as_str(), "Challenge generated");
                created.push(challenge);
            } else {
                debug!(id = %challenge.id, "Challenge already exists, skipping");
            }
        }
        Ok(created)
    }

    /// Register a one-off challenge and join the learner to it.
    ///
    /// Returns false if a challenge with the same id already exists.
    pub fn add_event_challenge(&mut self, mut challenge: Challenge) -> Result<bool> {
        if challenge.start_date > challenge.end_date {
            return Err(ProgressError::invalid(format!(
                "challenge {} ends before it starts",
                challenge.id
            )));
        }
        challenge.participants.insert(self.user_id.clone());
        let added = self.store.add_challenge(&challenge)?;
        if added {
            info!(id = %challenge.id, "Event challenge added");
        }
        Ok(added)
    }

    /// Feed one learning event by metric name.
    ///
    /// Unknown metric names are ignored. Malformed values fail with
    /// [`ProgressError::InvalidInput`] before anything is mutated.
    pub fn record(&mut self, metric: &str, value: f64) -> Result<Vec<ProgressEvent>> {
        self.record_at(metric, value, Utc::now())
    }

    pub fn record_at(
        &mut self,
        metric: &str,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProgressEvent>> {
        if !value.is_finite() || value < 0.0 {
            return Err(ProgressError::invalid(format!(
                "{} value must be a finite non-negative number, got {}",
                metric, value
            )));
        }
        let Some(metric_type) = MetricType::from_str(metric) else {
            debug!(metric, value, "Ignoring unknown metric");
            return Ok(Vec::new());
        };
        self.observe_at(metric_type, value, now)
    }

    /// Feed one typed learning event
    pub fn observe_at(
        &mut self,
        metric: MetricType,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProgressEvent>> {
        metric.validate(value)?;

        let mut ledger = self.ledger.clone();
        ledger.record_observation(metric, value);
        let staged = self.run_passes(ledger, &[(metric, value)], now)?;
        self.apply(staged, now)
    }

    /// Re-evaluate every ledger-backed metric against catalog and challenges.
    ///
    /// Running it again with an unchanged ledger changes nothing.
    pub fn check_ledger_at(&mut self, now: DateTime<Utc>) -> Result<Vec<ProgressEvent>> {
        let observations: Vec<(MetricType, f64)> = MetricType::ledger_backed()
            .iter()
            .filter_map(|m| self.ledger.metric_value(*m).map(|v| (*m, v as f64)))
            .collect();

        let staged = self.run_passes(self.ledger.clone(), &observations, now)?;
        self.apply(staged, now)
    }

    /// Grant bonus XP directly
    pub fn grant_xp(&mut self, amount: i64) -> Result<Vec<ProgressEvent>> {
        let mut ledger = self.ledger.clone();
        let level_ups = apply_xp(&mut ledger, amount)?;
        self.commit(ledger)?;
        Ok(self.publish(level_ups.into_iter().map(ProgressEvent::LevelUp).collect()))
    }

    /// Spend one streak protection item. Returns false if none were left.
    pub fn consume_streak_protection(&mut self) -> Result<bool> {
        let mut ledger = self.ledger.clone();
        let used = ledger.consume_streak_protection();
        if used {
            self.commit(ledger)?;
            info!(left = self.ledger.streak_protection_items, "Streak protection used");
        }
        Ok(used)
    }

    /// Zero the streak after a missed day
    pub fn reset_streak(&mut self) -> Result<()> {
        let mut ledger = self.ledger.clone();
        ledger.reset_streak();
        self.commit(ledger)
    }

    /// Wipe all persisted progress
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset()?;
        self.ledger = self.store.ledger()?;
        Ok(())
    }

    /// Evaluate observations without touching the store or observers.
    ///
    /// Unlock passes run before challenge passes; each unlock or completion
    /// is followed by the level-ups its reward causes.
    fn run_passes(
        &self,
        ledger: ProgressLedger,
        observations: &[(MetricType, f64)],
        now: DateTime<Utc>,
    ) -> Result<Staged> {
        let mut staged = Staged {
            ledger,
            ..Staged::default()
        };

        let mut items = self.catalog()?;
        for (metric, value) in observations {
            let pass = check_catalog(&mut items, *metric, *value, now);
            staged.item_progress.extend(pass.progress);

            for item in pass.unlocked {
                let xp = i64::try_from(item.xp_reward).map_err(|_| {
                    ProgressError::invalid(format!("XP reward of {} too large", item.id))
                })?;
                let level_ups = apply_xp(&mut staged.ledger, xp)?;
                staged.events.push(ProgressEvent::Unlocked(item.clone()));
                staged.events.extend(level_ups.into_iter().map(ProgressEvent::LevelUp));
                staged.unlocked.push(item);
            }
        }

        let mut challenges = self.store.challenges()?;
        let mut touched = Vec::new();
        for (metric, value) in observations {
            for (index, challenge) in challenges.iter_mut().enumerate() {
                if !challenge.tracks(*metric) || !challenge.has_participant(&self.user_id) {
                    continue;
                }
                match challenge.observe(*metric, *value, now) {
                    ChallengeUpdate::Dropped => {
                        if challenge.status(now) == ChallengeStatus::Expired {
                            debug!(id = %challenge.id, %metric, "Dropping progress for expired challenge");
                        }
                    }
                    ChallengeUpdate::Unchanged => {}
                    ChallengeUpdate::Progressed => touched.push(index),
                    ChallengeUpdate::Completed => {
                        touched.push(index);
                        let level_ups = grant_rewards(&mut staged.ledger, &challenge.rewards)?;
                        staged.completed.push(challenge.id.clone());
                        staged.events.push(ProgressEvent::ChallengeCompleted(challenge.clone()));
                        staged.events.extend(level_ups.into_iter().map(ProgressEvent::LevelUp));
                    }
                }
            }
        }

        touched.sort_unstable();
        touched.dedup();
        staged.challenges = touched
            .into_iter()
            .filter_map(|index| challenges.get(index).cloned())
            .collect();

        Ok(staged)
    }

    /// Persist a successful evaluation, then notify observers
    fn apply(&mut self, staged: Staged, now: DateTime<Utc>) -> Result<Vec<ProgressEvent>> {
        for (id, current) in &staged.item_progress {
            self.store.save_item_progress(id, *current)?;
        }
        for item in &staged.unlocked {
            self.store.add_unlocked(item)?;
            info!(id = %item.id, kind = item.kind.as_str(), xp = item.xp_reward, "Unlocked");
        }
        for challenge in &staged.challenges {
            self.store.update_challenge(challenge)?;
        }
        for id in &staged.completed {
            self.store.complete_challenge(id, now)?;
            info!(id = %id, "Challenge completed");
        }
        self.commit(staged.ledger)?;
        Ok(self.publish(staged.events))
    }

    fn publish(&mut self, events: Vec<ProgressEvent>) -> Vec<ProgressEvent> {
        for event in &events {
            if let ProgressEvent::LevelUp(level_up) = event {
                info!(level = level_up.level, title = %level_up.title, "Level up");
            }
        }
        self.bridge.publish(events)
    }

    fn commit(&mut self, ledger: ProgressLedger) -> Result<()> {
        if ledger != self.ledger {
            self.store.save_ledger(&ledger)?;
            self.ledger = ledger;
        }
        Ok(())
    }
}

/// Store writes and events of one call, held back until every pass succeeded
#[derive(Default)]
struct Staged {
    ledger: ProgressLedger,
    item_progress: Vec<(String, f64)>,
    unlocked: Vec<CatalogItem>,
    /// Final state of every challenge that moved
    challenges: Vec<Challenge>,
    completed: Vec<String>,
    events: Vec<ProgressEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn engine() -> ProgressEngine<MemoryStore> {
        ProgressEngine::load(MemoryStore::new(), "learner").unwrap()
    }

    fn morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_first_lesson_end_to_end() {
        let mut engine = engine();
        let events = engine.record_at("lessons", 1.0, morning()).unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            ProgressEvent::Unlocked(item) => {
                assert_eq!(item.id, "first_steps");
                assert_eq!(item.unlocked_at, Some(morning()));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(engine.ledger().current_xp, 50);
        assert_eq!(engine.ledger().level(), 1);
        assert_eq!(engine.ledger().lessons_completed, 1);
    }

    #[test]
    fn test_unknown_metric_is_ignored() {
        let mut engine = engine();
        let events = engine.record_at("vocabulary", 10.0, morning()).unwrap();
        assert!(events.is_empty());
        assert_eq!(engine.ledger(), &ProgressLedger::default());
    }

    #[test]
    fn test_invalid_values_fail_without_mutation() {
        let mut engine = engine();
        for (metric, value) in [
            ("lessons", -1.0),
            ("lessons", 1.5),
            ("accuracy", 140.0),
            ("practice_time", f64::NAN),
            ("vocabulary", -3.0),
        ] {
            let err = engine.record_at(metric, value, morning()).unwrap_err();
            assert!(err.is_invalid_input(), "{} {}", metric, value);
        }
        assert_eq!(engine.ledger(), &ProgressLedger::default());
        assert!(engine.store().unlocked_items().unwrap().is_empty());
    }

    #[test]
    fn test_negative_grant_rejected() {
        let mut engine = engine();
        assert!(engine.grant_xp(-10).unwrap_err().is_invalid_input());
        assert_eq!(engine.ledger().current_xp, 0);
    }

    #[test]
    fn test_unlock_event_precedes_its_level_ups() {
        let mut engine = engine();
        // streak_3 (30) -> 30, week_warrior (150) -> 180, spark (25) -> 205,
        // dedication (75) -> 280
        let events = engine.record_at("streak", 7.0, morning()).unwrap();
        let kinds: Vec<&str> = events.iter().map(|e| e.kind_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "achievement_unlocked",
                "achievement_unlocked",
                "level_up",
                "badge_earned",
                "level_up",
                "badge_earned",
            ]
        );
        assert_eq!(engine.ledger().current_xp, 280);
        assert_eq!(engine.ledger().level(), 3);
    }

    #[test]
    fn test_challenge_completion_grants_rewards() {
        let mut engine = engine().with_periodic_challenges(vec![ChallengeKind::Daily]);
        engine.generate_challenges_at(morning()).unwrap();

        let events = engine
            .record_at("practice_time", 20.0, morning() + Duration::hours(1))
            .unwrap();
        let completed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::ChallengeCompleted(c) => Some(c.id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec!["daily-focus-2026-10-19"]);
        assert_eq!(engine.ledger().current_xp, 50);
        assert_eq!(engine.ledger().coins, 20);

        let stored = engine.challenges().unwrap();
        let focus = stored.iter().find(|c| c.id == "daily-focus-2026-10-19").unwrap();
        assert!(focus.completed);
    }

    #[test]
    fn test_streak_protection_and_reset() {
        let mut engine = ProgressEngine::load(
            MemoryStore::with_ledger(ProgressLedger {
                streak: 4,
                streak_protection_items: 1,
                ..Default::default()
            }),
            "learner",
        )
        .unwrap();

        assert!(engine.consume_streak_protection().unwrap());
        assert!(!engine.consume_streak_protection().unwrap());
        engine.reset_streak().unwrap();
        assert_eq!(engine.store().ledger().unwrap().streak, 0);
    }

    #[test]
    fn test_failed_unlock_leaves_no_trace() {
        let near_max = ProgressLedger {
            current_xp: u64::MAX - 10,
            ..Default::default()
        };
        let mut engine =
            ProgressEngine::load(MemoryStore::with_ledger(near_max.clone()), "learner").unwrap();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&seen);
        engine.subscribe(move |event: &ProgressEvent| sink.borrow_mut().push(event.clone()));

        // first_steps would push XP past u64::MAX
        let err = engine.record_at("lessons", 1.0, morning()).unwrap_err();
        assert!(err.is_invalid_input());

        assert_eq!(engine.ledger(), &near_max);
        assert_eq!(engine.store().ledger().unwrap(), near_max);
        assert!(engine.store().unlocked_items().unwrap().is_empty());
        assert!(engine.store().item_progress().unwrap().is_empty());
        assert!(seen.borrow().is_empty());

        // Nothing from the failed call leaks into the next one
        let events = engine.record_at("practice_time", 1.0, morning()).unwrap();
        assert!(events.is_empty());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_huge_grant_rejected() {
        let mut engine = engine();
        assert!(engine.grant_xp(i64::MAX).unwrap_err().is_invalid_input());
        assert_eq!(engine.ledger(), &ProgressLedger::default());
    }
}
