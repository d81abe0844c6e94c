//! Persistence tests: progress written by one engine is seen by the next.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use lingo_progress::progress::{ChallengeKind, ProgressEngine};
use lingo_progress::store::{ProgressStore, SqliteStore};

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
}

fn open(dir: &TempDir) -> ProgressEngine<SqliteStore> {
    let store = SqliteStore::open(&dir.path().join("progress.db")).unwrap();
    ProgressEngine::load(store, "learner-1").unwrap()
}

#[test]
fn test_unlocks_and_progress_survive_reload() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = open(&dir);
        engine.record_at("lessons", 1.0, morning()).unwrap();
        engine.record_at("accuracy", 50.0, morning()).unwrap();
    }

    let mut engine = open(&dir);
    assert_eq!(engine.ledger().current_xp, 50);
    assert_eq!(engine.ledger().lessons_completed, 1);

    let catalog = engine.catalog().unwrap();
    let first_steps = catalog.iter().find(|i| i.id == "first_steps").unwrap();
    assert!(first_steps.unlocked);
    assert_eq!(first_steps.unlocked_at, Some(morning()));

    let sharp_mind = catalog.iter().find(|i| i.id == "sharp_mind").unwrap();
    assert!(!sharp_mind.unlocked);
    assert_eq!(sharp_mind.requirements[0].current, 50.0);

    // Already unlocked in the previous session
    let events = engine.record_at("lessons", 1.0, morning()).unwrap();
    assert!(events.is_empty());
    assert_eq!(engine.ledger().current_xp, 50);
}

#[test]
fn test_generated_challenges_survive_reload() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = open(&dir).with_periodic_challenges(vec![ChallengeKind::Daily]);
        assert_eq!(engine.generate_challenges_at(morning()).unwrap().len(), 2);
        engine
            .record_at("practice_time", 5.0, morning() + Duration::minutes(10))
            .unwrap();
    }

    let mut engine = open(&dir).with_periodic_challenges(vec![ChallengeKind::Daily]);
    assert!(engine
        .generate_challenges_at(morning() + Duration::hours(1))
        .unwrap()
        .is_empty());

    let focus = engine
        .challenges()
        .unwrap()
        .into_iter()
        .find(|c| c.id == "daily-focus-2026-10-19")
        .unwrap();
    assert_eq!(focus.requirements[0].current, 5.0);
    assert!(focus.has_participant("learner-1"));

    // Finish it in the second session
    let events = engine
        .record_at("practice_time", 15.0, morning() + Duration::hours(2))
        .unwrap();
    assert_eq!(
        events.iter().map(|e| e.kind_str()).collect::<Vec<_>>(),
        vec!["challenge_completed"]
    );

    let reopened = open(&dir);
    let focus = reopened
        .challenges()
        .unwrap()
        .into_iter()
        .find(|c| c.id == "daily-focus-2026-10-19")
        .unwrap();
    assert!(focus.completed);
    assert_eq!(focus.completed_at, Some(morning() + Duration::hours(2)));
    assert_eq!(reopened.ledger().coins, 20);
}

#[test]
fn test_reset_clears_database() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);
    engine.start_session_at(morning()).unwrap();
    engine.record_at("streak", 3.0, morning()).unwrap();
    assert!(!engine.store().unlocked_items().unwrap().is_empty());

    engine.reset().unwrap();

    let reopened = open(&dir);
    assert_eq!(reopened.ledger().current_xp, 0);
    assert!(reopened.store().unlocked_items().unwrap().is_empty());
    assert!(reopened.challenges().unwrap().is_empty());
    assert!(reopened.store().item_progress().unwrap().is_empty());
}
