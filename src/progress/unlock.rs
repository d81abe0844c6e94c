//! Achievement and badge unlocking
//!
//! Rebuilds the catalog from static definitions merged with persisted state,
//! then runs the `LOCKED -> UNLOCKED` state machine for one observation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::catalog::{CatalogItem, ItemDefinition};
use super::requirements::{all_completed, evaluate, MetricType};
use crate::store::UnlockedItem;

/// Rebuild every catalog item with its persisted unlock state and progress.
///
/// Unlocked items keep their original `unlocked_at`; locked items are seeded
/// with the last observed value so progress survives a reload.
pub fn merge_catalog(unlocked: &[UnlockedItem], progress: &HashMap<String, f64>) -> Vec<CatalogItem> {
    ItemDefinition::all()
        .map(|def| {
            let mut item = CatalogItem::locked(def);
            let record = unlocked.iter().find(|u| u.id == item.id);
            for requirement in &mut item.requirements {
                let current = match (progress.get(&item.id), record) {
                    (Some(current), _) => *current,
                    (None, Some(_)) => requirement.target,
                    (None, None) => continue,
                };
                *requirement = requirement.clone().with_current(current);
            }
            if let Some(record) = record {
                item.unlocked = true;
                item.unlocked_at = Some(record.unlocked_at);
                for requirement in &mut item.requirements {
                    requirement.completed = true;
                }
            }
            item
        })
        .collect()
}

/// Result of evaluating one observation against the catalog
#[derive(Debug, Default)]
pub struct UnlockPass {
    /// Items that transitioned to unlocked, in catalog order
    pub unlocked: Vec<CatalogItem>,
    /// Last observed value of each item that was evaluated
    pub progress: Vec<(String, f64)>,
}

/// Evaluate one observation against every locked item tracking `metric`.
///
/// Items already unlocked are skipped before evaluation, so repeating an
/// observation never unlocks anything twice.
pub fn check_catalog(
    items: &mut [CatalogItem],
    metric: MetricType,
    value: f64,
    now: DateTime<Utc>,
) -> UnlockPass {
    let mut pass = UnlockPass::default();

    for item in items.iter_mut() {
        if item.unlocked || !item.tracks(metric) {
            continue;
        }

        item.requirements = item
            .requirements
            .iter()
            .map(|r| evaluate(r, metric, value))
            .collect();
        pass.progress.push((item.id.clone(), value));

        if all_completed(&item.requirements) {
            item.unlocked = true;
            item.unlocked_at = Some(now);
            pass.unlocked.push(item.clone());
        }
    }

    pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::catalog::ItemKind;

    fn catalog() -> Vec<CatalogItem> {
        merge_catalog(&[], &HashMap::new())
    }

    #[test]
    fn test_fresh_catalog_is_locked() {
        let items = catalog();
        assert_eq!(items.len(), ItemDefinition::all().count());
        assert!(items.iter().all(|i| !i.unlocked));
    }

    #[test]
    fn test_single_observation_unlocks_across_kinds() {
        let mut items = catalog();
        let pass = check_catalog(&mut items, MetricType::Streak, 7.0, Utc::now());

        let ids: Vec<&str> = pass.unlocked.iter().map(|i| i.id.as_str()).collect();
        assert!(ids.contains(&"week_warrior"));
        assert!(ids.contains(&"badge_dedication"));
        // Lower tiers on the same metric come along
        assert!(ids.contains(&"streak_3"));
        assert!(ids.contains(&"badge_spark"));
        assert!(!ids.contains(&"month_master"));
        assert!(pass.unlocked.iter().any(|i| i.kind == ItemKind::Badge));
    }

    #[test]
    fn test_repeat_observation_unlocks_nothing() {
        let mut items = catalog();
        let now = Utc::now();
        let first = check_catalog(&mut items, MetricType::Lessons, 10.0, now);
        assert_eq!(first.unlocked.len(), 2);

        let second = check_catalog(&mut items, MetricType::Lessons, 10.0, now);
        assert!(second.unlocked.is_empty());
    }

    #[test]
    fn test_unlocked_item_is_frozen() {
        let mut items = catalog();
        let now = Utc::now();
        check_catalog(&mut items, MetricType::Accuracy, 92.0, now);
        check_catalog(&mut items, MetricType::Accuracy, 40.0, now);

        let sharp = items.iter().find(|i| i.id == "sharp_mind").unwrap();
        assert!(sharp.unlocked);
        assert_eq!(sharp.requirements[0].current, 92.0);
        assert!(sharp.requirements[0].completed);

        // Still-locked item follows the last observation
        let perfect = items.iter().find(|i| i.id == "perfectionist").unwrap();
        assert_eq!(perfect.requirements[0].current, 40.0);
    }

    #[test]
    fn test_merge_restores_state() {
        let at = Utc::now();
        let unlocked = vec![UnlockedItem {
            id: "first_steps".to_string(),
            kind: ItemKind::Achievement,
            unlocked_at: at,
        }];
        let progress = HashMap::from([("dedicated_learner".to_string(), 4.0)]);
        let items = merge_catalog(&unlocked, &progress);

        let first = items.iter().find(|i| i.id == "first_steps").unwrap();
        assert!(first.unlocked);
        assert_eq!(first.unlocked_at, Some(at));

        let ten = items.iter().find(|i| i.id == "dedicated_learner").unwrap();
        assert!(!ten.unlocked);
        assert_eq!(ten.requirements[0].current, 4.0);
        assert!((ten.progress() - 0.4).abs() < 0.001);
    }
}
