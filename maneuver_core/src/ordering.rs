//! Pure ordering transforms over a Master Set snapshot.
//!
//! All sorts are stable: equal keys keep their host order.

use maneuver_env::EntitySnapshot;

/// Host order, unchanged.
pub fn default_order(entities: &[EntitySnapshot]) -> Vec<EntitySnapshot> {
    entities.to_vec()
}

/// Ordinal (byte-wise, not locale-aware) ascending by name.
pub fn by_name(entities: &[EntitySnapshot]) -> Vec<EntitySnapshot> {
    let mut sorted = entities.to_vec();
    sorted.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    sorted
}

/// Vessels with a scheduled node only, ascending by node time.
///
/// Vessels without a node are dropped, not appended.
pub fn by_event_time(entities: &[EntitySnapshot]) -> Vec<EntitySnapshot> {
    let mut scheduled: Vec<(f64, &EntitySnapshot)> = entities
        .iter()
        .filter_map(|e| e.event_time().map(|t| (t, e)))
        .collect();
    scheduled.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    scheduled.into_iter().map(|(_, e)| e.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{arb_fleet, scenario_fleet};
    use maneuver_env::EntityId;
    use proptest::prelude::*;

    fn ids(entities: &[EntitySnapshot]) -> Vec<EntityId> {
        entities.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_reference_scenario_orderings() {
        let fleet = scenario_fleet();

        let names: Vec<String> = by_name(&fleet).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Alpha", "Bravo", "Charlie"]);

        let timed = by_event_time(&fleet);
        assert_eq!(ids(&timed), vec![EntityId::from_seed(2), EntityId::from_seed(3)]);
    }

    #[test]
    fn test_by_name_is_ordinal_not_locale() {
        let fleet = vec![
            EntitySnapshot::new(EntityId::from_seed(1), "alpha"),
            EntitySnapshot::new(EntityId::from_seed(2), "Zulu"),
            EntitySnapshot::new(EntityId::from_seed(3), "Ärger"),
        ];
        let names: Vec<String> = by_name(&fleet).into_iter().map(|e| e.name).collect();
        // Uppercase ASCII < lowercase ASCII < non-ASCII
        assert_eq!(names, vec!["Zulu", "alpha", "Ärger"]);
    }

    #[test]
    fn test_by_name_ties_keep_host_order() {
        let fleet = vec![
            EntitySnapshot::new(EntityId::from_seed(1), "Relay"),
            EntitySnapshot::new(EntityId::from_seed(2), "Probe"),
            EntitySnapshot::new(EntityId::from_seed(3), "Relay"),
        ];
        let sorted = by_name(&fleet);
        assert_eq!(
            ids(&sorted),
            vec![EntityId::from_seed(2), EntityId::from_seed(1), EntityId::from_seed(3)]
        );
    }

    #[test]
    fn test_by_event_time_ties_keep_host_order() {
        let fleet = vec![
            EntitySnapshot::new(EntityId::from_seed(1), "A").with_event(500.0, 1.0),
            EntitySnapshot::new(EntityId::from_seed(2), "B").with_event(100.0, 1.0),
            EntitySnapshot::new(EntityId::from_seed(3), "C").with_event(500.0, 1.0),
        ];
        let sorted = by_event_time(&fleet);
        assert_eq!(
            ids(&sorted),
            vec![EntityId::from_seed(2), EntityId::from_seed(1), EntityId::from_seed(3)]
        );
    }

    #[test]
    fn test_by_event_time_drops_nan_nodes() {
        let fleet = vec![
            EntitySnapshot::new(EntityId::from_seed(1), "A").with_event(f64::NAN, 1.0),
            EntitySnapshot::new(EntityId::from_seed(2), "B").with_event(10.0, 1.0),
        ];
        assert_eq!(ids(&by_event_time(&fleet)), vec![EntityId::from_seed(2)]);
    }

    #[test]
    fn test_default_order_is_identity() {
        let fleet = scenario_fleet();
        assert_eq!(default_order(&fleet), fleet);
    }

    proptest! {
        #[test]
        fn by_name_is_sorted_permutation(fleet in arb_fleet()) {
            let sorted = by_name(&fleet);
            prop_assert_eq!(sorted.len(), fleet.len());
            for pair in sorted.windows(2) {
                prop_assert!(pair[0].name.as_bytes() <= pair[1].name.as_bytes());
            }
            let mut expected = ids(&fleet);
            let mut actual = ids(&sorted);
            expected.sort();
            actual.sort();
            prop_assert_eq!(expected, actual);
        }

        #[test]
        fn by_event_time_is_sorted_and_exact(fleet in arb_fleet()) {
            let sorted = by_event_time(&fleet);
            for pair in sorted.windows(2) {
                prop_assert!(pair[0].event_time().unwrap() <= pair[1].event_time().unwrap());
            }
            let mut expected: Vec<EntityId> = fleet
                .iter()
                .filter(|e| e.scheduled_event().is_some())
                .map(|e| e.id)
                .collect();
            let mut actual = ids(&sorted);
            expected.sort();
            actual.sort();
            prop_assert_eq!(expected, actual);
        }
    }
}
