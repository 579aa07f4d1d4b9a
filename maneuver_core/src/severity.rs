//! Severity Classifier - flags imminent, overdue and clustered nodes.
//!
//! Classification is cheap and time-dependent, so it is recomputed on every
//! display refresh rather than memoized.

use maneuver_env::{EntitySnapshot, Severity, SeverityMap};

/// Classifies one vessel against the clock and its successor in event order.
///
/// Returns `None` for vessels without a scheduled node.
///
/// # Rules
/// 1. `Passed` if the node is in the past.
/// 2. `Warning` if the node is inside the lead-time window.
/// 3. `Warning` if the successor's node follows within the lead time.
/// 4. `Normal` otherwise.
pub fn classify(
    entity: &EntitySnapshot,
    now: f64,
    lead_time: f64,
    successor: Option<&EntitySnapshot>,
) -> Option<Severity> {
    let time = entity.event_time()?;

    if time < now {
        return Some(Severity::Passed);
    }
    if time < now + lead_time {
        return Some(Severity::Warning);
    }
    if successor.is_some_and(|next| clustered(entity, next, lead_time)) {
        return Some(Severity::Warning);
    }
    Some(Severity::Normal)
}

/// True if `later`'s node follows `earlier`'s within the lead time.
pub fn clustered(earlier: &EntitySnapshot, later: &EntitySnapshot, lead_time: f64) -> bool {
    match (earlier.event_time(), later.event_time()) {
        (Some(a), Some(b)) => b - a < lead_time,
        _ => false,
    }
}

/// Classifies a whole ByEventTime view.
///
/// Clustering is symmetric: both members of a close pair are flagged, so a
/// vessel is also raised to `Warning` when its predecessor clusters with it.
/// `Passed` is never overridden.
pub fn classify_sequence(by_event_time: &[EntitySnapshot], now: f64, lead_time: f64) -> SeverityMap {
    let mut severities = SeverityMap::with_capacity(by_event_time.len());

    for (i, entity) in by_event_time.iter().enumerate() {
        let successor = by_event_time.get(i + 1);
        let Some(mut severity) = classify(entity, now, lead_time, successor) else {
            continue;
        };

        if severity == Severity::Normal && i > 0 && clustered(&by_event_time[i - 1], entity, lead_time) {
            severity = Severity::Warning;
        }
        severities.insert(entity.id, severity);
    }

    severities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::by_event_time;
    use crate::testing::{arb_fleet, scenario_fleet};
    use maneuver_env::EntityId;
    use proptest::prelude::*;

    fn vessel(seed: u64, time: f64) -> EntitySnapshot {
        EntitySnapshot::new(EntityId::from_seed(seed), format!("V{seed}")).with_event(time, 10.0)
    }

    #[test]
    fn test_reference_scenario_pair_is_clustered() {
        let view = by_event_time(&scenario_fleet());
        let severities = classify_sequence(&view, 0.0, 900.0);

        assert_eq!(severities.len(), 2);
        assert_eq!(severities[&EntityId::from_seed(2)], Severity::Warning);
        assert_eq!(severities[&EntityId::from_seed(3)], Severity::Warning);
        assert!(!severities.contains_key(&EntityId::from_seed(1)));
    }

    #[test]
    fn test_single_vessel_rules() {
        let lead = 900.0;
        assert_eq!(classify(&vessel(1, 99.0), 100.0, lead, None), Some(Severity::Passed));
        assert_eq!(classify(&vessel(1, 100.0), 100.0, lead, None), Some(Severity::Warning));
        assert_eq!(classify(&vessel(1, 999.0), 100.0, lead, None), Some(Severity::Warning));
        assert_eq!(classify(&vessel(1, 1000.0), 100.0, lead, None), Some(Severity::Normal));
    }

    #[test]
    fn test_unscheduled_vessel_is_not_classified() {
        let idle = EntitySnapshot::new(EntityId::from_seed(1), "Idle");
        assert_eq!(classify(&idle, 0.0, 900.0, None), None);
    }

    #[test]
    fn test_cluster_flags_far_future_pair() {
        let view = vec![vessel(1, 50_000.0), vessel(2, 50_500.0), vessel(3, 60_000.0)];
        let severities = classify_sequence(&view, 0.0, 900.0);

        assert_eq!(severities[&EntityId::from_seed(1)], Severity::Warning);
        assert_eq!(severities[&EntityId::from_seed(2)], Severity::Warning);
        assert_eq!(severities[&EntityId::from_seed(3)], Severity::Normal);
    }

    #[test]
    fn test_passed_wins_over_cluster() {
        let view = vec![vessel(1, 90.0), vessel(2, 150.0)];
        let severities = classify_sequence(&view, 100.0, 900.0);

        assert_eq!(severities[&EntityId::from_seed(1)], Severity::Passed);
        assert_eq!(severities[&EntityId::from_seed(2)], Severity::Warning);
    }

    #[test]
    fn test_gap_of_exactly_lead_time_is_not_clustered() {
        let view = vec![vessel(1, 10_000.0), vessel(2, 10_900.0)];
        let severities = classify_sequence(&view, 0.0, 900.0);

        assert_eq!(severities[&EntityId::from_seed(1)], Severity::Normal);
        assert_eq!(severities[&EntityId::from_seed(2)], Severity::Normal);
    }

    #[test]
    fn test_clock_jump_back_reclassifies() {
        let view = vec![vessel(1, 1000.0)];
        assert_eq!(classify_sequence(&view, 1200.0, 900.0)[&EntityId::from_seed(1)], Severity::Passed);
        assert_eq!(classify_sequence(&view, -5000.0, 900.0)[&EntityId::from_seed(1)], Severity::Normal);
    }

    proptest! {
        #[test]
        fn clustered_pairs_are_both_warned(fleet in arb_fleet(), now in -10_000.0f64..10_000.0) {
            let view = by_event_time(&fleet);
            let severities = classify_sequence(&view, now, 900.0);

            prop_assert_eq!(severities.len(), view.len());
            for pair in view.windows(2) {
                if clustered(&pair[0], &pair[1], 900.0) {
                    for member in pair {
                        let severity = severities[&member.id];
                        prop_assert!(severity == Severity::Warning || severity == Severity::Passed);
                        if member.event_time().unwrap() >= now {
                            prop_assert_eq!(severity, Severity::Warning);
                        }
                    }
                }
            }
        }
    }
}
