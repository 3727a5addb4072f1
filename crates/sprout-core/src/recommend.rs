//! Activity ranking against a learner's frontier.
//!
//! Scores each activity by how many of its declared target nodes sit on the
//! learner's frontier, then sorts descending. The sort is stable, so
//! equally scored activities keep their catalogue order.

use std::collections::HashSet;

use crate::derive::derive_state;
use crate::index::GenomeIndex;
use sprout_types::activity::Activity;
use sprout_types::learner::Achievement;

/// Rank activities for a learner: frontier hits first, catalogue order
/// preserved among equals. Returns the same elements, reordered.
pub fn rank_activities(
    index: &GenomeIndex,
    activities: &[Activity],
    achievements: &[Achievement],
) -> Vec<Activity> {
    let derived = derive_state(index, achievements);
    let frontier: HashSet<&str> = derived.frontier_all.iter().map(String::as_str).collect();

    let mut scored: Vec<(usize, Activity)> = activities
        .iter()
        .map(|a| {
            let hits = a
                .target_nodes()
                .iter()
                .filter(|t| frontier.contains(**t))
                .count();
            (hits, a.clone())
        })
        .collect();

    scored.sort_by(|(a, _), (b, _)| b.cmp(a));
    scored.into_iter().map(|(_, a)| a).collect()
}
