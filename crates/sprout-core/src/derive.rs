//! Per-learner state derivation: achieved set, latest-achieved per branch,
//! and the frontier of actionable next skills.
//!
//! Pure and deterministic: the result depends only on the index and the
//! distinct node ids in the achievement list, never on record order,
//! timestamps, or evidence.

use std::collections::HashSet;

use crate::index::GenomeIndex;
use sprout_types::learner::Achievement;

// ---------------------------------------------------------------------------
// Derived state
// ---------------------------------------------------------------------------

/// Derivation result for one branch of the forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedBranch {
    pub root_id: String,
    /// Deepest node of the contiguous achieved prefix walking down from the
    /// root. `None` when the root itself is not achieved.
    pub latest_achieved: Option<String>,
    /// Next-candidate nodes for this branch.
    pub frontier: Vec<String>,
}

/// A learner's position in the genome, derived from achievements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedState {
    pub achieved_set: HashSet<String>,
    pub branches: Vec<DerivedBranch>,
    /// De-duplicated union of branch frontiers, in branch order.
    pub frontier_all: Vec<String>,
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive achieved/frontier state for one learner.
///
/// Each branch is walked in ascending depth order from its root; the
/// longest contiguous prefix of achieved nodes determines `latest_achieved`.
/// Progression is assumed monotonic: achieved nodes past the first gap are
/// ignored, not corrected. The frontier is the set of direct children of
/// the latest achieved node (the root's children, or the root itself when
/// it is childless, if nothing is achieved yet), minus anything already
/// achieved so the two sets never overlap.
pub fn derive_state(index: &GenomeIndex, achievements: &[Achievement]) -> DerivedState {
    let achieved_set: HashSet<String> =
        achievements.iter().map(|a| a.node_id.clone()).collect();

    let mut branches = Vec::with_capacity(index.roots.len());
    for root in &index.roots {
        let chain = index.branch_nodes(root);

        let mut latest_achieved: Option<String> = None;
        for id in &chain {
            if achieved_set.contains(*id) {
                latest_achieved = Some((*id).to_string());
            } else {
                break;
            }
        }

        let mut frontier: Vec<String> = match &latest_achieved {
            Some(laa) => index.children(laa).to_vec(),
            None => {
                let children = index.children(root);
                if children.is_empty() {
                    vec![root.clone()]
                } else {
                    children.to_vec()
                }
            }
        };
        frontier.retain(|id| !achieved_set.contains(id));

        branches.push(DerivedBranch {
            root_id: root.clone(),
            latest_achieved,
            frontier,
        });
    }

    let mut seen = HashSet::new();
    let frontier_all: Vec<String> = branches
        .iter()
        .flat_map(|b| b.frontier.iter())
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect();

    DerivedState {
        achieved_set,
        branches,
        frontier_all,
    }
}

/// Expand a set of node ids with their full ancestor chains.
///
/// Marking a milestone achieved implies everything beneath it on the same
/// branch was achieved too. Output order: each input id followed by its
/// ancestors root-ward, previously seen ids skipped.
pub fn expand_with_ancestors(index: &GenomeIndex, ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for id in ids {
        let mut cursor: Option<&str> = Some(id.as_str());
        while let Some(current) = cursor {
            if !seen.insert(current) {
                break;
            }
            out.push(current.to_string());
            cursor = index.parent(current);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use sprout_types::genome::{AgeBand, Genome, Node};

    fn child_node(id: &str, parent: &str) -> Node {
        let mut n = Node::new(id, id);
        n.parent_id = Some(parent.to_string());
        n
    }

    /// R -> A -> B plus R -> C (fan-out at the root).
    fn fan_genome() -> Genome {
        Genome {
            nodes: vec![
                Node::new("R", "root"),
                child_node("A", "R"),
                child_node("B", "A"),
                child_node("C", "R"),
            ],
            ..Default::default()
        }
    }

    fn achieved(ids: &[&str]) -> Vec<Achievement> {
        ids.iter().map(|id| Achievement::of(*id)).collect()
    }

    #[test]
    fn test_nothing_achieved_frontier_is_root_children() {
        let index = build_index(&fan_genome()).unwrap();
        let state = derive_state(&index, &[]);
        let branch = &state.branches[0];
        assert_eq!(branch.latest_achieved, None);
        assert_eq!(branch.frontier, vec!["A", "C"]);
    }

    #[test]
    fn test_childless_root_is_its_own_frontier() {
        let genome = Genome {
            nodes: vec![Node::new("LONE", "lone root")],
            ..Default::default()
        };
        let index = build_index(&genome).unwrap();
        let state = derive_state(&index, &[]);
        assert_eq!(state.branches[0].frontier, vec!["LONE"]);
    }

    #[test]
    fn test_root_achieved_frontier_is_children() {
        // Root R (no ageBand), child C (ageBand 10-12); achieving R makes
        // C the frontier.
        let mut c = child_node("C", "R");
        c.age_band = Some(AgeBand {
            typical_start: 10.0,
            typical_end: 12.0,
        });
        let genome = Genome {
            nodes: vec![Node::new("R", "root"), c],
            ..Default::default()
        };
        let index = build_index(&genome).unwrap();
        let state = derive_state(&index, &achieved(&["R"]));
        let branch = &state.branches[0];
        assert_eq!(branch.root_id, "R");
        assert_eq!(branch.latest_achieved.as_deref(), Some("R"));
        assert_eq!(branch.frontier, vec!["C"]);
    }

    #[test]
    fn test_contiguous_prefix_stops_at_first_gap() {
        // R achieved, A not, B achieved out of order: the walk stops at A.
        let index = build_index(&fan_genome()).unwrap();
        let state = derive_state(&index, &achieved(&["R", "B"]));
        let branch = &state.branches[0];
        assert_eq!(branch.latest_achieved.as_deref(), Some("R"));
    }

    #[test]
    fn test_frontier_never_overlaps_achieved() {
        let index = build_index(&fan_genome()).unwrap();
        for ach in [
            achieved(&[]),
            achieved(&["R"]),
            achieved(&["R", "A"]),
            achieved(&["R", "C"]),
            achieved(&["R", "A", "B", "C"]),
            achieved(&["B", "C"]),
        ] {
            let state = derive_state(&index, &ach);
            for id in &state.frontier_all {
                assert!(
                    !state.achieved_set.contains(id),
                    "{id} in both frontier and achieved for {ach:?}"
                );
            }
        }
    }

    #[test]
    fn test_derivation_ignores_record_order_and_duplicates() {
        let index = build_index(&fan_genome()).unwrap();
        let forward = derive_state(&index, &achieved(&["R", "A"]));
        let backward = derive_state(&index, &achieved(&["A", "R", "A", "R"]));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_frontier_all_union_is_deduplicated() {
        // Two branches can never share a node, but repeated derivations of
        // the same branch frontier must not duplicate entries.
        let genome = Genome {
            nodes: vec![
                Node::new("R1", "r1"),
                child_node("X", "R1"),
                Node::new("R2", "r2"),
                child_node("Y", "R2"),
            ],
            ..Default::default()
        };
        let index = build_index(&genome).unwrap();
        let state = derive_state(&index, &[]);
        assert_eq!(state.frontier_all, vec!["X", "Y"]);
    }

    #[test]
    fn test_fully_achieved_branch_has_empty_frontier() {
        let index = build_index(&fan_genome()).unwrap();
        let state = derive_state(&index, &achieved(&["R", "A", "B", "C"]));
        let branch = &state.branches[0];
        assert_eq!(branch.latest_achieved.as_deref(), Some("B"));
        assert!(state.frontier_all.is_empty());
    }

    #[test]
    fn test_expand_with_ancestors() {
        let index = build_index(&fan_genome()).unwrap();
        let expanded = expand_with_ancestors(&index, &["B".to_string()]);
        assert_eq!(expanded, vec!["B", "A", "R"]);

        let expanded = expand_with_ancestors(&index, &["B".to_string(), "C".to_string()]);
        assert_eq!(expanded, vec!["B", "A", "R", "C"]);
    }
}
