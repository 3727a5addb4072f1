//! Readiness scoring: how appropriate is it to work on a skill now.
//!
//! Five factors combine into a single [0,1] score:
//!
//! ```text
//! score = 0.35 * parent mastery   + 0.30 * gate satisfaction
//!       + 0.15 * confidence       + 0.10 * age proximity
//!       + 0.10 * activity coverage
//! ```
//!
//! Gate satisfaction is the only factor with hard-stop semantics: a failing
//! prerequisite or a firing block zeroes the component and removes the node
//! from "eligible next" selection entirely. The other factors only shade
//! the ordering.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::gate::{FactProvider, StateFacts, evaluate_gate};
use crate::index::GenomeIndex;
use sprout_types::activity::{Activity, ActivityFilters};
use sprout_types::genome::{AgeBand, Gate, GateKind, Node};
use sprout_types::learner::LearnerState;

// ---------------------------------------------------------------------------
// Weights and thresholds
// ---------------------------------------------------------------------------

pub const WEIGHT_PARENT_MASTERY: f64 = 0.35;
pub const WEIGHT_GATE_SATISFACTION: f64 = 0.30;
pub const WEIGHT_CONFIDENCE: f64 = 0.15;
pub const WEIGHT_AGE_PROXIMITY: f64 = 0.10;
pub const WEIGHT_ACTIVITY_COVERAGE: f64 = 0.10;

/// Level at or above which a skill counts as mastered.
pub const MASTERY_LEVEL: f64 = 2.0;

// ---------------------------------------------------------------------------
// Individual factors
// ---------------------------------------------------------------------------

/// How mastered the node's tree parent is: parent level scaled so that a
/// mastered parent (level 2) saturates at 1. Zero when the node has no
/// parent or no parent state is recorded.
pub fn parent_mastery(index: &GenomeIndex, node_id: &str, state: &LearnerState) -> f64 {
    match index.parent(node_id) {
        Some(parent) => (state.get(parent).level / MASTERY_LEVEL).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// Gate satisfaction in [0,1].
///
/// No gates is a neutral pass (1). `min_level` gates are all-or-nothing:
/// every listed node must sit at or above the required level or the whole
/// component is 0. Expression gates start from a neutral 0.5: a failing
/// prereq or a firing block is a hard stop (0), a passing prereq lifts the
/// floor to 0.6, and each passing boost adds 0.2 up to the cap of 1.
pub fn gate_satisfaction(node: &Node, facts: &dyn FactProvider) -> f64 {
    if node.gates.is_empty() {
        return 1.0;
    }

    for gate in &node.gates {
        if let Gate::MinLevel { nodes, min_level } = gate {
            if nodes.iter().any(|n| facts.level(n) < *min_level) {
                return 0.0;
            }
        }
    }

    let mut saw_expr = false;
    let mut score: f64 = 0.5;
    for gate in &node.gates {
        let Gate::Expr { kind, expr, .. } = gate else {
            continue;
        };
        saw_expr = true;
        let passed = evaluate_gate(expr, facts);
        match kind {
            GateKind::Prereq => {
                if !passed {
                    return 0.0;
                }
                score = score.max(0.6);
            }
            GateKind::Block => {
                if passed {
                    return 0.0;
                }
            }
            GateKind::Boost => {
                if passed {
                    score = (score + 0.2).min(1.0);
                }
            }
        }
    }

    if saw_expr { score } else { 1.0 }
}

/// Whether the node's gates permit working on it at all: min_level gates
/// all pass, no prerequisite fails, no block fires.
pub fn gates_satisfied(node: &Node, facts: &dyn FactProvider) -> bool {
    gate_satisfaction(node, facts) > 0.0
}

/// Recorded confidence clamped to [0,1]; zero when unset.
pub fn confidence_component(state: &LearnerState, node_id: &str) -> f64 {
    state.get(node_id).confidence.clamp(0.0, 1.0)
}

/// How well the learner's age fits the node's typical window.
///
/// Inside the band is a perfect 1. Early attempts decay fast
/// (0.2 per month, floored at 0.5); late ones decay gently
/// (0.1 per month, floored at 0.6). A node without a band scores a
/// neutral-favorable 0.8.
pub fn age_proximity(age_months: f64, band: Option<&AgeBand>) -> f64 {
    let Some(band) = band else { return 0.8 };
    if age_months < band.typical_start {
        let months_early = band.typical_start - age_months;
        (1.0 - 0.2 * months_early).max(0.5)
    } else if age_months > band.typical_end {
        let months_late = age_months - band.typical_end;
        (1.0 - 0.1 * months_late).max(0.6)
    } else {
        1.0
    }
}

/// Share of this node's linked activities that survive the caller's
/// filters, with a floor of 2 in the denominator so a single matching link
/// never saturates the factor. Zero when nothing links here at all.
pub fn activity_coverage(
    node_id: &str,
    activities: &[Activity],
    filters: Option<&ActivityFilters>,
) -> f64 {
    let links: Vec<&Activity> = activities.iter().filter(|a| a.references(node_id)).collect();
    if links.is_empty() {
        return 0.0;
    }
    let matching = match filters {
        Some(f) => links.iter().filter(|a| f.matches(a)).count(),
        None => links.len(),
    };
    (matching as f64 / links.len().max(2) as f64).min(1.0)
}

// ---------------------------------------------------------------------------
// Composite score
// ---------------------------------------------------------------------------

/// Weighted readiness score for one node, in [0,1].
pub fn readiness_score(
    index: &GenomeIndex,
    node: &Node,
    state: &LearnerState,
    age_months: f64,
    activities: &[Activity],
    filters: Option<&ActivityFilters>,
) -> f64 {
    let facts = StateFacts::new(state, age_months);
    WEIGHT_PARENT_MASTERY * parent_mastery(index, &node.id, state)
        + WEIGHT_GATE_SATISFACTION * gate_satisfaction(node, &facts)
        + WEIGHT_CONFIDENCE * confidence_component(state, &node.id)
        + WEIGHT_AGE_PROXIMITY * age_proximity(age_months, node.age_band.as_ref())
        + WEIGHT_ACTIVITY_COVERAGE * activity_coverage(&node.id, activities, filters)
}

// ---------------------------------------------------------------------------
// Branch winners and status classification
// ---------------------------------------------------------------------------

/// The recommended next node for one branch.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchWinner {
    pub root_id: String,
    pub node_id: String,
    pub score: f64,
}

/// Pick the recommended node per branch: among nodes whose gates are
/// satisfied and whose level is below mastery, the highest readiness score
/// wins. Ties keep the first maximum encountered (depth order, then
/// document order). Branches with no eligible node produce no winner.
pub fn recommend_per_branch(
    index: &GenomeIndex,
    state: &LearnerState,
    age_months: f64,
    activities: &[Activity],
    filters: Option<&ActivityFilters>,
) -> Vec<BranchWinner> {
    let facts = StateFacts::new(state, age_months);
    let mut winners = Vec::new();

    for root in &index.roots {
        let mut best: Option<(&str, f64)> = None;
        for id in index.branch_nodes(root) {
            let Some(node) = index.node(id) else { continue };
            if state.get(id).level >= MASTERY_LEVEL {
                continue;
            }
            if !gates_satisfied(node, &facts) {
                continue;
            }
            let score = readiness_score(index, node, state, age_months, activities, filters);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((id, score));
            }
        }
        if let Some((id, score)) = best {
            winners.push(BranchWinner {
                root_id: root.clone(),
                node_id: id.to_string(),
                score,
            });
        }
    }

    winners
}

/// Convenience view of [`recommend_per_branch`] as a lookup set.
pub fn recommended_set(winners: &[BranchWinner]) -> HashSet<String> {
    winners.iter().map(|w| w.node_id.clone()).collect()
}

/// Where a node stands for a learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Level at or above mastery.
    Mastered,
    /// The branch's current best next step.
    Recommended,
    /// Gates satisfied but not the branch winner.
    Ready,
    /// Some gate is failing.
    Locked,
}

/// Classify one node against the learner's state and the recommended set.
pub fn classify_status(
    node: &Node,
    state: &LearnerState,
    age_months: f64,
    recommended: &HashSet<String>,
) -> NodeStatus {
    if state.get(&node.id).level >= MASTERY_LEVEL {
        return NodeStatus::Mastered;
    }
    if recommended.contains(&node.id) {
        return NodeStatus::Recommended;
    }
    let facts = StateFacts::new(state, age_months);
    if gates_satisfied(node, &facts) {
        NodeStatus::Ready
    } else {
        NodeStatus::Locked
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
