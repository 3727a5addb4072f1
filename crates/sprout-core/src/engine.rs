//! The explicit engine context: one loaded genome, one index.
//!
//! A context object the calling layer constructs once per loaded genome
//! and passes into every derivation/scoring/ranking call; there is no
//! global state. Every operation invoked before a genome is loaded
//! degrades to a neutral result with a diagnostic; nothing here ever
//! panics at the boundary.

use std::collections::HashSet;

use tracing::warn;

use crate::derive::{DerivedState, derive_state, expand_with_ancestors};
use crate::index::{GenomeIndex, build_index};
use crate::readiness::{
    BranchWinner, NodeStatus, classify_status, readiness_score, recommend_per_branch,
};
use crate::recommend::rank_activities;
use sprout_types::activity::{Activity, ActivityFilters};
use sprout_types::error::GenomeError;
use sprout_types::genome::Genome;
use sprout_types::learner::{Achievement, LearnerState};

/// Engine context for one loaded genome.
///
/// Holds the read-only [`GenomeIndex`] between calls; everything else is
/// recomputed from scratch per call, so identical inputs always produce
/// identical outputs regardless of call history.
#[derive(Debug, Default)]
pub struct GenomeEngine {
    index: Option<GenomeIndex>,
}

impl GenomeEngine {
    /// An engine with no genome loaded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index for a genome document, replacing any previous one.
    pub fn load_genome(&mut self, genome: &Genome) -> Result<&GenomeIndex, GenomeError> {
        let index = build_index(genome)?;
        Ok(self.index.insert(index))
    }

    /// The current index, if a genome has been loaded.
    pub fn index(&self) -> Option<&GenomeIndex> {
        self.index.as_ref()
    }

    /// Derive achieved/frontier state for a learner. Without a loaded
    /// genome this is the empty state.
    pub fn derive_state(&self, achievements: &[Achievement]) -> DerivedState {
        match &self.index {
            Some(index) => derive_state(index, achievements),
            None => {
                warn!("derive_state called before a genome was loaded");
                DerivedState::default()
            }
        }
    }

    /// Readiness score for a node, or 0 when no genome is loaded or the
    /// node is unknown.
    pub fn compute_readiness(
        &self,
        node_id: &str,
        state: &LearnerState,
        age_months: f64,
        activities: &[Activity],
        filters: Option<&ActivityFilters>,
    ) -> f64 {
        let Some(index) = &self.index else {
            warn!("compute_readiness called before a genome was loaded");
            return 0.0;
        };
        match index.node(node_id) {
            Some(node) => readiness_score(index, node, state, age_months, activities, filters),
            None => {
                warn!(node_id, "compute_readiness for unknown node");
                0.0
            }
        }
    }

    /// Recommended next node per branch. Empty without a loaded genome.
    pub fn recommend(
        &self,
        state: &LearnerState,
        age_months: f64,
        activities: &[Activity],
        filters: Option<&ActivityFilters>,
    ) -> Vec<BranchWinner> {
        match &self.index {
            Some(index) => recommend_per_branch(index, state, age_months, activities, filters),
            None => {
                warn!("recommend called before a genome was loaded");
                Vec::new()
            }
        }
    }

    /// Status of a node for a learner. Unknown nodes, or any call before a
    /// genome is loaded, classify as locked.
    pub fn classify_status(
        &self,
        node_id: &str,
        state: &LearnerState,
        age_months: f64,
        recommended: &HashSet<String>,
    ) -> NodeStatus {
        let Some(node) = self.index.as_ref().and_then(|i| i.node(node_id)) else {
            warn!(node_id, "classify_status without an index entry");
            return NodeStatus::Locked;
        };
        classify_status(node, state, age_months, recommended)
    }

    /// Rank activities by frontier hits. Without a loaded genome the input
    /// is returned unchanged (identity fallback) with a diagnostic.
    pub fn rank_activities(
        &self,
        activities: &[Activity],
        achievements: &[Achievement],
    ) -> Vec<Activity> {
        match &self.index {
            Some(index) => rank_activities(index, activities, achievements),
            None => {
                warn!("genome index missing, returning unranked activities");
                activities.to_vec()
            }
        }
    }

    /// Close a set of node ids over their ancestor chains. Identity when no
    /// genome is loaded.
    pub fn expand_with_ancestors(&self, ids: &[String]) -> Vec<String> {
        match &self.index {
            Some(index) => expand_with_ancestors(index, ids),
            None => {
                let mut seen = HashSet::new();
                ids.iter()
                    .filter(|id| seen.insert(id.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
