//! Sprout engine: genome indexing, state derivation, and readiness scoring.
//!
//! The engine is a set of pure, synchronous functions over in-memory
//! snapshots. A genome document is indexed once into a [`GenomeIndex`];
//! per-learner achievements are re-derived from scratch on every call, so
//! the only invariant the engine upholds across concurrent use is
//! "same input, same output". No operation performs I/O.
//!
//! Boundary operations:
//! - [`build_index`] -- genome document into a navigable forest index
//! - [`derive_state`] -- achievements into achieved set + frontier
//! - [`evaluate_gate`] -- gate DSL expression against learner facts
//! - [`readiness_score`] / [`classify_status`] -- per-node scoring
//! - [`rank_activities`] -- activities ordered by frontier hits
//! - [`GenomeEngine`] -- context object bundling the above around one
//!   loaded genome, with neutral fallbacks before loading

pub mod derive;
pub mod engine;
pub mod gate;
pub mod index;
pub mod readiness;
pub mod recommend;

pub use derive::{DerivedBranch, DerivedState, derive_state, expand_with_ancestors};
pub use engine::GenomeEngine;
pub use gate::{FactProvider, NullFacts, StateFacts, evaluate_gate};
pub use index::{GenomeIndex, build_index};
pub use readiness::{
    BranchWinner, NodeStatus, classify_status, gate_satisfaction, gates_satisfied,
    readiness_score, recommend_per_branch, recommended_set,
};
pub use recommend::rank_activities;
