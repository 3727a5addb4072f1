//! Genome document types: milestone nodes, progression edges, and gates.
//!
//! A genome is a forest of developmental milestones. Two authoring schemas
//! are supported: nodes may carry `parentId` directly, or the document may
//! provide an explicit `edges` list from which parent pointers are derived
//! during indexing. Field names follow the camelCase JSON documents the
//! loading layer hands us.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Age bands and gates
// ---------------------------------------------------------------------------

/// Typical age window for a milestone, in months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBand {
    pub typical_start: f64,
    pub typical_end: f64,
}

/// How an expression gate influences readiness.
///
/// - `Prereq`: must evaluate true, otherwise readiness is forced to zero.
/// - `Block`: must evaluate false, otherwise readiness is forced to zero.
/// - `Boost`: evaluating true nudges the gate score upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    Prereq,
    Block,
    Boost,
}

/// A conditional rule attached to a node.
///
/// Gates come in two equivalent authoring shapes, distinguished by their
/// fields: a `min_level` gate lists nodes that must all sit at or above a
/// level, while an expression gate carries a DSL string evaluated against
/// per-learner facts. Authored with the genome, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Gate {
    #[serde(rename_all = "camelCase")]
    MinLevel {
        nodes: Vec<String>,
        /// Level every listed node must reach. Defaults to 1 (emerging).
        #[serde(default = "default_min_level")]
        min_level: f64,
    },
    Expr {
        kind: GateKind,
        expr: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rationale: Option<String>,
    },
}

fn default_min_level() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Nodes, edges, ladders
// ---------------------------------------------------------------------------

/// A milestone node. Owned by the genome document; immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    /// The developmental domain ladder this node belongs to, when authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ladder_id: Option<String>,
    /// Tree parent in the parentId schema. `None` for roots, or when the
    /// document uses explicit edges instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_band: Option<AgeBand>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exit_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gates: Vec<Gate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The relation an edge encodes. Only progression edges shape the tree;
/// gate/related edges are carried as data for rendering layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Progression,
    Gate,
    Related,
}

impl Default for EdgeKind {
    fn default() -> Self {
        Self::Progression
    }
}

/// A directed relation between two nodes, consumed during indexing to derive
/// parent pointers. Not retained as first-class state afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub kind: EdgeKind,
    /// Marks the winning edge when a node has several incoming progression
    /// edges. Without exactly one primary marker such genomes are rejected.
    #[serde(default)]
    pub primary: bool,
}

impl Edge {
    /// Convenience constructor for a plain progression edge.
    pub fn progression(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Progression,
            primary: false,
        }
    }
}

/// One root-rooted subtree of the genome: a developmental domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ladder {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_node_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Genome document
// ---------------------------------------------------------------------------

/// The full developmental skill graph. Loaded once per session by the
/// data-loading collaborator and treated as immutable thereafter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genome {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ladders: Vec<Ladder>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<Edge>,
}

impl Node {
    /// Minimal node: id and name, everything else empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ladder_id: None,
            parent_id: None,
            name: name.into(),
            description: None,
            age_band: None,
            exit_criteria: Vec::new(),
            gates: Vec::new(),
            tags: Vec::new(),
        }
    }
}
