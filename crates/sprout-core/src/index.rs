//! Genome indexing: flat node/edge lists into a navigable forest.
//!
//! Uses `petgraph` to validate that progression edges are acyclic, then
//! assigns depth and owning root to every node by breadth-first walk from
//! each in-degree-zero root. Dangling edges (unknown endpoints) are a
//! tolerated data-quality gap and are dropped with a diagnostic. A node
//! with several incoming progression edges is only accepted when exactly
//! one of them is marked `primary`; otherwise the genome is rejected so
//! that which parent wins never depends on edge-processing order.

use std::collections::{HashMap, VecDeque};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use tracing::debug;

use sprout_types::error::GenomeError;
use sprout_types::genome::{Edge, EdgeKind, Genome, Node};

// ---------------------------------------------------------------------------
// Index snapshot
// ---------------------------------------------------------------------------

/// Read-only navigable snapshot of a genome forest.
///
/// Built once per loaded genome and shared freely afterward; nothing in the
/// engine mutates it. Invariants: every root has depth 0, and every non-root
/// node's depth is its parent's depth plus one.
#[derive(Debug, Clone)]
pub struct GenomeIndex {
    /// Node ids in document order, for deterministic iteration.
    pub node_ids: Vec<String>,
    pub node_by_id: HashMap<String, Node>,
    pub children_of: HashMap<String, Vec<String>>,
    pub parent_of: HashMap<String, Option<String>>,
    /// In-degree-zero nodes, in document order.
    pub roots: Vec<String>,
    /// Node id -> id of the root owning its branch.
    pub root_for: HashMap<String, String>,
    /// Node id -> distance from its root.
    pub depth: HashMap<String, usize>,
}

impl GenomeIndex {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_by_id.get(id)
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.children_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.parent_of.get(id).and_then(|p| p.as_deref())
    }

    pub fn depth_of(&self, id: &str) -> usize {
        self.depth.get(id).copied().unwrap_or(0)
    }

    /// Nodes of one branch in ascending depth order, ties broken by
    /// document order (the sort is stable).
    pub fn branch_nodes(&self, root_id: &str) -> Vec<&str> {
        let mut nodes: Vec<&str> = self
            .node_ids
            .iter()
            .filter(|id| self.root_for.get(*id).map(String::as_str) == Some(root_id))
            .map(String::as_str)
            .collect();
        nodes.sort_by_key(|id| self.depth_of(id));
        nodes
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build a [`GenomeIndex`] from a genome document.
///
/// Progression structure comes from the explicit `edges` list when one is
/// present, otherwise from per-node `parentId` pointers. Edges referencing
/// unknown node ids are dropped (non-fatal). The genome is rejected when a
/// node ends up with more than one progression parent and no unique
/// `primary` marker, or when progression edges form a cycle -- in both
/// cases no deterministic forest exists.
pub fn build_index(genome: &Genome) -> Result<GenomeIndex, GenomeError> {
    let mut node_ids: Vec<String> = Vec::with_capacity(genome.nodes.len());
    let mut node_by_id: HashMap<String, Node> = HashMap::with_capacity(genome.nodes.len());
    for node in &genome.nodes {
        if node_by_id.insert(node.id.clone(), node.clone()).is_none() {
            node_ids.push(node.id.clone());
        } else {
            debug!(node = %node.id, "duplicate node id, keeping the later definition");
        }
    }

    let edges = progression_edges(genome, &node_by_id);

    // Resolve a single parent per node. Several incoming edges are only
    // legal when exactly one carries the primary marker.
    let mut incoming: HashMap<&str, Vec<&Edge>> = HashMap::new();
    for edge in &edges {
        incoming.entry(edge.to.as_str()).or_default().push(edge);
    }

    let mut parent_of: HashMap<String, Option<String>> =
        node_ids.iter().map(|id| (id.clone(), None)).collect();
    let mut children_of: HashMap<String, Vec<String>> =
        node_ids.iter().map(|id| (id.clone(), Vec::new())).collect();

    for id in &node_ids {
        let Some(candidates) = incoming.get(id.as_str()) else {
            continue;
        };
        let winner = if candidates.len() == 1 {
            candidates[0]
        } else {
            let primaries: Vec<&Edge> = candidates.iter().filter(|e| e.primary).copied().collect();
            if primaries.len() != 1 {
                return Err(GenomeError::AmbiguousParent {
                    node: id.clone(),
                    count: candidates.len(),
                });
            }
            debug!(
                node = %id,
                ignored = candidates.len() - 1,
                "multiple progression parents, primary marker wins"
            );
            primaries[0]
        };
        parent_of.insert(id.clone(), Some(winner.from.clone()));
    }

    for id in &node_ids {
        if let Some(Some(parent)) = parent_of.get(id) {
            children_of.entry(parent.clone()).or_default().push(id.clone());
        }
    }

    reject_cycles(&node_ids, &parent_of)?;

    let roots: Vec<String> = node_ids
        .iter()
        .filter(|id| matches!(parent_of.get(*id), Some(None)))
        .cloned()
        .collect();

    // Breadth-first walk from each root assigns depth and owning root.
    // Parents are unique and cycles are rejected above, so depths are exact
    // and the walk terminates.
    let mut depth: HashMap<String, usize> = HashMap::new();
    let mut root_for: HashMap<String, String> = HashMap::new();
    for root in &roots {
        depth.insert(root.clone(), 0);
        root_for.insert(root.clone(), root.clone());
        let mut queue: VecDeque<&str> = VecDeque::from([root.as_str()]);
        while let Some(id) = queue.pop_front() {
            let d = depth[id];
            for child in children_of.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                depth.insert(child.clone(), d + 1);
                root_for.insert(child.clone(), root.clone());
                queue.push_back(child.as_str());
            }
        }
    }

    Ok(GenomeIndex {
        node_ids,
        node_by_id,
        children_of,
        parent_of,
        roots,
        root_for,
        depth,
    })
}

/// Collect progression edges from whichever schema the document uses,
/// dropping edges that reference unknown nodes.
fn progression_edges(genome: &Genome, node_by_id: &HashMap<String, Node>) -> Vec<Edge> {
    let raw: Vec<Edge> = if genome.edges.is_empty() {
        genome
            .nodes
            .iter()
            .filter_map(|n| {
                n.parent_id
                    .as_ref()
                    .map(|p| Edge::progression(p.clone(), n.id.clone()))
            })
            .collect()
    } else {
        genome
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Progression)
            .cloned()
            .collect()
    };

    raw.into_iter()
        .filter(|e| {
            let known = node_by_id.contains_key(&e.from) && node_by_id.contains_key(&e.to);
            if !known {
                debug!(from = %e.from, to = %e.to, "dropping edge with unknown endpoint");
            }
            known
        })
        .collect()
}

/// Toposort over the resolved parent pointers; a cycle means some chain of
/// nodes has no root and the forest is unbuildable.
fn reject_cycles(
    node_ids: &[String],
    parent_of: &HashMap<String, Option<String>>,
) -> Result<(), GenomeError> {
    let mut graph = DiGraph::<&str, ()>::new();
    let idx: HashMap<&str, _> = node_ids
        .iter()
        .map(|id| (id.as_str(), graph.add_node(id.as_str())))
        .collect();
    for id in node_ids {
        if let Some(Some(parent)) = parent_of.get(id) {
            graph.add_edge(idx[parent.as_str()], idx[id.as_str()], ());
        }
    }
    toposort(&graph, None)
        .map(|_| ())
        .map_err(|cycle| GenomeError::CycleDetected(graph[cycle.node_id()].to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
