use thiserror::Error;

/// Errors raised while validating a genome document during indexing.
///
/// These are the only hard failures in the engine: every other data-quality
/// gap (dangling edges, malformed gate expressions, missing indexes) is
/// recovered locally with a diagnostic. A genome that trips one of these is
/// structurally ambiguous and cannot be indexed deterministically.
#[derive(Debug, Error)]
pub enum GenomeError {
    /// A node has several incoming progression edges and no single edge is
    /// marked `primary`, so which parent wins would depend on edge order.
    #[error(
        "node '{node}' has {count} incoming progression edges and no unique primary marker"
    )]
    AmbiguousParent { node: String, count: usize },

    /// Progression edges form a cycle, so the forest has no consistent
    /// root/depth assignment.
    #[error("progression edges form a cycle involving node '{0}'")]
    CycleDetected(String),
}
