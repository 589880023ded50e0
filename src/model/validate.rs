//! Structural validation of authored graphs.
//!
//! Validation runs at author-save time; the engine does not re-check
//! structure at execution time. Edges referencing nonexistent node ids are
//! tolerated (traversal simply never reaches them), and no cycle detection is
//! performed — a cyclic graph is bounded only by the execution time budget.

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;

use super::graph::Graph;
use super::node_data::NodeData;

/// Structural errors reported at author-save time.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph has no start node")]
    #[diagnostic(
        code(botflow::model::no_start),
        help("Every graph needs exactly one start node.")
    )]
    NoStartNode,

    #[error("graph has {count} start nodes, expected exactly one")]
    #[diagnostic(code(botflow::model::multiple_starts))]
    MultipleStartNodes { count: usize },

    #[error("duplicate node id: {id}")]
    #[diagnostic(
        code(botflow::model::duplicate_node_id),
        help("Node ids must be unique within a graph.")
    )]
    DuplicateNodeId { id: String },

    #[error("node {id} ({kind}) has no incoming edge")]
    #[diagnostic(
        code(botflow::model::disconnected_node),
        help("Connect the node or delete it; disconnected nodes never run.")
    )]
    DisconnectedNode { id: String, kind: &'static str },
}

/// Validate a graph's structure, returning the first violation found.
///
/// Checks, in order: exactly one Start node, unique node ids, and that every
/// non-Start node has at least one incoming edge.
pub fn validate(graph: &Graph) -> Result<(), GraphError> {
    let start_count = graph
        .nodes
        .iter()
        .filter(|n| matches!(n.data, NodeData::Start {}))
        .count();
    match start_count {
        0 => return Err(GraphError::NoStartNode),
        1 => {}
        count => return Err(GraphError::MultipleStartNodes { count }),
    }

    let mut seen = FxHashSet::default();
    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(GraphError::DuplicateNodeId {
                id: node.id.clone(),
            });
        }
    }

    let targets: FxHashSet<&str> = graph.edges.iter().map(|e| e.target.as_str()).collect();
    for node in &graph.nodes {
        if matches!(node.data, NodeData::Start {}) {
            continue;
        }
        if !targets.contains(node.id.as_str()) {
            return Err(GraphError::DisconnectedNode {
                id: node.id.clone(),
                kind: node.data.kind(),
            });
        }
    }

    Ok(())
}
