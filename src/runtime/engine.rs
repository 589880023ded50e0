//! The shared traversal/branch-selection algorithm.
//!
//! Both backends run this exact loop; only the injected [`EffectSink`]
//! differs. Traversal is a linear walk: one current node, one chosen edge,
//! never a fan-out into parallel successors.

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, warn};

use super::context::InvocationContext;
use super::effects::{ActionError, EffectSink};
use super::handlers::{NextHint, execute_node};
use crate::model::{Graph, Node, NodeData};

/// Terminal state of one traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Reached an End node.
    Ended,
    /// A node had no matching outgoing edge (or the edge pointed at a
    /// nonexistent node). This is the intentional quiet-stop policy: the
    /// walk stops silently and counts as success.
    QuietStop,
}

/// Fatal traversal failures.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("graph has no unique start node")]
    #[diagnostic(
        code(botflow::engine::no_start),
        help("Run model::validate before persisting; execution does not re-validate structure.")
    )]
    NoStart,

    #[error("node {node_id} ({kind}) failed: {source}")]
    #[diagnostic(code(botflow::engine::node_failed))]
    Node {
        node_id: String,
        kind: &'static str,
        #[source]
        #[diagnostic_source]
        source: ActionError,
    },

    #[error("execution exceeded its {budget_ms} ms budget")]
    #[diagnostic(
        code(botflow::engine::timeout),
        help("Long Delay nodes or slow external calls can exhaust the budget.")
    )]
    Timeout { budget_ms: u64 },

    #[error("execution exceeded the {limit}-step bound")]
    #[diagnostic(
        code(botflow::engine::step_limit),
        help("The graph likely contains a cycle; cycles are not rejected at save time.")
    )]
    StepLimitExceeded { limit: u32 },
}

/// Walk `graph` from its Start node until an End node, a quiet stop, or a
/// failure.
///
/// Per-node handler failures are caught at the node boundary: traversal stops
/// and the failure is returned with the offending node identified, for the
/// caller to log in detail and report generically to the end user. There are
/// no retries.
pub async fn run(
    graph: &Graph,
    ctx: &mut InvocationContext,
    sink: &mut dyn EffectSink,
) -> Result<RunStatus, EngineError> {
    let start = graph.start_node().ok_or(EngineError::NoStart)?;
    let mut current = start;
    let mut steps: u32 = 0;

    loop {
        if let Some(limit) = sink.step_limit() {
            if steps >= limit {
                return Err(EngineError::StepLimitExceeded { limit });
            }
        }
        steps += 1;

        sink.node_started(current);

        if matches!(current.data, NodeData::End {}) {
            debug!(node = %current.id, steps, "reached end node");
            return Ok(RunStatus::Ended);
        }

        let hint =
            execute_node(current, graph, ctx, sink)
                .await
                .map_err(|source| EngineError::Node {
                    node_id: current.id.clone(),
                    kind: current.data.kind(),
                    source,
                })?;

        current = match next_node(graph, current, hint) {
            Some(node) => node,
            None => {
                debug!(node = %current.id, steps, "no outgoing edge matched; quiet stop");
                return Ok(RunStatus::QuietStop);
            }
        };
    }
}

/// Select the successor of `node` given its handler's hint.
///
/// Non-branching nodes follow the first edge (declaration order) whose source
/// matches. Branching nodes follow the edge whose `source_handle` equals
/// `"true"`/`"false"`. A missing edge, or an edge whose target id does not
/// exist in the graph, yields `None` and therefore a quiet stop.
fn next_node<'g>(graph: &'g Graph, node: &Node, hint: NextHint) -> Option<&'g Node> {
    let edge = match hint {
        NextHint::Follow => graph.edges_from(&node.id).next(),
        NextHint::Branch(outcome) => {
            let handle = if outcome { "true" } else { "false" };
            graph
                .edges_from(&node.id)
                .find(|e| e.source_handle.as_deref() == Some(handle))
        }
    }?;

    match graph.node(&edge.target) {
        Some(target) => Some(target),
        None => {
            // Dangling targets are tolerated at save time; at run time they
            // simply end the walk.
            warn!(edge = %edge.id, target = %edge.target, "edge targets a nonexistent node");
            None
        }
    }
}
