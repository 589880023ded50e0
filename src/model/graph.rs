//! The persisted graph document: nodes, edges and variable declarations.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::node_data::NodeData;

/// One command's behavior as a directed graph of typed action nodes.
///
/// This is the wire/persisted artifact exchanged with the authoring tool and
/// storage. It is treated as immutable once saved; edits produce a new
/// [`GraphVersion`].
///
/// # Examples
///
/// ```
/// use botflow::model::{Graph, Node, NodeData, Edge};
///
/// let graph = Graph {
///     nodes: vec![
///         Node::new("start", NodeData::Start {}),
///         Node::new("end", NodeData::End {}),
///     ],
///     edges: vec![Edge::plain("e1", "start", "end")],
///     variables: Default::default(),
/// };
/// assert!(botflow::model::validate(&graph).is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Variable declarations keyed by name. Scope and default are authoring
    /// metadata; at run time every invocation owns a single flat map.
    #[serde(default)]
    pub variables: FxHashMap<String, VariableDecl>,
}

impl Graph {
    /// Look up a node by id. Linear scan; graphs are small authored documents.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The unique Start node, if the graph has exactly one.
    #[must_use]
    pub fn start_node(&self) -> Option<&Node> {
        let mut starts = self
            .nodes
            .iter()
            .filter(|n| matches!(n.data, NodeData::Start {}));
        match (starts.next(), starts.next()) {
            (Some(start), None) => Some(start),
            _ => None,
        }
    }

    /// All edges leaving `source`, in declaration order.
    pub fn edges_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.source == source)
    }
}

/// A single typed action step in a graph.
///
/// `position` is cosmetic layout data from the authoring canvas and has no
/// runtime meaning. The `type`/`data` pair is a closed discriminated union;
/// see [`NodeData`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    #[serde(flatten)]
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<String>, data: NodeData) -> Self {
        Self {
            id: id.into(),
            position: Position::default(),
            data,
        }
    }
}

/// Canvas coordinates from the authoring tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A directed connection selecting the next step.
///
/// `source_handle` selects a branch (`"true"`/`"false"`) for conditional
/// nodes. For non-branching nodes it is unused: the first outgoing edge in
/// declaration order is followed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// An unlabelled edge with no branch handle.
    pub fn plain(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            label: None,
        }
    }

    /// A branch edge, e.g. the `"true"` or `"false"` leg of a condition.
    pub fn branch(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        handle: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: Some(handle.into()),
            label: None,
        }
    }
}

/// Declared scope of a variable.
///
/// Scope is metadata for the authoring tool only: the interpreter always
/// materializes one flat per-invocation map and never persists values across
/// invocations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    #[default]
    Local,
    Global,
    User,
    Server,
}

/// An authored variable declaration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    #[serde(default)]
    pub scope: VariableScope,
    /// Fallback used by GetVariable when the invocation has not set the
    /// variable yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An immutable snapshot of a graph at a specific version.
///
/// A new version is created on every semantic edit; exactly one version per
/// command is active at a time. The dispatch layer resolves invocations to
/// the active version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphVersion {
    pub version: u32,
    pub graph: Graph,
}

impl GraphVersion {
    pub fn new(version: u32, graph: Graph) -> Self {
        Self { version, graph }
    }
}
