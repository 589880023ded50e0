//! Graph document schema and structural validation.
//!
//! The types here describe the persisted artifact exchanged with the authoring
//! tool: a [`Graph`] of typed [`Node`]s connected by [`Edge`]s, plus the
//! variable declarations the author made. A graph is an immutable, versioned
//! document — every semantic edit produces a new [`GraphVersion`] and exactly
//! one version per command is active at a time.

mod graph;
mod node_data;
mod validate;

pub use graph::{Edge, Graph, GraphVersion, Node, Position, VariableDecl, VariableScope};
pub use node_data::{ConditionOperator, MathOperator, NodeData};
pub use validate::{GraphError, validate};
