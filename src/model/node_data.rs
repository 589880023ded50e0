//! The closed set of node types and their variant-specific payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Variant-specific payload of a node, discriminated by the node's `type`
/// field on the wire.
///
/// The set is closed: the engine, both effect backends and the authoring
/// schema dispatch over it with exhaustive matches, so adding a node type is
/// a compile-time-checked change everywhere at once.
///
/// # Wire format
///
/// Each node serializes as `{ "id": …, "position": …, "type": "<variant>",
/// "data": { …payload… } }` with camelCase variant names, e.g.
///
/// ```json
/// { "id": "n2", "type": "sendMessage", "data": { "content": "hi {user.username}" } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum NodeData {
    /// Entry marker. Exactly one per graph; does nothing.
    Start {},
    /// Interpolates `content` and emits it as a chat message.
    SendMessage { content: String },
    /// Interpolates all text fields and emits a rich embed.
    SendEmbed {
        title: String,
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        footer: Option<String>,
    },
    /// Two-way branch over (variable value, literal compare value).
    IfCondition {
        variable: String,
        operator: ConditionOperator,
        #[serde(default)]
        value: String,
    },
    /// Writes `variables[name] = value`, interpolating the value first.
    SetVariable { name: String, value: String },
    /// Reads `variables[name]` (falling back to the declared default) and
    /// records it as an output for traceability.
    GetVariable { name: String },
    /// Prompts the invoking user and waits for their next message, storing
    /// the reply into a variable. Delegated to the platform backend.
    AwaitReply {
        prompt: String,
        store_as: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Grants a role to the invoking user.
    AddRole { role_id: String },
    /// Removes a role from the invoking user.
    RemoveRole { role_id: String },
    /// Performs an HTTP call via the platform backend, optionally storing
    /// the response body into a variable.
    ApiCall {
        url: String,
        #[serde(default = "default_method")]
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        store_as: Option<String>,
    },
    /// Pauses for `duration` milliseconds (clamped in simulation).
    Delay { duration: u64 },
    /// Samples an integer uniformly in `[min, max]` inclusive.
    Random {
        min: i64,
        max: i64,
        store_as: String,
    },
    /// Applies an arithmetic operator over two interpolated numeric operands.
    /// Divide/modulo by zero yields 0, never an error.
    MathOperation {
        operator: MathOperator,
        left: String,
        right: String,
        store_as: String,
    },
    /// Terminal marker; traversal stops successfully.
    End {},
}

fn default_method() -> String {
    "GET".to_string()
}

impl NodeData {
    /// Stable lowercase name of the variant, used in traces and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            NodeData::Start {} => "start",
            NodeData::SendMessage { .. } => "sendMessage",
            NodeData::SendEmbed { .. } => "sendEmbed",
            NodeData::IfCondition { .. } => "ifCondition",
            NodeData::SetVariable { .. } => "setVariable",
            NodeData::GetVariable { .. } => "getVariable",
            NodeData::AwaitReply { .. } => "awaitReply",
            NodeData::AddRole { .. } => "addRole",
            NodeData::RemoveRole { .. } => "removeRole",
            NodeData::ApiCall { .. } => "apiCall",
            NodeData::Delay { .. } => "delay",
            NodeData::Random { .. } => "random",
            NodeData::MathOperation { .. } => "mathOperation",
            NodeData::End {} => "end",
        }
    }

    /// Whether edge selection for this node inspects `source_handle`.
    #[must_use]
    pub fn is_branching(&self) -> bool {
        matches!(self, NodeData::IfCondition { .. })
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Comparison operators available to IfCondition nodes.
///
/// `GreaterThan`/`LessThan` coerce both operands with a number parse; a
/// non-numeric operand yields NaN comparisons, which evaluate false. No
/// operator ever errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
}

/// Arithmetic operators available to MathOperation nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}
