//! The effect interface separating flow logic from side-effect realization.
//!
//! Handlers compute *what* should happen; an [`EffectSink`] decides *how* it
//! happens. The live backend sends messages and performs platform calls; the
//! simulation backend records everything into a trace. Because the engine and
//! handlers only ever talk to this trait, branching and flow logic are
//! defined exactly once.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::context::InvocationContext;
use crate::model::Node;

/// Something a node wants delivered to the caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Output {
    /// A plain chat message, already interpolated.
    Message { content: String },
    /// A rich embed, already interpolated.
    Embed {
        title: String,
        description: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        footer: Option<String>,
    },
    /// A GetVariable read, recorded for traceability. Live backends log it;
    /// it is never sent to the platform and never consumes the primary reply.
    VariableRead { name: String, value: Value },
}

/// An external platform action delegated wholesale to the backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ExternalAction {
    AddRole {
        role_id: String,
    },
    RemoveRole {
        role_id: String,
    },
    ApiCall {
        url: String,
        method: String,
    },
    AwaitReply {
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

/// Failures raised while realizing a node's effect.
///
/// These are caught at the node boundary by the engine: detail is logged,
/// the end user sees one generic failure message, and traversal stops.
#[derive(Debug, Error, Diagnostic)]
pub enum ActionError {
    #[error("malformed node data: {reason}")]
    #[diagnostic(
        code(botflow::runtime::malformed_node),
        help("The authoring tool saved data this node type cannot execute.")
    )]
    MalformedNode { reason: String },

    #[error("platform send failed: {message}")]
    #[diagnostic(code(botflow::runtime::platform_send))]
    PlatformSend { message: String },

    #[error("external action failed ({action}): {message}")]
    #[diagnostic(code(botflow::runtime::external_action))]
    External { action: &'static str, message: String },
}

/// The injected side-effect backend for one invocation.
///
/// Implementations must deliver emissions strictly in call order; the engine
/// awaits each effect to completion before the next node begins, so there is
/// never concurrent sending within one invocation.
#[async_trait]
pub trait EffectSink: Send {
    /// Called when traversal enters a node, before its handler runs.
    fn node_started(&mut self, _node: &Node) {}

    /// Deliver an output to the caller (platform reply channel or trace).
    async fn emit(
        &mut self,
        ctx: &mut InvocationContext,
        output: Output,
    ) -> Result<(), ActionError>;

    /// Perform an external action and return its result value (the awaited
    /// reply, the API response body, or null for fire-and-forget actions).
    async fn perform(
        &mut self,
        ctx: &mut InvocationContext,
        action: ExternalAction,
    ) -> Result<Value, ActionError>;

    /// Pause traversal. Backends may clamp the requested duration; `requested_ms`
    /// is always the nominal value from the node.
    async fn delay(&mut self, requested_ms: u64);

    /// Sample an integer uniformly in `[min, max]` inclusive. This is the
    /// only nondeterminism seam in the engine, so a seeded sink makes whole
    /// executions reproducible.
    fn random_range(&mut self, min: i64, max: i64) -> i64;

    /// Optional bound on the number of nodes one run may visit. `None` means
    /// unbounded (the live backend relies on its wall-clock budget instead).
    fn step_limit(&self) -> Option<u32> {
        None
    }
}
