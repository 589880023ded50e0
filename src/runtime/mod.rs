//! Graph execution: one traversal algorithm, two effect backends.
//!
//! The [`engine`] walks a graph node by node, delegating each node to its
//! handler and every side effect to an injected [`effects::EffectSink`]. The
//! [`live`] backend realizes effects against the chat platform under a
//! wall-clock execution budget; the [`simulate`] backend records effects into
//! a trace for the authoring tool. Branching and flow logic exist exactly
//! once, in the engine, so the two backends cannot drift.

pub mod context;
pub mod effects;
pub mod engine;
pub mod handlers;
pub mod interpolate;
pub mod live;
pub mod simulate;

pub use context::InvocationContext;
pub use effects::{ActionError, EffectSink, ExternalAction, Output};
pub use engine::{EngineError, RunStatus};
