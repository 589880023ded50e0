//! # Botflow: Command-Graph Runtime for Chat Bots
//!
//! Botflow executes visually-authored chat-bot commands. An authoring tool
//! produces a [`model::Graph`] — a directed graph of typed action nodes — which
//! is persisted as an immutable versioned document and executed against live
//! chat-platform invocations.
//!
//! ## Core Concepts
//!
//! - **Graph**: Nodes, edges and variable declarations describing one command
//! - **Engine**: A single traversal/branch-selection algorithm, parameterized
//!   by an effect interface
//! - **Backends**: A live executor talking to the platform, and an offline
//!   simulator recording a trace for the authoring tool
//! - **Dispatch**: Multi-tenant routing from (tenant, command name) to the
//!   active graph version, kept in sync with the platform command registry
//!
//! ## Quick Start
//!
//! ### Simulating a graph
//!
//! ```
//! use botflow::model::{Graph, Node, NodeData, Edge};
//! use botflow::runtime::context::InvocationContext;
//! use botflow::runtime::simulate::simulate_seeded;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let graph = Graph {
//!     nodes: vec![
//!         Node::new("start", NodeData::Start {}),
//!         Node::new("say", NodeData::SendMessage { content: "hello {user.username}".into() }),
//!         Node::new("end", NodeData::End {}),
//!     ],
//!     edges: vec![Edge::plain("e1", "start", "say"), Edge::plain("e2", "say", "end")],
//!     variables: Default::default(),
//! };
//!
//! let ctx = InvocationContext::for_testing();
//! let report = simulate_seeded(&graph, ctx, 42).await;
//! assert_eq!(report.outputs.len(), 1);
//! # }
//! ```
//!
//! ### Deploying commands for a tenant
//!
//! Deployment always pushes the *complete* command set for a tenant as a full
//! replace, never an incremental delta; see [`dispatch::DispatchRouter`].
//!
//! ## Module Guide
//!
//! - [`model`] - Graph document schema and structural validation
//! - [`runtime`] - Traversal engine, action handlers, interpolation, backends
//! - [`dispatch`] - Deployment router and command-registry synchronisation
//! - [`service`] - Process-scoped bot service with start/stop lifecycle
//! - [`config`] - Environment-backed runtime configuration
//! - [`telemetry`] - Tracing subscriber setup

pub mod config;
pub mod dispatch;
pub mod model;
pub mod runtime;
pub mod service;
pub mod telemetry;
