//! Offline simulation for authoring and testing.
//!
//! Runs the exact engine the live backend runs, but records every effect into
//! a trace instead of contacting the platform. Delays are clamped to a small
//! cap so interactive testing stays fast (the trace still reports the nominal
//! requested duration), and the walk is bounded by a step limit — the offline
//! analogue of the live wall-clock budget, since a cyclic graph is otherwise
//! unbounded.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

use super::context::InvocationContext;
use super::effects::{ActionError, EffectSink, ExternalAction, Output};
use super::engine::{self, EngineError, RunStatus};
use crate::model::{Graph, Node};

/// Upper bound applied to each simulated Delay node.
pub const SIMULATION_DELAY_CAP_MS: u64 = 50;

/// Maximum nodes one simulation may visit before it is aborted.
pub const SIMULATION_STEP_LIMIT: u32 = 1_000;

/// One entry in the simulation trace, in execution order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceStep {
    pub index: u32,
    pub node_id: String,
    pub kind: &'static str,
    /// Human-readable detail for the authoring tool (emitted content,
    /// nominal delay durations, external actions and their stubbed results).
    pub detail: String,
}

/// How the simulated walk finished.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SimulationStatus {
    /// Reached an End node.
    Ended,
    /// Stopped silently on a missing outgoing edge (success, by policy).
    QuietStop,
    /// A node handler failed; `message` carries the detail the live backend
    /// would only log.
    Failed { node_id: String, message: String },
    /// The step bound tripped, almost certainly a cycle.
    StepLimit,
}

/// Everything the authoring tool needs to show a test run.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub status: SimulationStatus,
    pub steps: Vec<TraceStep>,
    /// Message/embed/variable-read emissions, in execution order.
    pub outputs: Vec<Output>,
    pub final_variables: FxHashMap<String, Value>,
}

/// Effect sink that records instead of sending.
struct SimulationSink {
    steps: Vec<TraceStep>,
    outputs: Vec<Output>,
    rng: StdRng,
    index: u32,
}

impl SimulationSink {
    fn seeded(seed: u64) -> Self {
        Self {
            steps: Vec::new(),
            outputs: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            index: 0,
        }
    }

    fn annotate(&mut self, detail: String) {
        if let Some(last) = self.steps.last_mut() {
            last.detail = detail;
        }
    }
}

#[async_trait]
impl EffectSink for SimulationSink {
    fn node_started(&mut self, node: &Node) {
        self.index += 1;
        let index = self.index;
        self.steps.push(TraceStep {
            index,
            node_id: node.id.clone(),
            kind: node.data.kind(),
            detail: String::new(),
        });
    }

    async fn emit(
        &mut self,
        ctx: &mut InvocationContext,
        output: Output,
    ) -> Result<(), ActionError> {
        match &output {
            Output::Message { content } => self.annotate(format!("message: {content}")),
            Output::Embed { title, .. } => self.annotate(format!("embed: {title}")),
            Output::VariableRead { name, value } => self.annotate(format!("read {name} = {value}")),
        }
        // The simulator mirrors the live reply state machine so authors see
        // which emission would have been the primary response.
        if !matches!(output, Output::VariableRead { .. }) {
            ctx.has_replied = true;
        }
        self.outputs.push(output);
        Ok(())
    }

    async fn perform(
        &mut self,
        _ctx: &mut InvocationContext,
        action: ExternalAction,
    ) -> Result<Value, ActionError> {
        let (detail, result) = match &action {
            ExternalAction::AddRole { role_id } => {
                (format!("would add role {role_id}"), Value::Null)
            }
            ExternalAction::RemoveRole { role_id } => {
                (format!("would remove role {role_id}"), Value::Null)
            }
            ExternalAction::ApiCall { url, method } => (
                format!("would call {method} {url}"),
                json!({ "simulated": true }),
            ),
            ExternalAction::AwaitReply { prompt, .. } => (
                format!("would prompt: {prompt}"),
                Value::String("simulated reply".to_string()),
            ),
        };
        self.annotate(detail);
        Ok(result)
    }

    async fn delay(&mut self, requested_ms: u64) {
        let clamped = requested_ms.min(SIMULATION_DELAY_CAP_MS);
        self.annotate(format!("delay {requested_ms} ms (clamped to {clamped} ms)"));
        tokio::time::sleep(Duration::from_millis(clamped)).await;
    }

    fn random_range(&mut self, min: i64, max: i64) -> i64 {
        let sample = self.rng.random_range(min..=max);
        self.annotate(format!("random [{min}, {max}] -> {sample}"));
        sample
    }

    fn step_limit(&self) -> Option<u32> {
        Some(SIMULATION_STEP_LIMIT)
    }
}

/// Simulate a graph with an entropy-derived random seed.
pub async fn simulate(graph: &Graph, ctx: InvocationContext) -> SimulationReport {
    simulate_seeded(graph, ctx, rand::rng().random()).await
}

/// Simulate a graph with a fixed seed: two runs with the same graph, context
/// and seed produce identical traces and outputs.
pub async fn simulate_seeded(graph: &Graph, ctx: InvocationContext, seed: u64) -> SimulationReport {
    let mut ctx = ctx;
    let mut sink = SimulationSink::seeded(seed);

    let status = match engine::run(graph, &mut ctx, &mut sink).await {
        Ok(RunStatus::Ended) => SimulationStatus::Ended,
        Ok(RunStatus::QuietStop) => SimulationStatus::QuietStop,
        Err(EngineError::StepLimitExceeded { .. }) => SimulationStatus::StepLimit,
        Err(EngineError::Node {
            node_id, source, ..
        }) => SimulationStatus::Failed {
            node_id,
            message: source.to_string(),
        },
        Err(other) => SimulationStatus::Failed {
            node_id: String::new(),
            message: other.to_string(),
        },
    };

    SimulationReport {
        status,
        steps: sink.steps,
        outputs: sink.outputs,
        final_variables: ctx.variables,
    }
}
