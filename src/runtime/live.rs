//! Live execution against the chat platform.
//!
//! [`LiveRunner`] realizes effects through a [`PlatformConnection`] and races
//! the whole walk against a wall-clock budget. One process owns one
//! connection; the trait exists so tests can substitute a fake.

use async_trait::async_trait;
use miette::Diagnostic;
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use super::context::{ChannelRef, GuildRef, InvocationContext, Invoker};
use super::effects::{ActionError, EffectSink, ExternalAction, Output};
use super::engine::{self, EngineError, RunStatus};
use crate::model::Graph;

/// What the end user sees when execution fails for any reason. Detail is
/// logged, never exposed.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while running this command. Please try again later.";

/// Default wall-clock budget for one live invocation.
pub const DEFAULT_EXECUTION_BUDGET: Duration = Duration::from_secs(10);

/// Errors surfaced by the platform connection.
#[derive(Debug, Error, Diagnostic)]
pub enum PlatformError {
    #[error("platform request failed: {message}")]
    #[diagnostic(code(botflow::platform::request))]
    Request { message: String },

    #[error("not connected to the platform")]
    #[diagnostic(
        code(botflow::platform::not_connected),
        help("Call BotService::start before handling invocations.")
    )]
    NotConnected,
}

/// The single long-lived connection to the chat platform.
///
/// Reply semantics: `respond` is the at-most-once primary response to the
/// originating request; `follow_up` is the unlimited secondary channel. The
/// runtime tracks which one applies via the invocation's reply state.
#[async_trait]
pub trait PlatformConnection: Send + Sync {
    async fn connect(&self) -> Result<(), PlatformError>;
    async fn disconnect(&self);

    /// Send the primary response to an invocation.
    async fn respond(&self, channel: &ChannelRef, output: &Output) -> Result<(), PlatformError>;

    /// Send a follow-up message for an invocation that already responded.
    async fn follow_up(&self, channel: &ChannelRef, output: &Output) -> Result<(), PlatformError>;

    async fn add_role(
        &self,
        guild: &GuildRef,
        user: &Invoker,
        role_id: &str,
    ) -> Result<(), PlatformError>;

    async fn remove_role(
        &self,
        guild: &GuildRef,
        user: &Invoker,
        role_id: &str,
    ) -> Result<(), PlatformError>;

    /// Perform an HTTP call on behalf of an ApiCall node, returning the
    /// response body as JSON.
    async fn api_call(&self, url: &str, method: &str) -> Result<Value, PlatformError>;

    /// Prompt the user and wait for their next message in the channel.
    async fn await_reply(
        &self,
        channel: &ChannelRef,
        user: &Invoker,
        prompt: &str,
        timeout_ms: Option<u64>,
    ) -> Result<Value, PlatformError>;
}

/// Effect sink realizing outputs and actions against the live connection.
struct LiveSink {
    conn: Arc<dyn PlatformConnection>,
}

#[async_trait]
impl EffectSink for LiveSink {
    async fn emit(
        &mut self,
        ctx: &mut InvocationContext,
        output: Output,
    ) -> Result<(), ActionError> {
        // Variable reads are trace-only; they never touch the platform and
        // never consume the primary response.
        if let Output::VariableRead { name, value } = &output {
            debug!(%name, %value, "variable read");
            return Ok(());
        }

        let result = if ctx.has_replied {
            self.conn.follow_up(&ctx.channel, &output).await
        } else {
            self.conn.respond(&ctx.channel, &output).await
        };
        result.map_err(|e| ActionError::PlatformSend {
            message: e.to_string(),
        })?;
        ctx.has_replied = true;
        Ok(())
    }

    async fn perform(
        &mut self,
        ctx: &mut InvocationContext,
        action: ExternalAction,
    ) -> Result<Value, ActionError> {
        let result = match &action {
            ExternalAction::AddRole { role_id } => self
                .conn
                .add_role(&ctx.guild, &ctx.user, role_id)
                .await
                .map(|()| Value::Null)
                .map_err(|e| external("addRole", e)),
            ExternalAction::RemoveRole { role_id } => self
                .conn
                .remove_role(&ctx.guild, &ctx.user, role_id)
                .await
                .map(|()| Value::Null)
                .map_err(|e| external("removeRole", e)),
            ExternalAction::ApiCall { url, method } => self
                .conn
                .api_call(url, method)
                .await
                .map_err(|e| external("apiCall", e)),
            ExternalAction::AwaitReply { prompt, timeout_ms } => self
                .conn
                .await_reply(&ctx.channel, &ctx.user, prompt, *timeout_ms)
                .await
                .map_err(|e| external("awaitReply", e)),
        };
        result
    }

    async fn delay(&mut self, requested_ms: u64) {
        tokio::time::sleep(Duration::from_millis(requested_ms)).await;
    }

    fn random_range(&mut self, min: i64, max: i64) -> i64 {
        rand::rng().random_range(min..=max)
    }
}

fn external(action: &'static str, e: PlatformError) -> ActionError {
    ActionError::External {
        action,
        message: e.to_string(),
    }
}

/// Executes graphs live, under a wall-clock budget.
#[derive(Clone)]
pub struct LiveRunner {
    conn: Arc<dyn PlatformConnection>,
    budget: Duration,
}

impl LiveRunner {
    pub fn new(conn: Arc<dyn PlatformConnection>) -> Self {
        Self {
            conn,
            budget: DEFAULT_EXECUTION_BUDGET,
        }
    }

    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Execute one invocation against the live platform.
    ///
    /// The full walk races the execution budget; overrunning it aborts the
    /// invocation with [`EngineError::Timeout`]. External calls already
    /// dispatched when the budget elapses are NOT cancelled — they may still
    /// land after the invocation has failed (fire-and-forget risk).
    #[instrument(skip_all, fields(invocation = %ctx.invocation_id, budget_ms = self.budget.as_millis() as u64))]
    pub async fn execute(
        &self,
        graph: &Graph,
        ctx: &mut InvocationContext,
    ) -> Result<RunStatus, EngineError> {
        let mut sink = LiveSink {
            conn: Arc::clone(&self.conn),
        };
        match tokio::time::timeout(self.budget, engine::run(graph, ctx, &mut sink)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout {
                budget_ms: self.budget.as_millis() as u64,
            }),
        }
    }

    /// Best-effort delivery of the generic failure message, using whichever
    /// of primary/follow-up the invocation is up to.
    pub async fn report_failure(&self, ctx: &mut InvocationContext) {
        let output = Output::Message {
            content: GENERIC_FAILURE_MESSAGE.to_string(),
        };
        let result = if ctx.has_replied {
            self.conn.follow_up(&ctx.channel, &output).await
        } else {
            self.conn.respond(&ctx.channel, &output).await
        };
        match result {
            Ok(()) => ctx.has_replied = true,
            Err(e) => debug!(error = %e, "failed to deliver failure message"),
        }
    }
}
