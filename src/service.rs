//! The process-scoped bot service: one platform connection, one dispatch
//! router, an explicit start/stop lifecycle.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::dispatch::{DispatchError, DispatchRouter};
use crate::runtime::context::{ChannelRef, GuildRef, InvocationContext, Invoker};
use crate::runtime::engine::{EngineError, RunStatus};
use crate::runtime::live::{LiveRunner, PlatformConnection, PlatformError};

/// An incoming command invocation as delivered by the platform gateway.
#[derive(Clone, Debug)]
pub struct InvocationEvent {
    pub tenant_id: String,
    pub command_name: String,
    pub user_id: String,
    pub username: String,
    pub channel_id: String,
    pub channel_name: Option<String>,
    /// Command options supplied by the end user; they seed the invocation's
    /// variable map under their option names.
    pub options: FxHashMap<String, Value>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    #[error("service is not started")]
    #[diagnostic(
        code(botflow::service::not_started),
        help("Call BotService::start before handling invocations.")
    )]
    NotStarted,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Platform(#[from] PlatformError),
}

/// Owns the single long-lived platform connection and wires invocations
/// through dispatch resolution into live graph execution.
///
/// Multiple invocations may be in flight concurrently; each gets a fresh
/// [`InvocationContext`] and nothing is shared between them except the
/// connection and the router's index.
pub struct BotService {
    config: Config,
    conn: Arc<dyn PlatformConnection>,
    router: Arc<DispatchRouter>,
    runner: LiveRunner,
    started: AtomicBool,
}

impl BotService {
    pub fn new(
        config: Config,
        conn: Arc<dyn PlatformConnection>,
        router: Arc<DispatchRouter>,
    ) -> Self {
        let runner = LiveRunner::new(Arc::clone(&conn)).with_budget(config.execution_budget);
        Self {
            config,
            conn,
            router,
            runner,
            started: AtomicBool::new(false),
        }
    }

    pub fn router(&self) -> &Arc<DispatchRouter> {
        &self.router
    }

    /// Open the platform connection.
    pub async fn start(&self) -> Result<(), ServiceError> {
        self.conn.connect().await?;
        self.started.store(true, Ordering::SeqCst);
        info!(application_id = %self.config.application_id, "bot service started");
        Ok(())
    }

    /// Close the platform connection. In-flight invocations are not awaited.
    pub async fn stop(&self) {
        self.started.store(false, Ordering::SeqCst);
        self.conn.disconnect().await;
        info!("bot service stopped");
    }

    /// Handle one incoming invocation end to end.
    ///
    /// Resolution failures (unknown command, no active graph) propagate to
    /// the caller untouched. Execution failures are logged in detail, the
    /// end user receives one generic failure message, and the error is then
    /// returned.
    #[instrument(skip_all, fields(tenant = %event.tenant_id, command = %event.command_name))]
    pub async fn handle_invocation(
        &self,
        event: InvocationEvent,
    ) -> Result<RunStatus, ServiceError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(ServiceError::NotStarted);
        }

        let (project_id, version) = self
            .router
            .resolve(&event.tenant_id, &event.command_name)
            .await?;
        info!(project = %project_id, version = version.version, "resolved invocation");

        let mut ctx = InvocationContext::new(
            Invoker {
                id: event.user_id,
                username: event.username,
            },
            GuildRef {
                id: event.tenant_id,
                name: None,
            },
            ChannelRef {
                id: event.channel_id,
                name: event.channel_name,
            },
        )
        .with_variables(event.options);

        match self.runner.execute(&version.graph, &mut ctx).await {
            Ok(status) => Ok(status),
            Err(err) => {
                error!(invocation = %ctx.invocation_id, error = %err, "invocation failed");
                self.runner.report_failure(&mut ctx).await;
                Err(ServiceError::Engine(err))
            }
        }
    }
}
