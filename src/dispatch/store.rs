//! Persistence read/write surfaces consumed by the router, plus in-memory
//! implementations for tests and embedding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::registry::CommandSpec;
use crate::model::GraphVersion;

/// One row per (tenant, project): whether that project's commands are
/// currently registered in that tenant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub tenant_id: String,
    pub project_id: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl DeploymentRecord {
    pub fn active(tenant_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            project_id: project_id.into(),
            is_active: true,
            updated_at: Utc::now(),
        }
    }
}

/// Failures from the persistence collaborator.
#[derive(Debug, Error, Diagnostic)]
#[error("deployment store error: {message}")]
#[diagnostic(code(botflow::dispatch::store))]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Read/write surface over persisted deployment records.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// All records for `tenant_id` with `is_active == true`.
    async fn active_deployments(&self, tenant_id: &str)
    -> Result<Vec<DeploymentRecord>, StoreError>;

    /// Insert or overwrite the record for (record.tenant_id, record.project_id).
    async fn upsert(&self, record: DeploymentRecord) -> Result<(), StoreError>;

    /// Mark every record for `tenant_id` inactive (tenant-leave).
    async fn deactivate_all(&self, tenant_id: &str) -> Result<(), StoreError>;
}

/// Read surface over project content: enabled commands and active graph
/// versions.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn enabled_commands(&self, project_id: &str) -> Result<Vec<CommandSpec>, StoreError>;

    /// The active graph version for (project, command name), if any.
    async fn active_graph(
        &self,
        project_id: &str,
        command_name: &str,
    ) -> Result<Option<GraphVersion>, StoreError>;
}

/// In-memory deployment table keyed by (tenant, project).
#[derive(Debug, Default)]
pub struct InMemoryDeploymentStore {
    records: RwLock<FxHashMap<(String, String), DeploymentRecord>>,
}

impl InMemoryDeploymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record, for test assertions.
    #[must_use]
    pub fn all(&self) -> Vec<DeploymentRecord> {
        self.records.read().values().cloned().collect()
    }
}

#[async_trait]
impl DeploymentStore for InMemoryDeploymentStore {
    async fn active_deployments(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<DeploymentRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.is_active)
            .cloned()
            .collect())
    }

    async fn upsert(&self, record: DeploymentRecord) -> Result<(), StoreError> {
        self.records.write().insert(
            (record.tenant_id.clone(), record.project_id.clone()),
            record,
        );
        Ok(())
    }

    async fn deactivate_all(&self, tenant_id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write();
        for record in records.values_mut() {
            if record.tenant_id == tenant_id {
                record.is_active = false;
                record.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

/// In-memory project content: commands per project and active graph versions
/// per (project, command).
#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    commands: RwLock<FxHashMap<String, Vec<CommandSpec>>>,
    graphs: RwLock<FxHashMap<(String, String), GraphVersion>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_commands(&self, project_id: impl Into<String>, commands: Vec<CommandSpec>) {
        self.commands.write().insert(project_id.into(), commands);
    }

    /// Activate a graph version for (project, command), replacing any prior
    /// active version — exactly one version per command is active at a time.
    pub fn set_active_graph(
        &self,
        project_id: impl Into<String>,
        command_name: impl Into<String>,
        version: GraphVersion,
    ) {
        self.graphs
            .write()
            .insert((project_id.into(), command_name.into()), version);
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn enabled_commands(&self, project_id: &str) -> Result<Vec<CommandSpec>, StoreError> {
        Ok(self
            .commands
            .read()
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn active_graph(
        &self,
        project_id: &str,
        command_name: &str,
    ) -> Result<Option<GraphVersion>, StoreError> {
        Ok(self
            .graphs
            .read()
            .get(&(project_id.to_string(), command_name.to_string()))
            .cloned())
    }
}
