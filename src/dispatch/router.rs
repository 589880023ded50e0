//! The deployment router: resolves invocations and keeps the platform
//! registry in sync with persisted deployment records.

use miette::Diagnostic;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::registry::{CommandRegistration, CommandRegistry, RegistrationError};
use super::store::{DeploymentRecord, DeploymentStore, ProjectStore, StoreError};
use crate::model::GraphVersion;

/// Failures surfaced by the router.
#[derive(Debug, Error, Diagnostic)]
pub enum DispatchError {
    #[error("no active deployment for command /{command_name} in tenant {tenant_id}")]
    #[diagnostic(
        code(botflow::dispatch::not_deployed),
        help("Deploy the owning project to this tenant first.")
    )]
    NotDeployed {
        tenant_id: String,
        command_name: String,
    },

    #[error("command /{command_name} is deployed but project {project_id} has no active graph for it")]
    #[diagnostic(code(botflow::dispatch::no_active_graph))]
    NoActiveGraph {
        project_id: String,
        command_name: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

/// Per-tenant command set computed from persisted records: for each command
/// name, the owning project and its registration payload.
struct TenantSnapshot {
    registrations: Vec<CommandRegistration>,
    owners: FxHashMap<String, String>,
}

/// Routes (tenant, command name) to (project, active graph version) and
/// drives platform command registration.
///
/// The in-memory index is a cache over the deployment store, populated
/// lazily on resolve and rebuilt on four events: successful deploy,
/// successful undeploy, tenant join, tenant leave. It is never mutated
/// before the external registration call has succeeded.
///
/// The read-modify-full-replace-write sequence in deploy/undeploy is guarded
/// by a per-tenant async mutex; concurrent calls for the same tenant are
/// serialized so the registry cannot diverge from the persisted records.
pub struct DispatchRouter {
    deployments: Arc<dyn DeploymentStore>,
    projects: Arc<dyn ProjectStore>,
    registry: Arc<dyn CommandRegistry>,
    /// tenant id -> command name -> project id
    index: RwLock<FxHashMap<String, FxHashMap<String, String>>>,
    tenant_locks: Mutex<FxHashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DispatchRouter {
    pub fn new(
        deployments: Arc<dyn DeploymentStore>,
        projects: Arc<dyn ProjectStore>,
        registry: Arc<dyn CommandRegistry>,
    ) -> Self {
        Self {
            deployments,
            projects,
            registry,
            index: RwLock::new(FxHashMap::default()),
            tenant_locks: Mutex::new(FxHashMap::default()),
        }
    }

    fn tenant_lock(&self, tenant_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.tenant_locks.lock();
        Arc::clone(
            locks
                .entry(tenant_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Compute the tenant's complete command set from persisted records,
    /// optionally excluding one project and/or force-including another.
    ///
    /// On a command-name collision between projects, the project listed last
    /// wins; projects are visited in sorted order with the force-included
    /// project last, so a fresh deploy takes over a contested name.
    async fn snapshot(
        &self,
        tenant_id: &str,
        exclude_project: Option<&str>,
        include_project: Option<&str>,
    ) -> Result<TenantSnapshot, StoreError> {
        let mut project_ids: Vec<String> = self
            .deployments
            .active_deployments(tenant_id)
            .await?
            .into_iter()
            .map(|r| r.project_id)
            .filter(|p| Some(p.as_str()) != exclude_project)
            .filter(|p| Some(p.as_str()) != include_project)
            .collect();
        project_ids.sort();
        if let Some(included) = include_project {
            project_ids.push(included.to_string());
        }

        let mut by_name: FxHashMap<String, (String, CommandRegistration)> = FxHashMap::default();
        for project_id in &project_ids {
            for spec in self.projects.enabled_commands(project_id).await? {
                if by_name.contains_key(&spec.name) {
                    warn!(
                        tenant = %tenant_id,
                        command = %spec.name,
                        project = %project_id,
                        "command name collision; later deployment wins"
                    );
                }
                by_name.insert(
                    spec.name.clone(),
                    (project_id.clone(), CommandRegistration::from(&spec)),
                );
            }
        }

        let mut owners = FxHashMap::default();
        let mut registrations = Vec::with_capacity(by_name.len());
        let mut names: Vec<String> = by_name.keys().cloned().collect();
        names.sort();
        for name in names {
            if let Some((project_id, registration)) = by_name.remove(&name) {
                owners.insert(name, project_id);
                registrations.push(registration);
            }
        }

        Ok(TenantSnapshot {
            registrations,
            owners,
        })
    }

    /// Register a project's enabled commands in a tenant.
    ///
    /// Pushes the tenant's FULL resulting command set (every other active
    /// deployment plus this project) as a complete replace, and only on
    /// success persists the deployment record and updates the index. Returns
    /// how many of the project's commands were registered.
    #[instrument(skip(self))]
    pub async fn deploy(&self, project_id: &str, tenant_id: &str) -> Result<usize, DispatchError> {
        let lock = self.tenant_lock(tenant_id);
        let _guard = lock.lock().await;

        let own_count = self.projects.enabled_commands(project_id).await?.len();
        let snapshot = self.snapshot(tenant_id, None, Some(project_id)).await?;
        self.registry
            .replace_commands(tenant_id, snapshot.registrations)
            .await?;

        self.deployments
            .upsert(DeploymentRecord::active(tenant_id, project_id))
            .await?;
        self.index
            .write()
            .insert(tenant_id.to_string(), snapshot.owners);

        info!(tenant = %tenant_id, project = %project_id, commands = own_count, "deployed");
        Ok(own_count)
    }

    /// Remove a project's commands from a tenant.
    ///
    /// Recomputes the remaining set as the union across all *other* active
    /// deployments, pushes it as a complete replace, and only on success
    /// deactivates the record and updates the index.
    #[instrument(skip(self))]
    pub async fn undeploy(&self, project_id: &str, tenant_id: &str) -> Result<(), DispatchError> {
        let lock = self.tenant_lock(tenant_id);
        let _guard = lock.lock().await;

        let snapshot = self.snapshot(tenant_id, Some(project_id), None).await?;
        self.registry
            .replace_commands(tenant_id, snapshot.registrations)
            .await?;

        let mut record = DeploymentRecord::active(tenant_id, project_id);
        record.is_active = false;
        self.deployments.upsert(record).await?;
        self.index
            .write()
            .insert(tenant_id.to_string(), snapshot.owners);

        info!(tenant = %tenant_id, project = %project_id, "undeployed");
        Ok(())
    }

    /// Full resync when the bot joins a tenant: re-register every active
    /// deployment's commands and rebuild the index entry.
    #[instrument(skip(self))]
    pub async fn tenant_joined(&self, tenant_id: &str) -> Result<usize, DispatchError> {
        let lock = self.tenant_lock(tenant_id);
        let _guard = lock.lock().await;

        let snapshot = self.snapshot(tenant_id, None, None).await?;
        let count = snapshot.registrations.len();
        self.registry
            .replace_commands(tenant_id, snapshot.registrations)
            .await?;
        self.index
            .write()
            .insert(tenant_id.to_string(), snapshot.owners);

        info!(tenant = %tenant_id, commands = count, "tenant joined; resynced");
        Ok(count)
    }

    /// The bot left (or was removed from) a tenant: mark its deployments
    /// inactive and drop the index entry. The platform already dropped our
    /// registrations, so nothing is pushed.
    #[instrument(skip(self))]
    pub async fn tenant_left(&self, tenant_id: &str) -> Result<(), DispatchError> {
        let lock = self.tenant_lock(tenant_id);
        let _guard = lock.lock().await;

        self.deployments.deactivate_all(tenant_id).await?;
        self.index.write().remove(tenant_id);
        // Drop the tenant's lock entry too, or the map grows one entry per
        // tenant ever seen. Waiters keep the mutex alive via their own Arc.
        self.tenant_locks.lock().remove(tenant_id);

        info!(tenant = %tenant_id, "tenant left; deployments deactivated");
        Ok(())
    }

    /// Resolve an incoming invocation to the owning project and the active
    /// graph version for its command.
    pub async fn resolve(
        &self,
        tenant_id: &str,
        command_name: &str,
    ) -> Result<(String, GraphVersion), DispatchError> {
        let cached = self
            .index
            .read()
            .get(tenant_id)
            .and_then(|commands| commands.get(command_name))
            .cloned();

        let project_id = match cached {
            Some(project_id) => project_id,
            None => {
                // Lazy fill: rebuild this tenant's entry from persisted
                // records, under the tenant lock so a concurrent deploy
                // cannot interleave.
                let lock = self.tenant_lock(tenant_id);
                let _guard = lock.lock().await;
                let snapshot = self.snapshot(tenant_id, None, None).await?;
                let project = snapshot.owners.get(command_name).cloned();
                self.index
                    .write()
                    .insert(tenant_id.to_string(), snapshot.owners);
                project.ok_or_else(|| DispatchError::NotDeployed {
                    tenant_id: tenant_id.to_string(),
                    command_name: command_name.to_string(),
                })?
            }
        };

        let graph = self
            .projects
            .active_graph(&project_id, command_name)
            .await?
            .ok_or_else(|| DispatchError::NoActiveGraph {
                project_id: project_id.clone(),
                command_name: command_name.to_string(),
            })?;

        Ok((project_id, graph))
    }
}
