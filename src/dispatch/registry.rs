//! The external command registry and its registration schema.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A project's enabled command as stored by the persistence collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
        }
    }
}

/// One typed option a command accepts from the end user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    #[default]
    String,
    Integer,
    Boolean,
    User,
    Channel,
}

/// A command in the external registration schema pushed to the platform.
///
/// Deliberately a separate type from [`CommandSpec`]: the stored shape and
/// the registration wire shape evolve independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandRegistration {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

impl From<&CommandSpec> for CommandRegistration {
    fn from(spec: &CommandSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            options: spec.options.clone(),
        }
    }
}

/// Registration failures, carrying the underlying platform message. These
/// propagate to the deploy/undeploy caller; there is no retry.
#[derive(Debug, Error, Diagnostic)]
#[error("command registration failed for tenant {tenant_id}: {message}")]
#[diagnostic(code(botflow::dispatch::registration))]
pub struct RegistrationError {
    pub tenant_id: String,
    pub message: String,
}

/// The platform's per-tenant command registration call.
///
/// `replace_commands` accepts the tenant's FULL command list every time:
/// registration is always a complete snapshot, never an incremental delta.
#[async_trait]
pub trait CommandRegistry: Send + Sync {
    async fn replace_commands(
        &self,
        tenant_id: &str,
        commands: Vec<CommandRegistration>,
    ) -> Result<(), RegistrationError>;
}
