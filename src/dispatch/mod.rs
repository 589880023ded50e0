//! Dispatch & deployment: which graph runs for which command in which tenant.
//!
//! The read path is an in-memory (tenant → command name → project) index — a
//! rebuildable cache over persisted deployment records, never the source of
//! truth. Deploy and undeploy always push a tenant's *complete* command set to
//! the platform registry as a full replace; partial updates would silently
//! resurrect or duplicate stale commands.

mod registry;
mod router;
mod store;

pub use registry::{
    CommandOption, CommandRegistration, CommandRegistry, CommandSpec, OptionKind,
    RegistrationError,
};
pub use router::{DispatchError, DispatchRouter};
pub use store::{
    DeploymentRecord, DeploymentStore, InMemoryDeploymentStore, InMemoryProjectStore,
    ProjectStore, StoreError,
};
