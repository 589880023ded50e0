//! Per-invocation runtime state.

use rustc_hash::FxHashMap;
use serde_json::Value;
use uuid::Uuid;

/// The user who triggered the invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invoker {
    pub id: String,
    pub username: String,
}

/// The guild (tenant workspace) an invocation arrived from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildRef {
    pub id: String,
    pub name: Option<String>,
}

/// The channel an invocation arrived from; replies go back here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: String,
    pub name: Option<String>,
}

/// Runtime-only state for one command invocation.
///
/// Created fresh when an invocation arrives and discarded at completion.
/// The variable map is a single flat name → value store regardless of the
/// scope declared in the graph schema; nothing here is persisted or shared
/// across invocations.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    pub invocation_id: Uuid,
    pub user: Invoker,
    pub guild: GuildRef,
    pub channel: ChannelRef,
    /// Flat per-invocation variable store. Seeded from the invocation's
    /// command options, mutated by SetVariable/Random/Math/AwaitReply nodes.
    pub variables: FxHashMap<String, Value>,
    /// Reply state: false until the first message/embed has used the primary
    /// response channel; every output after that uses follow-up.
    pub has_replied: bool,
}

impl InvocationContext {
    pub fn new(user: Invoker, guild: GuildRef, channel: ChannelRef) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            user,
            guild,
            channel,
            variables: FxHashMap::default(),
            has_replied: false,
        }
    }

    /// Seed a variable before execution starts (command options, fixtures).
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Merge a batch of pre-set variables, e.g. the invocation's options.
    #[must_use]
    pub fn with_variables(mut self, vars: FxHashMap<String, Value>) -> Self {
        self.variables.extend(vars);
        self
    }

    /// A context with placeholder identity, for simulations and tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self::new(
            Invoker {
                id: "100000000000000001".into(),
                username: "testuser".into(),
            },
            GuildRef {
                id: "200000000000000001".into(),
                name: Some("Test Guild".into()),
            },
            ChannelRef {
                id: "300000000000000001".into(),
                name: Some("general".into()),
            },
        )
    }
}
