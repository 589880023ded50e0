//! Fake platform collaborators for integration tests.

use async_trait::async_trait;
use botflow::dispatch::{CommandRegistration, CommandRegistry, RegistrationError};
use botflow::runtime::context::{ChannelRef, GuildRef, Invoker};
use botflow::runtime::effects::Output;
use botflow::runtime::live::{PlatformConnection, PlatformError};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Which reply channel an output went through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SentVia {
    Primary,
    FollowUp,
}

#[derive(Clone, Debug)]
pub struct SentOutput {
    pub via: SentVia,
    pub output: Output,
}

/// Records every platform interaction; optionally fails sends.
#[derive(Default)]
pub struct RecordingConnection {
    pub sent: Mutex<Vec<SentOutput>>,
    pub role_changes: Mutex<Vec<(String, bool)>>,
    pub fail_sends: AtomicBool,
    pub connected: AtomicBool,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_contents(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match &s.output {
                Output::Message { content } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn channels_used(&self) -> Vec<SentVia> {
        self.sent.lock().iter().map(|s| s.via).collect()
    }

    fn record(&self, via: SentVia, output: &Output) -> Result<(), PlatformError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(PlatformError::Request {
                message: "injected send failure".into(),
            });
        }
        self.sent.lock().push(SentOutput {
            via,
            output: output.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl PlatformConnection for RecordingConnection {
    async fn connect(&self) -> Result<(), PlatformError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn respond(&self, _channel: &ChannelRef, output: &Output) -> Result<(), PlatformError> {
        self.record(SentVia::Primary, output)
    }

    async fn follow_up(&self, _channel: &ChannelRef, output: &Output) -> Result<(), PlatformError> {
        self.record(SentVia::FollowUp, output)
    }

    async fn add_role(
        &self,
        _guild: &GuildRef,
        _user: &Invoker,
        role_id: &str,
    ) -> Result<(), PlatformError> {
        self.role_changes.lock().push((role_id.to_string(), true));
        Ok(())
    }

    async fn remove_role(
        &self,
        _guild: &GuildRef,
        _user: &Invoker,
        role_id: &str,
    ) -> Result<(), PlatformError> {
        self.role_changes.lock().push((role_id.to_string(), false));
        Ok(())
    }

    async fn api_call(&self, url: &str, _method: &str) -> Result<Value, PlatformError> {
        Ok(json!({ "url": url, "ok": true }))
    }

    async fn await_reply(
        &self,
        _channel: &ChannelRef,
        _user: &Invoker,
        _prompt: &str,
        _timeout_ms: Option<u64>,
    ) -> Result<Value, PlatformError> {
        Ok(Value::String("stub reply".into()))
    }
}

/// Records every full-replace push; optionally fails or delays pushes.
#[derive(Default)]
pub struct RecordingRegistry {
    pub pushes: Mutex<Vec<(String, Vec<CommandRegistration>)>>,
    pub fail_pushes: AtomicBool,
    pub push_delay_ms: AtomicU64,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command names in the most recent push for `tenant_id`, sorted.
    pub fn last_push_names(&self, tenant_id: &str) -> Option<Vec<String>> {
        let pushes = self.pushes.lock();
        pushes
            .iter()
            .rev()
            .find(|(tenant, _)| tenant == tenant_id)
            .map(|(_, commands)| {
                let mut names: Vec<String> = commands.iter().map(|c| c.name.clone()).collect();
                names.sort();
                names
            })
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().len()
    }
}

#[async_trait]
impl CommandRegistry for RecordingRegistry {
    async fn replace_commands(
        &self,
        tenant_id: &str,
        commands: Vec<CommandRegistration>,
    ) -> Result<(), RegistrationError> {
        let delay = self.push_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(RegistrationError {
                tenant_id: tenant_id.to_string(),
                message: "injected registration failure".into(),
            });
        }
        self.pushes
            .lock()
            .push((tenant_id.to_string(), commands));
        Ok(())
    }
}
