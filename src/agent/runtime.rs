//! Action dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::actions::{ActionKind, ActionOutcome, ActionRequest};
use crate::agent::plugin::ChainPlugin;
use crate::agent::status::{AgentStatus, AgentStatusBoard};
use crate::error::RuntimeError;

/// Routes each action kind to the one plugin registered for it.
pub struct AgentRuntime {
    plugins: HashMap<ActionKind, Arc<dyn ChainPlugin>>,
    status: AgentStatusBoard,
}

impl AgentRuntime {
    pub fn new(status: AgentStatusBoard) -> Self {
        Self {
            plugins: HashMap::new(),
            status,
        }
    }

    /// Register a plugin for every action it supports. Later registrations win.
    pub fn register_plugin(&mut self, plugin: Arc<dyn ChainPlugin>) {
        for kind in plugin.supported_actions() {
            if let Some(previous) = self.plugins.insert(*kind, Arc::clone(&plugin)) {
                tracing::debug!(
                    action = %kind,
                    previous = previous.name(),
                    plugin = plugin.name(),
                    "Replacing plugin registration"
                );
            }
        }
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn ChainPlugin>) -> Self {
        self.register_plugin(plugin);
        self
    }

    pub fn status_board(&self) -> &AgentStatusBoard {
        &self.status
    }

    /// Run an action through its plugin, tracking the chain's agent slot.
    pub async fn execute_action(
        &self,
        action: &ActionRequest,
    ) -> Result<ActionOutcome, RuntimeError> {
        let kind = action.kind();
        let plugin = self
            .plugins
            .get(&kind)
            .ok_or_else(|| RuntimeError::NoPluginForAction {
                action: kind.as_str().to_string(),
            })?;

        let chain = action.chain();
        tracing::debug!(action = %kind, chain, plugin = plugin.name(), "Dispatching action");
        self.status.set_status(chain, AgentStatus::Active);

        match plugin.execute(action).await {
            Ok(outcome) => {
                self.status.set_status(chain, AgentStatus::Idle);
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(action = %kind, chain, "Action failed: {}", e);
                self.status.set_status(chain, AgentStatus::Error);
                Err(e)
            }
        }
    }

    /// Entry point for callers holding an action name and JSON parameters.
    pub async fn execute_named(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> Result<ActionOutcome, RuntimeError> {
        let kind = ActionKind::from_name(name).ok_or_else(|| RuntimeError::NoPluginForAction {
            action: name.to_string(),
        })?;
        let action =
            ActionRequest::from_named(kind, params).map_err(|e| RuntimeError::InvalidParameters {
                action: name.to_string(),
                reason: e.to_string(),
            })?;
        self.execute_action(&action).await
    }
}
