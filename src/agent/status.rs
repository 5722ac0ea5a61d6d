//! Fixed-size agent status board.

use std::sync::{Arc, RwLock};

use serde::Serialize;

/// Number of slots on the board.
pub const AGENT_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Active,
    Error,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentState {
    pub id: String,
    pub chain: String,
    pub status: AgentStatus,
}

/// Shared board of per-chain agent slots.
///
/// Cloning shares the same slots. Chains without a slot are ignored.
#[derive(Debug, Clone)]
pub struct AgentStatusBoard {
    slots: Arc<RwLock<[AgentState; AGENT_SLOTS]>>,
}

impl AgentStatusBoard {
    /// Build the board from configured chains. Missing slots reuse the last chain.
    pub fn new(chains: &[String]) -> Self {
        let fallback = chains
            .last()
            .cloned()
            .unwrap_or_else(|| crate::settings::DEFAULT_CHAIN.to_string());
        let slots = std::array::from_fn(|index| AgentState {
            id: format!("agent-{}", index + 1),
            chain: chains.get(index).cloned().unwrap_or_else(|| fallback.clone()),
            status: AgentStatus::Idle,
        });
        Self {
            slots: Arc::new(RwLock::new(slots)),
        }
    }

    /// Set the status of every slot watching `chain`. Returns whether any slot matched.
    pub fn set_status(&self, chain: &str, status: AgentStatus) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let mut matched = false;
        for slot in slots.iter_mut().filter(|slot| slot.chain == chain) {
            slot.status = status;
            matched = true;
        }
        matched
    }

    pub fn snapshot(&self) -> Vec<AgentState> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.to_vec()
    }
}
