//! Intent parsing and action execution.

pub mod actions;
pub mod intent;
pub mod knowledge;
pub mod parser;
pub mod plugin;
pub mod router;
pub mod runtime;
pub mod status;

pub use actions::{
    ActionKind, ActionOutcome, ActionRequest, BalanceQuery, BalanceReport, SwapAction,
    TransactionResult, TransferAction, TxStatus,
};
pub use intent::{Intent, IntentKind};
pub use parser::IntentParser;
pub use plugin::{ChainPlugin, EvmPlugin, SwapRouterTable};
pub use router::{ReplCommand, Router};
pub use runtime::AgentRuntime;
pub use status::{AgentState, AgentStatus, AgentStatusBoard};

/// Truncate a string to at most `max` characters, appending `...` when cut.
pub fn truncate_for_preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_for_preview("short", 10), "short");
        assert_eq!(truncate_for_preview("☕☕☕☕", 2), "☕☕...");
    }
}
