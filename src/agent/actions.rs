//! Typed actions the runtime dispatches and the results it returns.

use serde::{Deserialize, Serialize};

/// Dispatch key for the runtime's plugin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Transfer,
    Swap,
    GetBalance,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [Self::Transfer, Self::Swap, Self::GetBalance];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Swap => "swap",
            Self::GetBalance => "getBalance",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native-currency transfer. Amount is a decimal string in whole units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAction {
    pub amount: String,
    pub to_address: String,
    pub chain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapAction {
    pub amount: String,
    pub from_token: String,
    pub to_token: String,
    pub chain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    pub address: String,
    pub chain: String,
}

/// One unit of work for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    Transfer(TransferAction),
    Swap(SwapAction),
    GetBalance(BalanceQuery),
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Transfer(_) => ActionKind::Transfer,
            Self::Swap(_) => ActionKind::Swap,
            Self::GetBalance(_) => ActionKind::GetBalance,
        }
    }

    pub fn chain(&self) -> &str {
        match self {
            Self::Transfer(action) => &action.chain,
            Self::Swap(action) => &action.chain,
            Self::GetBalance(query) => &query.chain,
        }
    }

    /// Build a request from a string action name and JSON parameters.
    pub fn from_named(kind: ActionKind, params: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            ActionKind::Transfer => Self::Transfer(serde_json::from_value(params)?),
            ActionKind::Swap => Self::Swap(serde_json::from_value(params)?),
            ActionKind::GetBalance => Self::GetBalance(serde_json::from_value(params)?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of a submitted transfer or swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    /// Chain named in the request; the confirmation service tracks this one.
    pub chain: String,
    /// Chain the wallet's RPC reported at submission.
    #[serde(default)]
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_id: Option<String>,
    pub explorer_url: String,
    pub status: TxStatus,
}

impl TransactionResult {
    /// Still waiting on the confirmation service.
    pub fn awaiting_confirmation(&self) -> Option<&str> {
        match (&self.confirmation_id, self.status) {
            (Some(id), TxStatus::Pending) if !id.is_empty() => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub address: String,
    pub chain: String,
    /// Chain the balance was actually read from.
    pub network: String,
    pub balance: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionOutcome {
    Transaction(TransactionResult),
    Balance(BalanceReport),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn action_names_round_trip() {
        assert_eq!(ActionKind::from_name("getBalance"), Some(ActionKind::GetBalance));
        assert_eq!(ActionKind::from_name("transfer"), Some(ActionKind::Transfer));
        assert_eq!(ActionKind::from_name("bridge"), None);
        assert_eq!(ActionKind::from_name("Transfer"), None);
    }

    #[test]
    fn named_params_use_camel_case() {
        let request = ActionRequest::from_named(
            ActionKind::Transfer,
            serde_json::json!({
                "amount": "0.1",
                "toAddress": "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
                "chain": "sepolia"
            }),
        )
        .unwrap();
        assert_eq!(request.kind(), ActionKind::Transfer);
        assert_eq!(request.chain(), "sepolia");

        let bad = ActionRequest::from_named(ActionKind::Swap, serde_json::json!({"amount": "1"}));
        assert!(bad.is_err());
    }

    #[test]
    fn only_pending_results_with_an_id_await_confirmation() {
        let mut result = TransactionResult {
            hash: "0x01".to_string(),
            from: "0x02".to_string(),
            to: "0x03".to_string(),
            amount: "0.1".to_string(),
            chain: "sepolia".to_string(),
            network: "sepolia".to_string(),
            confirmation_id: Some("conf-1".to_string()),
            explorer_url: "https://sepolia.etherscan.io/tx/0x01".to_string(),
            status: TxStatus::Pending,
        };
        assert_eq!(result.awaiting_confirmation(), Some("conf-1"));

        result.status = TxStatus::Confirmed;
        assert_eq!(result.awaiting_confirmation(), None);

        result.status = TxStatus::Pending;
        result.confirmation_id = None;
        assert_eq!(result.awaiting_confirmation(), None);
    }
}
