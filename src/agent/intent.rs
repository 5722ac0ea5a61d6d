//! Parsed chat intents.

use serde::{Deserialize, Serialize};

use crate::agent::actions::{ActionRequest, BalanceQuery, SwapAction, TransferAction};

/// Closed set of intents the parser can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntentKind {
    Transfer,
    Swap,
    CheckBalance,
    Coordinate,
    NormalChat,
    Unknown,
}

/// One parsed user submission.
///
/// Serialized with the tag under `intent` and camelCase field names, so
/// `xpres parse` output matches what downstream tooling already reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub intent: IntentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_chain: Option<String>,
    pub general_response: String,
    /// Amount exactly as typed, so no precision is lost on the way to wei.
    #[serde(skip)]
    pub raw_amount: Option<String>,
}

impl Intent {
    fn bare(intent: IntentKind, general_response: impl Into<String>) -> Self {
        Self {
            intent,
            amount: None,
            source_token: None,
            destination_token: None,
            recipient_address: None,
            wallet_address: None,
            source_chain: None,
            target_chain: None,
            general_response: general_response.into(),
            raw_amount: None,
        }
    }

    pub fn normal_chat(response: impl Into<String>) -> Self {
        Self::bare(IntentKind::NormalChat, response)
    }

    pub fn transfer(amount: f64, recipient: &str, chain: &str, response: String) -> Self {
        Self {
            amount: Some(amount),
            recipient_address: Some(recipient.to_string()),
            source_chain: Some(chain.to_string()),
            target_chain: Some(chain.to_string()),
            ..Self::bare(IntentKind::Transfer, response)
        }
    }

    pub fn swap(amount: f64, from_token: &str, to_token: &str, chain: &str, response: String) -> Self {
        Self {
            amount: Some(amount),
            source_token: Some(from_token.to_string()),
            destination_token: Some(to_token.to_string()),
            source_chain: Some(chain.to_string()),
            target_chain: Some(chain.to_string()),
            ..Self::bare(IntentKind::Swap, response)
        }
    }

    /// Keep the typed decimal text next to the parsed `f64`.
    pub fn with_raw_amount(mut self, raw: impl Into<String>) -> Self {
        self.raw_amount = Some(raw.into());
        self
    }

    pub fn check_balance(address: &str, chain: &str, response: String) -> Self {
        Self {
            wallet_address: Some(address.to_string()),
            source_chain: Some(chain.to_string()),
            ..Self::bare(IntentKind::CheckBalance, response)
        }
    }

    pub fn coordinate(source: &str, target: &str, response: String) -> Self {
        Self {
            source_chain: Some(source.to_string()),
            target_chain: Some(target.to_string()),
            ..Self::bare(IntentKind::Coordinate, response)
        }
    }

    /// Runtime action for executable intents.
    ///
    /// Coordinate and chat intents never reach the runtime.
    pub fn to_action(&self) -> Option<ActionRequest> {
        match self.intent {
            IntentKind::Transfer => Some(ActionRequest::Transfer(TransferAction {
                amount: self.action_amount()?,
                to_address: self.recipient_address.clone()?,
                chain: self.source_chain.clone()?,
            })),
            IntentKind::Swap => Some(ActionRequest::Swap(SwapAction {
                amount: self.action_amount()?,
                from_token: self.source_token.clone()?,
                to_token: self.destination_token.clone()?,
                chain: self.source_chain.clone()?,
            })),
            IntentKind::CheckBalance => Some(ActionRequest::GetBalance(BalanceQuery {
                address: self.wallet_address.clone()?,
                chain: self.source_chain.clone()?,
            })),
            IntentKind::Coordinate | IntentKind::NormalChat | IntentKind::Unknown => None,
        }
    }

    /// Decimal string handed to the wallet. Prefers the typed text; falls
    /// back to the shortest `f64` rendering for intents built without one.
    fn action_amount(&self) -> Option<String> {
        match &self.raw_amount {
            Some(raw) => Some(raw.clone()),
            None => self.amount.map(|amount| amount.to_string()),
        }
    }
}
