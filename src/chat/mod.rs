//! Chat session: transcript, input dispatch and action cards.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::agent::{
    ActionOutcome, ActionRequest, AgentRuntime, AgentState, BalanceReport, IntentParser,
    TransactionResult, TxStatus,
};
use crate::confirmation::{
    ConfirmationDetails, ConfirmationNotice, ConfirmationPoller, ConfirmationService, PollerHandle,
};
use crate::error::{ConfirmationError, Error, RuntimeErrorPayload, WalletError};
use crate::wallet::{self, ChainInfo, WalletProvider};

/// Transcript shared between the session and the confirmation poller.
pub type Transcript = Arc<RwLock<Vec<ChatMessage>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Transfer,
    Swap,
    Balance,
}

impl CardKind {
    fn for_request(request: &ActionRequest) -> Self {
        match request {
            ActionRequest::Transfer(_) => Self::Transfer,
            ActionRequest::Swap(_) => Self::Swap,
            ActionRequest::GetBalance(_) => Self::Balance,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Transfer => "Transfer",
            Self::Swap => "Swap",
            Self::Balance => "Balance check",
        }
    }
}

/// Structured action attached to an agent message.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCard {
    pub kind: CardKind,
    pub request: ActionRequest,
    pub outcome: Option<ActionOutcome>,
    pub incident: Option<RuntimeErrorPayload>,
}

impl ActionCard {
    pub fn completed(request: ActionRequest, outcome: ActionOutcome) -> Self {
        Self {
            kind: CardKind::for_request(&request),
            request,
            outcome: Some(outcome),
            incident: None,
        }
    }

    pub fn failed(request: ActionRequest, incident: RuntimeErrorPayload) -> Self {
        Self {
            kind: CardKind::for_request(&request),
            request,
            outcome: None,
            incident: Some(incident),
        }
    }

    pub fn transaction(&self) -> Option<&TransactionResult> {
        match &self.outcome {
            Some(ActionOutcome::Transaction(result)) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub action: Option<ActionCard>,
}

impl ChatMessage {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
            action: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Sender::Agent, text)
    }

    pub fn with_action(mut self, card: ActionCard) -> Self {
        self.action = Some(card);
        self
    }

    /// Confirmation id still awaiting the confirmation service.
    pub fn pending_confirmation(&self) -> Option<&str> {
        self.action
            .as_ref()?
            .transaction()?
            .awaiting_confirmation()
    }

    /// Flip a pending transaction to confirmed and note it in the text.
    pub fn mark_confirmed(&mut self) -> Option<ConfirmationNotice> {
        let Some(ActionOutcome::Transaction(result)) =
            self.action.as_mut().and_then(|card| card.outcome.as_mut())
        else {
            return None;
        };
        let confirmation_id = result.awaiting_confirmation()?.to_string();
        result.status = TxStatus::Confirmed;
        let notice = ConfirmationNotice {
            confirmation_id,
            tx_hash: result.hash.clone(),
            chain: result.chain.clone(),
        };
        self.text.push_str("\n\n✅ Confirmed by Espresso's fast confirmation layer.");
        Some(notice)
    }
}

/// Connected wallet summary for `/connect` and `/wallet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletStatus {
    pub address: String,
    pub balance: String,
    pub chain: ChainInfo,
}

/// One interactive conversation.
pub struct ChatSession {
    parser: IntentParser,
    runtime: Arc<AgentRuntime>,
    wallet: Option<Arc<dyn WalletProvider>>,
    confirmation: Arc<dyn ConfirmationService>,
    transcript: Transcript,
}

impl ChatSession {
    /// Start a session with a random welcome line in the transcript.
    pub fn new(
        parser: IntentParser,
        runtime: Arc<AgentRuntime>,
        wallet: Option<Arc<dyn WalletProvider>>,
        confirmation: Arc<dyn ConfirmationService>,
    ) -> Self {
        let welcome = ChatMessage::agent(parser.welcome());
        Self {
            parser,
            runtime,
            wallet,
            confirmation,
            transcript: Arc::new(RwLock::new(vec![welcome])),
        }
    }

    pub fn transcript(&self) -> Transcript {
        Arc::clone(&self.transcript)
    }

    pub fn parser(&self) -> &IntentParser {
        &self.parser
    }

    /// Record a user message, run it through parser and runtime, and record the reply.
    pub async fn handle_input(&self, text: &str) -> ChatMessage {
        self.transcript.write().await.push(ChatMessage::user(text));

        let intent = self.parser.parse(text);
        tracing::debug!(intent = ?intent.intent, "Parsed intent");

        let reply = match intent.to_action() {
            None => ChatMessage::agent(intent.general_response),
            Some(request) => match self.runtime.execute_action(&request).await {
                Ok(outcome) => ChatMessage::agent(format!(
                    "{}\n\n{}",
                    intent.general_response,
                    render_outcome(&outcome)
                ))
                .with_action(ActionCard::completed(request, outcome)),
                Err(e) => {
                    let message = e.to_string();
                    let incident = Error::from(e).to_runtime_error_payload();
                    let kind = CardKind::for_request(&request);
                    ChatMessage::agent(format!(
                        "{}\n\n❌ {} failed: {message}",
                        intent.general_response,
                        kind.label()
                    ))
                    .with_action(ActionCard::failed(request, incident))
                }
            },
        };

        self.transcript.write().await.push(reply.clone());
        reply
    }

    fn wallet(&self) -> Result<&Arc<dyn WalletProvider>, WalletError> {
        self.wallet.as_ref().ok_or(WalletError::NotInstalled)
    }

    /// Request account access and report address, balance and chain.
    pub async fn connect_wallet(&self) -> Result<WalletStatus, WalletError> {
        let address = self.wallet()?.connect().await?;
        self.describe_wallet(address).await
    }

    pub fn disconnect_wallet(&self) -> Result<(), WalletError> {
        self.wallet()?.disconnect();
        Ok(())
    }

    pub async fn wallet_status(&self) -> Result<WalletStatus, WalletError> {
        let address = self
            .wallet()?
            .connected_address()
            .ok_or(WalletError::NotConnected)?;
        self.describe_wallet(address).await
    }

    async fn describe_wallet(
        &self,
        address: ethers::types::Address,
    ) -> Result<WalletStatus, WalletError> {
        let wallet = self.wallet()?;
        let balance = wallet.balance_of(address).await?;
        let chain = wallet.chain_info().await?;
        Ok(WalletStatus {
            address: wallet::hex_address(address),
            balance: wallet::format_balance(balance),
            chain,
        })
    }

    /// Transactions still awaiting confirmation.
    pub async fn pending(&self) -> Vec<TransactionResult> {
        self.transcript
            .read()
            .await
            .iter()
            .filter(|message| message.pending_confirmation().is_some())
            .filter_map(|message| message.action.as_ref()?.transaction().cloned())
            .collect()
    }

    pub async fn details(
        &self,
        confirmation_id: &str,
    ) -> Result<ConfirmationDetails, ConfirmationError> {
        self.confirmation
            .get_confirmation_details(confirmation_id)
            .await
    }

    pub fn agents(&self) -> Vec<AgentState> {
        self.runtime.status_board().snapshot()
    }

    /// Drop everything but a fresh welcome line.
    pub async fn clear(&self) {
        let mut transcript = self.transcript.write().await;
        transcript.clear();
        transcript.push(ChatMessage::agent(self.parser.welcome()));
    }

    pub fn poller(&self) -> ConfirmationPoller {
        ConfirmationPoller::new(Arc::clone(&self.confirmation), self.transcript())
    }

    /// Start background polling; notices are sent to `notifier`.
    pub fn spawn_poller(
        &self,
        period: Duration,
        notifier: mpsc::UnboundedSender<ConfirmationNotice>,
    ) -> PollerHandle {
        self.poller().with_notifier(notifier).spawn(period)
    }
}

/// Human-readable summary of an action outcome.
pub fn render_outcome(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Transaction(result) => render_transaction(result),
        ActionOutcome::Balance(report) => render_balance(report),
    }
}

fn render_transaction(result: &TransactionResult) -> String {
    let status = match result.status {
        TxStatus::Pending => format!(
            "⏳ pending (confirmation {})",
            result.confirmation_id.as_deref().unwrap_or("-")
        ),
        TxStatus::Confirmed => "✅ confirmed".to_string(),
        TxStatus::Failed => "❌ failed".to_string(),
    };
    let chain = if result.network.is_empty() || result.network == result.chain {
        result.chain.clone()
    } else {
        format!("{} (wallet network: {})", result.chain, result.network)
    };
    format!(
        "Hash: {}\nFrom: {}\nTo: {}\nAmount: {}\nChain: {chain}\nStatus: {status}\nExplorer: {}",
        result.hash, result.from, result.to, result.amount, result.explorer_url
    )
}

fn render_balance(report: &BalanceReport) -> String {
    let line = format!(
        "💼 {} holds {} {} on {}",
        report.address, report.balance, report.symbol, report.network
    );
    if report.network == report.chain {
        line
    } else {
        format!("{line} (requested {})", report.chain)
    }
}
