//! End-to-end chat flow tests.
//!
//! A real Axum server on a random port stands in for the confirmation
//! service, and a stub wallet records what the agent submits:
//! - Transfer → register → pending → poller tick → confirmed
//! - Failed registration reported as confirmed
//! - Unresolved confirmation stays pending
//! - Details endpoint success and failure
//! - Swap routing and missing-router incidents
//! - Wallet network shown when it differs from the requested chain

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ethers::types::{Address, H256, U256};
use ethers::utils::parse_ether;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use xpres_agent::agent::{
    AgentRuntime, AgentStatus, AgentStatusBoard, EvmPlugin, IntentParser, SwapRouterTable,
};
use xpres_agent::chat::ChatSession;
use xpres_agent::config::{ConfirmationConfig, ExplorerConfig};
use xpres_agent::confirmation::{ConfirmationClient, ConfirmationService};
use xpres_agent::error::{ConfirmationError, WalletError};
use xpres_agent::wallet::{ChainInfo, SEPOLIA_CHAIN_ID, WalletProvider, WalletTx};

const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
const SEPOLIA_ROUTER: &str = "0x3bFA4769FB09eefC5a80d6E87c3B9C650f7Ae48E";

// ── Confirmation service ────────────────────────────────────

#[derive(Default)]
struct ServiceState {
    fail_register: bool,
    registered: Vec<(String, String)>,
    confirmed: HashSet<String>,
}

type SharedState = Arc<Mutex<ServiceState>>;

async fn register(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = state.lock().unwrap();
    if state.fail_register {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let tx_hash = body["txHash"].as_str().unwrap_or_default().to_string();
    let chain = body["chain"].as_str().unwrap_or_default().to_string();
    state.registered.push((tx_hash, chain));
    Ok(Json(
        json!({ "confirmationId": format!("conf-{}", state.registered.len()) }),
    ))
}

async fn status(State(state): State<SharedState>, Path(id): Path<String>) -> Json<Value> {
    let confirmed = state.lock().unwrap().confirmed.contains(&id);
    Json(json!({ "status": if confirmed { "confirmed" } else { "pending" } }))
}

async fn details(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let state = state.lock().unwrap();
    let index: usize = id
        .strip_prefix("conf-")
        .and_then(|n| n.parse().ok())
        .ok_or(StatusCode::NOT_FOUND)?;
    let (_, chain) = state
        .registered
        .get(index.wrapping_sub(1))
        .ok_or(StatusCode::NOT_FOUND)?;
    let confirmed = state.confirmed.contains(&id);
    Ok(Json(json!({
        "status": if confirmed { "confirmed" } else { "pending" },
        "confirmations": if confirmed { 3 } else { 0 },
        "targetChain": chain,
        "finalizedAt": if confirmed { Some(1_700_000_000_000_i64) } else { None },
    })))
}

async fn start_confirmation_service() -> (SocketAddr, SharedState) {
    let state = SharedState::default();
    let app = Router::new()
        .route("/api/confirmation/register", post(register))
        .route("/api/confirmation/status/{id}", get(status))
        .route("/api/confirmation/details/{id}", get(details))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

// ── Stub wallet ─────────────────────────────────────────────

struct StubWallet {
    address: Address,
    connected: Mutex<Option<Address>>,
    sent: Mutex<Vec<WalletTx>>,
}

impl StubWallet {
    fn new() -> Self {
        Self {
            address: Address::from_low_u64_be(0xfeed),
            connected: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WalletProvider for StubWallet {
    async fn connect(&self) -> Result<Address, WalletError> {
        *self.connected.lock().unwrap() = Some(self.address);
        Ok(self.address)
    }

    fn disconnect(&self) {
        *self.connected.lock().unwrap() = None;
    }

    fn connected_address(&self) -> Option<Address> {
        *self.connected.lock().unwrap()
    }

    async fn balance_of(&self, _address: Address) -> Result<U256, WalletError> {
        Ok(parse_ether("1.5").unwrap())
    }

    async fn chain_info(&self) -> Result<ChainInfo, WalletError> {
        Ok(ChainInfo::from_chain_id(SEPOLIA_CHAIN_ID))
    }

    async fn send_transaction(&self, tx: WalletTx) -> Result<H256, WalletError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        Ok(H256::from_low_u64_be(sent.len() as u64))
    }

    async fn wait_for_inclusion(&self, _hash: H256) -> Result<bool, WalletError> {
        Ok(true)
    }
}

// ── Harness ─────────────────────────────────────────────────

struct Harness {
    session: ChatSession,
    wallet: Arc<StubWallet>,
    service: SharedState,
}

async fn harness() -> Harness {
    let (addr, service) = start_confirmation_service().await;
    let confirmation: Arc<dyn ConfirmationService> = Arc::new(
        ConfirmationClient::new(&ConfirmationConfig {
            base_url: format!("http://{addr}/api/confirmation"),
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    );

    let wallet = Arc::new(StubWallet::new());
    let provider: Arc<dyn WalletProvider> = wallet.clone();
    let plugin = Arc::new(EvmPlugin::new(
        Some(Arc::clone(&provider)),
        Arc::clone(&confirmation),
        ExplorerConfig {
            base_url: "https://sepolia.etherscan.io".to_string(),
        },
        SwapRouterTable::with_overrides(&BTreeMap::new()),
    ));
    let board = AgentStatusBoard::new(&[
        "cappuccino".to_string(),
        "sepolia".to_string(),
        "mainnet".to_string(),
    ]);
    let runtime = Arc::new(AgentRuntime::new(board).with_plugin(plugin));
    let parser = IntentParser::with_rng("cappuccino", StdRng::seed_from_u64(42));

    Harness {
        session: ChatSession::new(parser, runtime, Some(provider), confirmation),
        wallet,
        service,
    }
}

fn transfer_message() -> String {
    format!("transfer 0.1 ETH to {RECIPIENT} on sepolia")
}

// ── Tests ───────────────────────────────────────────────────

#[tokio::test]
async fn transfer_is_pending_until_the_poller_sees_confirmation() {
    let h = harness().await;
    h.session.connect_wallet().await.unwrap();

    let reply = h.session.handle_input(&transfer_message()).await;
    assert!(reply.text.contains("pending (confirmation conf-1)"), "{}", reply.text);
    assert!(reply.text.contains("https://sepolia.etherscan.io/tx/0x"));

    {
        let service = h.service.lock().unwrap();
        assert_eq!(service.registered.len(), 1);
        assert_eq!(service.registered[0].1, "sepolia");
    }
    let sent = h.wallet.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, RECIPIENT.parse::<Address>().unwrap());
    assert_eq!(sent[0].value, parse_ether("0.1").unwrap());
    assert!(sent[0].data.is_none());

    let pending = h.session.pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].confirmation_id.as_deref(), Some("conf-1"));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = h.session.poller().with_notifier(tx);
    assert_eq!(poller.tick().await, 0);
    assert!(rx.try_recv().is_err());

    h.service
        .lock()
        .unwrap()
        .confirmed
        .insert("conf-1".to_string());
    assert_eq!(poller.tick().await, 1);

    let notice = rx.try_recv().unwrap();
    assert_eq!(notice.confirmation_id, "conf-1");
    assert_eq!(notice.chain, "sepolia");
    assert!(h.session.pending().await.is_empty());

    let transcript = h.session.transcript();
    let last = transcript.read().await.last().cloned().unwrap();
    assert!(last.text.contains("Confirmed by Espresso"));

    // Already confirmed: later ticks do nothing.
    assert_eq!(poller.tick().await, 0);
}

#[tokio::test]
async fn failed_registration_is_reported_confirmed() {
    let h = harness().await;
    h.service.lock().unwrap().fail_register = true;
    h.session.connect_wallet().await.unwrap();

    let reply = h.session.handle_input(&transfer_message()).await;
    assert!(reply.text.contains("✅ confirmed"), "{}", reply.text);
    assert!(!reply.text.contains("failed"));

    let card = reply.action.unwrap();
    let result = card.transaction().unwrap();
    assert_eq!(result.confirmation_id, None);
    assert!(h.session.pending().await.is_empty());
}

#[tokio::test]
async fn unresolved_confirmation_stays_pending_without_errors() {
    let h = harness().await;
    h.session.connect_wallet().await.unwrap();
    h.session.handle_input(&transfer_message()).await;

    let poller = h.session.poller();
    for _ in 0..3 {
        assert_eq!(poller.tick().await, 0);
    }

    let pending = h.session.pending().await;
    assert_eq!(pending.len(), 1);
    let transcript = h.session.transcript();
    let messages = transcript.read().await;
    assert!(messages.iter().all(|m| m.action.as_ref().is_none_or(|card| card.incident.is_none())));
}

#[tokio::test]
async fn details_are_fetched_and_failures_propagate() {
    let h = harness().await;
    h.session.connect_wallet().await.unwrap();
    h.session.handle_input(&transfer_message()).await;
    h.service
        .lock()
        .unwrap()
        .confirmed
        .insert("conf-1".to_string());

    let details = h.session.details("conf-1").await.unwrap();
    assert!(details.is_confirmed());
    assert_eq!(details.confirmations, 3);
    assert_eq!(details.target_chain.as_deref(), Some("sepolia"));
    assert_eq!(details.finalized_at, Some(1_700_000_000_000));

    match h.session.details("conf-99").await {
        Err(ConfirmationError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected 404, got {other:?}"),
    }
    assert!(matches!(
        h.session.details("").await,
        Err(ConfirmationError::MissingId)
    ));
}

#[tokio::test]
async fn transfer_requires_a_connected_wallet() {
    let h = harness().await;

    let reply = h.session.handle_input(&transfer_message()).await;
    assert!(reply.text.contains("Please connect your wallet first"));
    assert_eq!(
        reply.action.unwrap().incident.unwrap().code,
        "wallet.not_connected"
    );
    assert!(h.wallet.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn swap_goes_to_the_chain_router() {
    let h = harness().await;
    h.session.connect_wallet().await.unwrap();

    let reply = h.session.handle_input("swap 0.1 eth to usdc on sepolia").await;
    assert!(reply.text.contains("pending"), "{}", reply.text);

    let sent = h.wallet.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, SEPOLIA_ROUTER.parse::<Address>().unwrap());
    assert_eq!(sent[0].value, U256::zero());
    assert!(sent[0].data.as_ref().is_some_and(|data| data.len() > 4));
}

#[tokio::test]
async fn swap_without_router_marks_the_agent_errored() {
    let h = harness().await;
    h.session.connect_wallet().await.unwrap();

    let reply = h.session.handle_input("swap 0.1 eth to usdc").await;
    assert!(
        reply
            .text
            .contains("No swap router configured for chain 'cappuccino'"),
        "{}",
        reply.text
    );
    assert_eq!(
        reply.action.unwrap().incident.unwrap().code,
        "config.swap_router_missing"
    );
    assert!(h.wallet.sent.lock().unwrap().is_empty());

    let agents = h.session.agents();
    assert_eq!(agents[0].chain, "cappuccino");
    assert_eq!(agents[0].status, AgentStatus::Error);
    assert_eq!(agents[1].status, AgentStatus::Idle);
}

#[tokio::test]
async fn balance_reports_native_symbol() {
    let h = harness().await;

    let reply = h
        .session
        .handle_input("balance of 0xABCDEF0123456789ABCDEF0123456789ABCDEF01")
        .await;
    assert!(
        reply.text.contains("1.5 SEP on sepolia (requested cappuccino)"),
        "{}",
        reply.text
    );

    let reply = h
        .session
        .handle_input("balance of 0xABCDEF0123456789ABCDEF0123456789ABCDEF01 on sepolia")
        .await;
    assert!(reply.text.ends_with("1.5 SEP on sepolia"), "{}", reply.text);

    let status = h.session.connect_wallet().await.unwrap();
    assert_eq!(status.balance, "1.5");
    assert_eq!(status.chain.name, "sepolia");
}

#[tokio::test]
async fn transfer_reports_the_wallet_network_when_it_differs() {
    let h = harness().await;
    h.session.connect_wallet().await.unwrap();

    let reply = h
        .session
        .handle_input(&format!("transfer 0.1 ETH to {RECIPIENT}"))
        .await;
    assert!(
        reply.text.contains("Chain: cappuccino (wallet network: sepolia)"),
        "{}",
        reply.text
    );
    assert!(reply.text.contains("https://sepolia.etherscan.io/tx/0x"));

    let service = h.service.lock().unwrap();
    assert_eq!(service.registered[0].1, "cappuccino");
}
