//! `EvmWallet` against a JSON-RPC node served by Axum on a random port.
//!
//! The node answers each method with a fixed result or error so the
//! provider error codes can be checked end to end:
//! - 4001 on `eth_requestAccounts` → `Rejected`
//! - -32602 on `eth_getBalance` → `NotConnected`
//! - other codes keep their code and message

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use ethers::types::Address;
use serde_json::{Value, json};

use xpres_agent::config::WalletConfig;
use xpres_agent::error::WalletError;
use xpres_agent::wallet::{EvmWallet, SEPOLIA_CHAIN_ID, WalletProvider};

const ACCOUNT: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

#[derive(Default)]
struct NodeState {
    approve_accounts: bool,
    balance_error: Option<(i64, String)>,
    methods: Vec<String>,
}

type SharedNode = Arc<Mutex<NodeState>>;

fn rpc_error(id: &Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

fn rpc_result(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

async fn handle_rpc(State(state): State<SharedNode>, Json(body): Json<Value>) -> Json<Value> {
    let id = body["id"].clone();
    let method = body["method"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().unwrap();
    state.methods.push(method.clone());

    let reply = match method.as_str() {
        "eth_chainId" => rpc_result(&id, json!(format!("{SEPOLIA_CHAIN_ID:#x}"))),
        "eth_requestAccounts" if state.approve_accounts => rpc_result(&id, json!([ACCOUNT])),
        "eth_requestAccounts" => rpc_error(&id, 4001, "User rejected the request."),
        "eth_getBalance" => match &state.balance_error {
            Some((code, message)) => rpc_error(&id, *code, message),
            None => rpc_result(&id, json!("0x14d1120d7b160000")),
        },
        _ => rpc_error(&id, -32601, "method not found"),
    };
    Json(reply)
}

async fn start_node(state: NodeState) -> (SocketAddr, SharedNode) {
    let state = Arc::new(Mutex::new(state));
    let app = Router::new()
        .route("/", post(handle_rpc))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn remote_signer_wallet(addr: SocketAddr) -> EvmWallet {
    EvmWallet::from_config(&WalletConfig {
        rpc_url: Some(format!("http://{addr}")),
        private_key: None,
    })
    .unwrap()
}

#[tokio::test]
async fn user_rejection_maps_to_rejected() {
    let (addr, node) = start_node(NodeState::default()).await;
    let wallet = remote_signer_wallet(addr);

    let err = wallet.connect().await.unwrap_err();
    assert!(matches!(err, WalletError::Rejected), "got {err:?}");
    assert_eq!(err.to_string(), "Transaction rejected by user");
    assert_eq!(wallet.connected_address(), None);
    assert_eq!(node.lock().unwrap().methods, vec!["eth_requestAccounts"]);
}

#[tokio::test]
async fn invalid_params_maps_to_not_connected() {
    let (addr, _node) = start_node(NodeState {
        balance_error: Some((-32602, "invalid params".to_string())),
        ..NodeState::default()
    })
    .await;
    let wallet = remote_signer_wallet(addr);

    let err = wallet
        .balance_of(ACCOUNT.parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::NotConnected), "got {err:?}");
    assert_eq!(err.to_string(), "Please connect your wallet first");
}

#[tokio::test]
async fn other_rpc_codes_keep_code_and_message() {
    let (addr, _node) = start_node(NodeState {
        balance_error: Some((-32000, "header not found".to_string())),
        ..NodeState::default()
    })
    .await;
    let wallet = remote_signer_wallet(addr);

    match wallet.balance_of(ACCOUNT.parse().unwrap()).await {
        Err(WalletError::Rpc { code, message }) => {
            assert_eq!(code, -32000);
            assert_eq!(message, "header not found");
        }
        other => panic!("expected rpc error, got {other:?}"),
    }
}

#[tokio::test]
async fn approved_accounts_connect_and_report_chain() {
    let (addr, _node) = start_node(NodeState {
        approve_accounts: true,
        ..NodeState::default()
    })
    .await;
    let wallet = remote_signer_wallet(addr);
    assert!(!wallet.uses_local_signer());

    let expected: Address = ACCOUNT.parse().unwrap();
    assert_eq!(wallet.connect().await.unwrap(), expected);
    assert_eq!(wallet.connected_address(), Some(expected));

    let chain = wallet.chain_info().await.unwrap();
    assert_eq!(chain.chain_id, SEPOLIA_CHAIN_ID);
    assert_eq!(chain.name, "sepolia");
    assert_eq!(chain.native_symbol, "SEP");

    // 1.5 ether
    let balance = wallet.balance_of(expected).await.unwrap();
    assert_eq!(xpres_agent::wallet::format_balance(balance), "1.5");

    wallet.disconnect();
    assert_eq!(wallet.connected_address(), None);
}
