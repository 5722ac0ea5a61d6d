//! `ethers` backed wallet provider.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, MiddlewareError, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, TransactionRequest, U256};
use secrecy::ExposeSecret;

use super::{ChainInfo, WalletProvider, WalletTx};
use crate::config::WalletConfig;
use crate::error::WalletError;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Wallet backed by a JSON-RPC endpoint.
pub struct EvmWallet {
    provider: Provider<Http>,
    signer: Option<LocalWallet>,
    account: RwLock<Option<Address>>,
}

impl EvmWallet {
    /// Build a wallet from config. Returns `NotInstalled` when no RPC URL is set.
    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        let rpc_url = config.rpc_url.as_deref().ok_or(WalletError::NotInstalled)?;
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| WalletError::Provider(format!("provider init failed: {e}")))?
            .interval(RECEIPT_POLL_INTERVAL);

        let signer = config
            .private_key
            .as_ref()
            .map(|key| {
                key.expose_secret()
                    .parse::<LocalWallet>()
                    .map_err(|e| WalletError::InvalidKey(e.to_string()))
            })
            .transpose()?;

        Ok(Self {
            provider,
            signer,
            account: RwLock::new(None),
        })
    }

    pub fn uses_local_signer(&self) -> bool {
        self.signer.is_some()
    }

    fn set_account(&self, address: Option<Address>) {
        match self.account.write() {
            Ok(mut guard) => *guard = address,
            Err(poisoned) => *poisoned.into_inner() = address,
        }
    }
}

/// Map provider failures onto the wallet taxonomy using the JSON-RPC error code.
fn map_rpc_error<E: MiddlewareError>(err: E) -> WalletError {
    match err.as_error_response() {
        Some(rpc) => WalletError::from_rpc_code(rpc.code, rpc.message.clone()),
        None => WalletError::Provider(err.to_string()),
    }
}

#[async_trait]
impl WalletProvider for EvmWallet {
    async fn connect(&self) -> Result<Address, WalletError> {
        let address = match &self.signer {
            Some(signer) => signer.address(),
            None => {
                let accounts: Vec<Address> = self
                    .provider
                    .request("eth_requestAccounts", ())
                    .await
                    .map_err(map_rpc_error)?;
                accounts.into_iter().next().ok_or(WalletError::NotConnected)?
            }
        };
        tracing::info!(address = %format!("{address:#x}"), "Wallet connected");
        self.set_account(Some(address));
        Ok(address)
    }

    fn disconnect(&self) {
        self.set_account(None);
        tracing::info!("Wallet disconnected");
    }

    fn connected_address(&self) -> Option<Address> {
        match self.account.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    async fn balance_of(&self, address: Address) -> Result<U256, WalletError> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(map_rpc_error)
    }

    async fn chain_info(&self) -> Result<ChainInfo, WalletError> {
        let chain_id = self.provider.get_chainid().await.map_err(map_rpc_error)?;
        Ok(ChainInfo::from_chain_id(chain_id.as_u64()))
    }

    async fn send_transaction(&self, tx: WalletTx) -> Result<H256, WalletError> {
        let from = self.connected_address().ok_or(WalletError::NotConnected)?;

        let mut request = TransactionRequest::new().from(from).to(tx.to).value(tx.value);
        if let Some(data) = tx.data {
            request = request.data(data);
        }

        match &self.signer {
            Some(signer) => {
                let chain_id = self.provider.get_chainid().await.map_err(map_rpc_error)?;
                let client = SignerMiddleware::new(
                    self.provider.clone(),
                    signer.clone().with_chain_id(chain_id.as_u64()),
                );
                let pending = client
                    .send_transaction(request, None)
                    .await
                    .map_err(map_rpc_error)?;
                Ok(pending.tx_hash())
            }
            None => {
                let pending = self
                    .provider
                    .send_transaction(request, None)
                    .await
                    .map_err(map_rpc_error)?;
                Ok(pending.tx_hash())
            }
        }
    }

    async fn wait_for_inclusion(&self, hash: H256) -> Result<bool, WalletError> {
        let receipt = PendingTransaction::new(hash, &self.provider)
            .interval(RECEIPT_POLL_INTERVAL)
            .await
            .map_err(map_rpc_error)?;
        Ok(receipt.is_some())
    }
}
