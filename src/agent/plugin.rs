//! Chain plugins executed by the agent runtime.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, Bytes, H256, U256};

use crate::agent::actions::{
    ActionKind, ActionOutcome, ActionRequest, BalanceQuery, BalanceReport, SwapAction,
    TransactionResult, TransferAction, TxStatus,
};
use crate::config::ExplorerConfig;
use crate::confirmation::ConfirmationService;
use crate::error::{RuntimeError, WalletError};
use crate::wallet::{self, ChainInfo, WalletProvider, WalletTx};

/// Function signature encoded into swap calldata.
pub const SWAP_SIGNATURE: &str = "swap(string,string,uint256)";

/// Built-in swap routers by chain name.
const DEFAULT_SWAP_ROUTERS: &[(&str, &str)] = &[
    // Uniswap SwapRouter02 on Sepolia.
    ("sepolia", "0x3bFA4769FB09eefC5a80d6E87c3B9C650f7Ae48E"),
];

/// Handles one or more action kinds for the runtime.
#[async_trait]
pub trait ChainPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn supported_actions(&self) -> &[ActionKind];

    async fn execute(&self, action: &ActionRequest) -> Result<ActionOutcome, RuntimeError>;
}

/// Chain name to swap router address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRouterTable {
    routers: BTreeMap<String, String>,
}

impl SwapRouterTable {
    /// Built-in routers with `overrides` applied on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut routers: BTreeMap<String, String> = DEFAULT_SWAP_ROUTERS
            .iter()
            .map(|(chain, router)| (chain.to_string(), router.to_string()))
            .collect();
        for (chain, router) in overrides {
            routers.insert(chain.to_ascii_lowercase(), router.clone());
        }
        Self { routers }
    }

    pub fn resolve(&self, chain: &str) -> Result<Address, RuntimeError> {
        let router = self
            .routers
            .get(chain)
            .ok_or_else(|| RuntimeError::SwapRouterNotConfigured {
                chain: chain.to_string(),
            })?;
        Ok(wallet::parse_address(router)?)
    }
}

/// Calldata for `swap(string,string,uint256)`.
///
/// No slippage bound, deadline or path: the router receives symbols and the
/// input amount in wei.
pub fn encode_swap_call(from_token: &str, to_token: &str, amount: U256) -> Bytes {
    let selector = ethers::utils::id(SWAP_SIGNATURE);
    let args = ethers::abi::encode(&[
        Token::String(from_token.to_string()),
        Token::String(to_token.to_string()),
        Token::Uint(amount),
    ]);
    let mut data = Vec::with_capacity(selector.len() + args.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&args);
    Bytes::from(data)
}

/// EVM plugin: native transfers, router swaps and balance lookups.
pub struct EvmPlugin {
    wallet: Option<Arc<dyn WalletProvider>>,
    confirmation: Arc<dyn ConfirmationService>,
    explorer: ExplorerConfig,
    routers: SwapRouterTable,
}

impl EvmPlugin {
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        confirmation: Arc<dyn ConfirmationService>,
        explorer: ExplorerConfig,
        routers: SwapRouterTable,
    ) -> Self {
        Self {
            wallet,
            confirmation,
            explorer,
            routers,
        }
    }

    fn wallet(&self) -> Result<&Arc<dyn WalletProvider>, WalletError> {
        self.wallet.as_ref().ok_or(WalletError::NotInstalled)
    }

    fn connected(&self) -> Result<(&Arc<dyn WalletProvider>, Address), WalletError> {
        let wallet = self.wallet()?;
        let from = wallet.connected_address().ok_or(WalletError::NotConnected)?;
        Ok((wallet, from))
    }

    /// Chain the wallet is actually on. A mismatch with the requested chain
    /// is logged; the transaction still goes to the wallet's network.
    async fn network(
        wallet: &Arc<dyn WalletProvider>,
        requested: &str,
    ) -> Result<ChainInfo, WalletError> {
        let network = wallet.chain_info().await?;
        if network.name != requested {
            tracing::warn!(
                requested = %requested,
                network = %network.name,
                chain_id = network.chain_id,
                "Wallet is on a different chain than requested"
            );
        }
        Ok(network)
    }

    async fn transfer(&self, action: &TransferAction) -> Result<TransactionResult, RuntimeError> {
        let (wallet, from) = self.connected()?;
        let to = wallet::parse_address(&action.to_address)?;
        let value = wallet::parse_amount(&action.amount)?;
        let network = Self::network(wallet, &action.chain).await?;

        tracing::info!(
            chain = %action.chain,
            to = %action.to_address,
            amount = %action.amount,
            "Submitting transfer"
        );
        let hash = wallet
            .send_transaction(WalletTx {
                to,
                value,
                data: None,
            })
            .await?;
        self.settle(
            wallet,
            hash,
            from,
            &action.to_address,
            &action.amount,
            &action.chain,
            &network,
        )
        .await
    }

    async fn swap(&self, action: &SwapAction) -> Result<TransactionResult, RuntimeError> {
        let (wallet, from) = self.connected()?;
        let router = self.routers.resolve(&action.chain)?;
        let amount = wallet::parse_amount(&action.amount)?;
        let data = encode_swap_call(&action.from_token, &action.to_token, amount);
        let network = Self::network(wallet, &action.chain).await?;

        tracing::info!(
            chain = %action.chain,
            router = %wallet::hex_address(router),
            from_token = %action.from_token,
            to_token = %action.to_token,
            amount = %action.amount,
            "Submitting swap"
        );
        let hash = wallet
            .send_transaction(WalletTx {
                to: router,
                value: U256::zero(),
                data: Some(data),
            })
            .await?;
        self.settle(
            wallet,
            hash,
            from,
            &wallet::hex_address(router),
            &action.amount,
            &action.chain,
            &network,
        )
        .await
    }

    /// Wait for inclusion, then register with the confirmation service.
    ///
    /// An empty confirmation id means registration failed; the result is
    /// then reported confirmed on the strength of the receipt alone.
    #[allow(clippy::too_many_arguments)]
    async fn settle(
        &self,
        wallet: &Arc<dyn WalletProvider>,
        hash: H256,
        from: Address,
        to: &str,
        amount: &str,
        chain: &str,
        network: &ChainInfo,
    ) -> Result<TransactionResult, RuntimeError> {
        let hash_hex = wallet::hex_hash(hash);
        if !wallet.wait_for_inclusion(hash).await? {
            return Err(RuntimeError::TransactionDropped { hash: hash_hex });
        }

        let confirmation_id = self.confirmation.register_transaction(&hash_hex, chain).await;
        let (confirmation_id, status) = if confirmation_id.is_empty() {
            (None, TxStatus::Confirmed)
        } else {
            (Some(confirmation_id), TxStatus::Pending)
        };

        Ok(TransactionResult {
            explorer_url: self.explorer.tx_url(network, &hash_hex),
            hash: hash_hex,
            from: wallet::hex_address(from),
            to: to.to_string(),
            amount: amount.to_string(),
            chain: chain.to_string(),
            network: network.name.clone(),
            confirmation_id,
            status,
        })
    }

    async fn balance(&self, query: &BalanceQuery) -> Result<BalanceReport, RuntimeError> {
        let wallet = self.wallet()?;
        let address = wallet::parse_address(&query.address)?;
        let wei = wallet.balance_of(address).await?;
        let network = wallet.chain_info().await?;

        Ok(BalanceReport {
            address: query.address.clone(),
            chain: query.chain.clone(),
            network: network.name,
            balance: wallet::format_balance(wei),
            symbol: network.native_symbol.to_string(),
        })
    }
}

#[async_trait]
impl ChainPlugin for EvmPlugin {
    fn name(&self) -> &str {
        "evm"
    }

    fn supported_actions(&self) -> &[ActionKind] {
        &ActionKind::ALL
    }

    async fn execute(&self, action: &ActionRequest) -> Result<ActionOutcome, RuntimeError> {
        match action {
            ActionRequest::Transfer(transfer) => {
                self.transfer(transfer).await.map(ActionOutcome::Transaction)
            }
            ActionRequest::Swap(swap) => self.swap(swap).await.map(ActionOutcome::Transaction),
            ActionRequest::GetBalance(query) => self.balance(query).await.map(ActionOutcome::Balance),
        }
    }
}
