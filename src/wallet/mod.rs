//! Wallet provider abstraction.
//!
//! The agent talks to an EIP-1193 style provider over JSON-RPC. Signing is
//! either done locally by `ethers` (when `XPRES_PRIVATE_KEY` is set) or left
//! to the provider itself through `eth_sendTransaction`.

mod evm;

pub use evm::EvmWallet;

use std::str::FromStr;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::WalletError;

/// Sepolia chain id; the only chain whose native currency is not shown as ETH.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Chain metadata reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: String,
    pub native_symbol: &'static str,
}

impl ChainInfo {
    pub fn from_chain_id(chain_id: u64) -> Self {
        let name = match chain_id {
            1 => "mainnet".to_string(),
            SEPOLIA_CHAIN_ID => "sepolia".to_string(),
            10 => "optimism".to_string(),
            137 => "polygon".to_string(),
            42_161 => "arbitrum".to_string(),
            31_337 => "anvil".to_string(),
            other => format!("chain-{other}"),
        };
        let native_symbol = if chain_id == SEPOLIA_CHAIN_ID {
            "SEP"
        } else {
            "ETH"
        };
        Self {
            chain_id,
            name,
            native_symbol,
        }
    }

    /// Public explorer for well-known chain ids.
    pub fn explorer_url(&self) -> Option<&'static str> {
        match self.chain_id {
            1 => Some("https://etherscan.io"),
            SEPOLIA_CHAIN_ID => Some("https://sepolia.etherscan.io"),
            10 => Some("https://optimistic.etherscan.io"),
            137 => Some("https://polygonscan.com"),
            42_161 => Some("https://arbiscan.io"),
            _ => None,
        }
    }
}

/// Transaction handed to the provider for signing and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletTx {
    pub to: Address,
    pub value: U256,
    pub data: Option<Bytes>,
}

/// Signing wallet the runtime submits through.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request account access (`eth_requestAccounts`) and remember the first account.
    async fn connect(&self) -> Result<Address, WalletError>;

    /// Forget the connected account. The provider itself stays reachable.
    fn disconnect(&self);

    /// Account authorized by the last successful `connect`.
    fn connected_address(&self) -> Option<Address>;

    fn is_connected(&self) -> bool {
        self.connected_address().is_some()
    }

    /// Native balance in wei.
    async fn balance_of(&self, address: Address) -> Result<U256, WalletError>;

    async fn chain_info(&self) -> Result<ChainInfo, WalletError>;

    /// Sign and broadcast, returning the transaction hash.
    async fn send_transaction(&self, tx: WalletTx) -> Result<H256, WalletError>;

    /// Wait for the transaction to be mined. `false` means it was dropped.
    async fn wait_for_inclusion(&self, hash: H256) -> Result<bool, WalletError>;
}

/// Parse a `0x` address. Mixed case is accepted without checksum validation.
pub fn parse_address(raw: &str) -> Result<Address, WalletError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(WalletError::InvalidAddress(raw.to_string()));
    }
    Address::from_str(trimmed).map_err(|_| WalletError::InvalidAddress(raw.to_string()))
}

/// Convert a decimal ether amount to wei. Zero and negative amounts are rejected.
pub fn parse_amount(amount: &str) -> Result<U256, WalletError> {
    let wei = ethers::utils::parse_ether(amount.trim()).map_err(|e| WalletError::InvalidAmount {
        amount: amount.to_string(),
        reason: e.to_string(),
    })?;
    if wei.is_zero() {
        return Err(WalletError::InvalidAmount {
            amount: amount.to_string(),
            reason: "amount must be greater than zero".to_string(),
        });
    }
    Ok(wei)
}

/// Format a wei value in whole native units without trailing zeros.
pub fn format_balance(wei: U256) -> String {
    let formatted = ethers::utils::format_ether(wei);
    match Decimal::from_str(&formatted) {
        Ok(value) => value.normalize().to_string(),
        Err(_) => formatted,
    }
}

/// Lowercase `0x` hex rendering used in transcripts and confirmation requests.
pub fn hex_address(address: Address) -> String {
    format!("{address:#x}")
}

pub fn hex_hash(hash: H256) -> String {
    format!("{hash:#x}")
}
