//! Configuration for xpres.
//!
//! Settings are loaded with priority: env var > config.toml > default.
//! `.env` files are loaded by `bootstrap::load_env` before resolution.

pub(crate) mod helpers;

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::settings::{DEFAULT_EXPLORER_URL, Settings};
use crate::wallet::ChainInfo;

/// Main configuration for the agent.
#[derive(Debug, Clone)]
pub struct Config {
    pub wallet: WalletConfig,
    pub chat: ChatConfig,
    pub confirmation: ConfirmationConfig,
    pub explorer: ExplorerConfig,
    pub market: MarketConfig,
}

impl Config {
    /// Load `~/.xpres/config.toml` and resolve env overrides on top of it.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(&Settings::load())
    }

    /// Build config from settings, applying env overrides.
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            wallet: WalletConfig::resolve(settings)?,
            chat: ChatConfig::resolve(settings)?,
            confirmation: ConfirmationConfig::resolve(settings)?,
            explorer: ExplorerConfig::resolve(settings)?,
            market: MarketConfig::resolve(settings)?,
        })
    }

    /// Human-readable summary with secrets redacted.
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!(
                "wallet.rpc_url        = {}",
                self.wallet.rpc_url.as_deref().unwrap_or("(not set)")
            ),
            format!(
                "wallet.private_key    = {}",
                if self.wallet.private_key.is_some() {
                    "[REDACTED]"
                } else {
                    "(remote signer)"
                }
            ),
            format!("chat.default_chain    = {}", self.chat.default_chain),
            format!("chat.agent_chains     = {}", self.chat.agent_chains.join(", ")),
            format!("confirmation.base_url = {}", self.confirmation.base_url),
            format!(
                "confirmation.interval = {}s",
                self.confirmation.poll_interval.as_secs()
            ),
            format!("explorer.base_url     = {}", self.explorer.base_url),
            format!("market.base_url       = {}", self.market.base_url),
        ]
    }
}

/// Wallet provider connection.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// JSON-RPC endpoint. `None` means no wallet is installed.
    pub rpc_url: Option<String>,
    /// Local signing key. When unset the provider signs (`eth_sendTransaction`).
    pub private_key: Option<SecretString>,
}

impl WalletConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let rpc_url = helpers::optional_env("XPRES_RPC_URL")?
            .or_else(|| settings.wallet.rpc_url.clone())
            .map(|url| helpers::validate_base_url("XPRES_RPC_URL", &url))
            .transpose()?;

        let private_key = helpers::optional_env("XPRES_PRIVATE_KEY")?.map(SecretString::from);

        Ok(Self {
            rpc_url,
            private_key,
        })
    }
}

/// Chat and dispatch behaviour.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub default_chain: String,
    pub agent_chains: Vec<String>,
    /// Router overrides merged over the built-in table.
    pub swap_routers: BTreeMap<String, String>,
}

impl ChatConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let default_chain = helpers::optional_env("XPRES_DEFAULT_CHAIN")?
            .unwrap_or_else(|| settings.chat.default_chain.clone())
            .to_ascii_lowercase();

        if !default_chain
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            return Err(ConfigError::InvalidValue {
                key: "XPRES_DEFAULT_CHAIN".to_string(),
                message: format!("'{default_chain}' is not a single word chain name"),
            });
        }

        let agent_chains: Vec<String> = settings
            .chat
            .agent_chains
            .iter()
            .map(|chain| chain.trim().to_ascii_lowercase())
            .filter(|chain| !chain.is_empty())
            .collect();
        if agent_chains.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "chat.agent_chains".to_string(),
                message: "at least one chain is required".to_string(),
            });
        }

        Ok(Self {
            default_chain,
            agent_chains,
            swap_routers: settings.swap_routers.clone(),
        })
    }
}

/// Confirmation service endpoint.
#[derive(Debug, Clone)]
pub struct ConfirmationConfig {
    pub base_url: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl ConfirmationConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let base_url = helpers::validate_base_url(
            "XPRES_CONFIRMATION_URL",
            &helpers::optional_env("XPRES_CONFIRMATION_URL")?
                .unwrap_or_else(|| settings.confirmation.base_url.clone()),
        )?;

        let poll_interval_secs = helpers::parse_env_or(
            "XPRES_POLL_INTERVAL_SECS",
            settings.confirmation.poll_interval_secs,
        )?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "XPRES_POLL_INTERVAL_SECS".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        let timeout_ms =
            helpers::parse_env_or("XPRES_HTTP_TIMEOUT_MS", settings.confirmation.timeout_ms)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "XPRES_HTTP_TIMEOUT_MS".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        Ok(Self {
            base_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Block explorer used for transaction links.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub base_url: String,
}

impl ExplorerConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let base_url = helpers::validate_base_url(
            "XPRES_EXPLORER_URL",
            &helpers::optional_env("XPRES_EXPLORER_URL")?
                .unwrap_or_else(|| settings.explorer.base_url.clone()),
        )?;
        Ok(Self { base_url })
    }

    /// Link for `hash` on `chain`.
    ///
    /// A configured base URL always wins. With the built-in default, chains
    /// that have a public explorer link there instead.
    pub fn tx_url(&self, chain: &ChainInfo, hash: &str) -> String {
        let base = match chain.explorer_url() {
            Some(known) if self.base_url == DEFAULT_EXPLORER_URL => known,
            _ => self.base_url.as_str(),
        };
        format!("{base}/tx/{hash}")
    }
}

/// Market data listing endpoint.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub base_url: String,
    pub default_limit: usize,
}

impl MarketConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let base_url = helpers::validate_base_url(
            "XPRES_MARKET_URL",
            &helpers::optional_env("XPRES_MARKET_URL")?
                .unwrap_or_else(|| settings.market.base_url.clone()),
        )?;
        Ok(Self {
            base_url,
            default_limit: settings.market.default_limit.clamp(1, 250),
        })
    }
}
