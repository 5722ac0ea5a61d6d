//! User settings persistence.
//!
//! Stores user preferences in ~/.xpres/config.toml.
//! Settings are loaded with env var > config.toml > default priority.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Chain used when a command omits its `on <chain>` suffix.
pub const DEFAULT_CHAIN: &str = "cappuccino";

/// User settings persisted to disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Wallet provider settings.
    #[serde(default)]
    pub wallet: WalletSettings,

    /// Chat and intent parsing behaviour.
    #[serde(default)]
    pub chat: ChatSettings,

    /// Confirmation service endpoint and poll cadence.
    #[serde(default)]
    pub confirmation: ConfirmationSettings,

    /// Block explorer used to build transaction links.
    #[serde(default)]
    pub explorer: ExplorerSettings,

    /// Market data listing endpoint.
    #[serde(default)]
    pub market: MarketSettings,

    /// Extra or overriding swap routers, keyed by chain name.
    #[serde(default)]
    pub swap_routers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WalletSettings {
    /// JSON-RPC endpoint of the wallet provider (a node or a signer like Frame).
    #[serde(default)]
    pub rpc_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatSettings {
    #[serde(default = "default_chain")]
    pub default_chain: String,

    /// Chains shown on the agent status board, one slot each.
    #[serde(default = "default_agent_chains")]
    pub agent_chains: Vec<String>,
}

fn default_chain() -> String {
    DEFAULT_CHAIN.to_string()
}

fn default_agent_chains() -> Vec<String> {
    vec![
        "cappuccino".to_string(),
        "sepolia".to_string(),
        "arbitrum".to_string(),
    ]
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_chain: default_chain(),
            agent_chains: default_agent_chains(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationSettings {
    #[serde(default = "default_confirmation_url")]
    pub base_url: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_confirmation_url() -> String {
    "http://localhost:8080/api/confirmation".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            base_url: default_confirmation_url(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_ms: default_http_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplorerSettings {
    #[serde(default = "default_explorer_url")]
    pub base_url: String,
}

/// Explorer used when neither settings nor env name one.
pub const DEFAULT_EXPLORER_URL: &str = "https://sepolia.etherscan.io";

fn default_explorer_url() -> String {
    DEFAULT_EXPLORER_URL.to_string()
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            base_url: default_explorer_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSettings {
    #[serde(default = "default_market_url")]
    pub base_url: String,

    #[serde(default = "default_market_limit")]
    pub default_limit: usize,
}

fn default_market_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_market_limit() -> usize {
    20
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            base_url: default_market_url(),
            default_limit: default_market_limit(),
        }
    }
}

impl Settings {
    /// Base directory for agent state (~/.xpres).
    pub fn base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".xpres")
    }

    /// Default TOML config file path (~/.xpres/config.toml).
    pub fn default_toml_path() -> PathBuf {
        Self::base_dir().join("config.toml")
    }

    /// Load settings from the default TOML path, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_toml(&Self::default_toml_path()) {
            Ok(Some(settings)) => settings,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("Failed to load config file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from a TOML file.
    ///
    /// Returns `None` if the file doesn't exist. Returns an error only
    /// if the file exists but can't be parsed.
    pub fn load_toml(path: &Path) -> Result<Option<Self>, String> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("failed to read {}: {}", path.display(), e)),
        };

        let mut settings: Self = toml::from_str(&data)
            .map_err(|e| format!("invalid TOML in {}: {}", path.display(), e))?;
        settings.normalize();
        Ok(Some(settings))
    }

    /// Write a commented TOML config file with current settings.
    pub fn save_toml(&self, path: &Path) -> Result<(), String> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize settings: {}", e))?;

        let content = format!(
            "# xpres configuration file.\n\
             #\n\
             # Priority: env var > this file > defaults.\n\
             # The wallet private key is read from XPRES_PRIVATE_KEY only and\n\
             # is never written here.\n\
             # Run `xpres config init` to regenerate this file.\n\
             \n\
             {raw}"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }

        std::fs::write(path, content)
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))
    }

    fn normalize(&mut self) {
        self.chat.default_chain = self.chat.default_chain.trim().to_ascii_lowercase();
        if self.chat.default_chain.is_empty() {
            tracing::warn!("Empty chat.default_chain in settings, using {}", DEFAULT_CHAIN);
            self.chat.default_chain = default_chain();
        }
        self.swap_routers = std::mem::take(&mut self.swap_routers)
            .into_iter()
            .map(|(chain, router)| (chain.trim().to_ascii_lowercase(), router.trim().to_string()))
            .filter(|(chain, router)| !chain.is_empty() && !router.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_toml(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[chat]\ndefault_chain = \" Sepolia \"\n\n[swap_routers]\nArbitrum = \"0x0000000000000000000000000000000000000001\"\n",
        )
        .unwrap();

        let settings = Settings::load_toml(&path).unwrap().unwrap();
        assert_eq!(settings.chat.default_chain, "sepolia");
        assert_eq!(settings.chat.agent_chains, default_agent_chains());
        assert_eq!(settings.confirmation.poll_interval_secs, 5);
        assert_eq!(
            settings.swap_routers.get("arbitrum").map(String::as_str),
            Some("0x0000000000000000000000000000000000000001")
        );
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.wallet.rpc_url = Some("http://127.0.0.1:8545".to_string());
        settings.confirmation.poll_interval_secs = 2;
        settings.save_toml(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("# xpres configuration file."));

        let loaded = Settings::load_toml(&path).unwrap().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chat\n").unwrap();

        let err = Settings::load_toml(&path).unwrap_err();
        assert!(err.contains("invalid TOML"));
    }
}
