//! Error types for xpres-agent.

use serde::Serialize;

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Confirmation service error: {0}")]
    Confirmation(#[from] ConfirmationError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Market data error: {0}")]
    Market(#[from] MarketError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Failure domains surfaced as incidents in the chat transcript.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeErrorDomain {
    Wallet,
    Confirmation,
    Dispatch,
    Config,
    Unknown,
}

impl RuntimeErrorDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::Confirmation => "confirmation",
            Self::Dispatch => "dispatch",
            Self::Config => "config",
            Self::Unknown => "runtime",
        }
    }
}

/// Structured incident payload rendered by the REPL.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RuntimeErrorPayload {
    pub domain: RuntimeErrorDomain,
    pub code: &'static str,
    pub retryable: bool,
    pub message: String,
}

impl RuntimeErrorPayload {
    fn new(
        domain: RuntimeErrorDomain,
        code: &'static str,
        retryable: bool,
        message: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            code,
            retryable,
            message: message.into(),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Wallet provider errors.
///
/// The first three variants carry the fixed messages shown in the chat
/// transcript; they are never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("No wallet found. Please install a wallet provider.")]
    NotInstalled,

    #[error("Transaction rejected by user")]
    Rejected,

    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Wallet provider returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Wallet provider request failed: {0}")]
    Provider(String),
}

/// JSON-RPC code an EIP-1193 provider returns when the user rejects a prompt.
pub const RPC_CODE_USER_REJECTED: i64 = 4001;

/// JSON-RPC code returned when no account is authorized for the request.
pub const RPC_CODE_NOT_CONNECTED: i64 = -32602;

impl WalletError {
    /// Map a provider JSON-RPC error code onto the wallet taxonomy.
    pub fn from_rpc_code(code: i64, message: impl Into<String>) -> Self {
        match code {
            RPC_CODE_USER_REJECTED => Self::Rejected,
            RPC_CODE_NOT_CONNECTED => Self::NotConnected,
            _ => Self::Rpc {
                code,
                message: message.into(),
            },
        }
    }
}

/// Confirmation service errors.
///
/// Only `get_confirmation_details` propagates these; registration and
/// status checks log and degrade instead.
#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    #[error("Confirmation ID is required")]
    MissingId,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Confirmation service returned {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Invalid response from confirmation service: {0}")]
    InvalidResponse(String),

    #[error("Invalid confirmation service URL: {0}")]
    InvalidUrl(String),
}

/// Action dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("No plugin could handle action: {action}")]
    NoPluginForAction { action: String },

    #[error("Invalid parameters for action {action}: {reason}")]
    InvalidParameters { action: String, reason: String },

    #[error("No swap router configured for chain '{chain}'")]
    SwapRouterNotConfigured { chain: String },

    #[error("Transaction {hash} was dropped before inclusion")]
    TransactionDropped { hash: String },

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// Market data listing errors.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Market data service returned {status}: {reason}")]
    Status { status: u16, reason: String },
}

/// Channel (REPL) errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },
}

impl WalletError {
    fn to_runtime_error_payload(&self) -> RuntimeErrorPayload {
        match self {
            Self::NotInstalled => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Wallet,
                "wallet.not_installed",
                false,
                self.to_string(),
            ),
            Self::Rejected => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Wallet,
                "wallet.user_rejected",
                false,
                self.to_string(),
            ),
            Self::NotConnected => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Wallet,
                "wallet.not_connected",
                false,
                self.to_string(),
            ),
            Self::InvalidAddress(_) | Self::InvalidAmount { .. } => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Wallet,
                "wallet.invalid_request",
                false,
                self.to_string(),
            ),
            Self::InvalidKey(_) => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Config,
                "config.invalid_private_key",
                false,
                self.to_string(),
            ),
            Self::Rpc { .. } | Self::Provider(_) => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Wallet,
                "wallet.provider_failed",
                true,
                self.to_string(),
            ),
        }
    }
}

impl RuntimeError {
    fn to_runtime_error_payload(&self) -> RuntimeErrorPayload {
        match self {
            Self::Wallet(inner) => inner.to_runtime_error_payload(),
            Self::NoPluginForAction { .. } => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Dispatch,
                "dispatch.no_plugin",
                false,
                self.to_string(),
            ),
            Self::InvalidParameters { .. } => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Dispatch,
                "dispatch.invalid_parameters",
                false,
                self.to_string(),
            ),
            Self::SwapRouterNotConfigured { .. } => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Config,
                "config.swap_router_missing",
                false,
                self.to_string(),
            ),
            Self::TransactionDropped { .. } => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Wallet,
                "wallet.transaction_dropped",
                true,
                self.to_string(),
            ),
        }
    }
}

impl Error {
    /// Incident payload for the REPL status surface.
    pub fn to_runtime_error_payload(&self) -> RuntimeErrorPayload {
        match self {
            Self::Wallet(inner) => inner.to_runtime_error_payload(),
            Self::Runtime(inner) => inner.to_runtime_error_payload(),
            Self::Confirmation(inner) => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Confirmation,
                "confirmation.request_failed",
                !matches!(inner, ConfirmationError::MissingId),
                self.to_string(),
            ),
            Self::Config(_) => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Config,
                "config.invalid",
                false,
                self.to_string(),
            ),
            Self::Market(_) | Self::Channel(_) => RuntimeErrorPayload::new(
                RuntimeErrorDomain::Unknown,
                "runtime.unclassified",
                true,
                self.to_string(),
            ),
        }
    }
}
