//! Client for the external transaction confirmation service.
//!
//! The three operations fail differently on purpose: registration returns
//! an empty id, status checks return `false`, and detail lookups propagate
//! the error to the caller.

pub mod poller;

pub use poller::{ConfirmationNotice, ConfirmationPoller, PollerHandle};

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::config::ConfirmationConfig;
use crate::error::ConfirmationError;

/// Confirmation record returned by `GET {base}/details/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationDetails {
    pub status: String,
    pub confirmations: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_chain: Option<String>,
    /// Unix timestamp (milliseconds) of finalization, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<i64>,
}

impl ConfirmationDetails {
    pub fn is_confirmed(&self) -> bool {
        self.status == "confirmed"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    tx_hash: &'a str,
    chain: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    confirmation_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

/// Confirmation operations used by the runtime and the poller.
#[async_trait]
pub trait ConfirmationService: Send + Sync {
    /// Register a submitted transaction. Returns an empty string on any failure.
    async fn register_transaction(&self, tx_hash: &str, chain: &str) -> String;

    /// `true` iff the service reports the id as confirmed. `false` on any failure.
    async fn check_confirmation(&self, confirmation_id: &str) -> bool;

    async fn get_confirmation_details(
        &self,
        confirmation_id: &str,
    ) -> Result<ConfirmationDetails, ConfirmationError>;
}

/// HTTP implementation of [`ConfirmationService`].
#[derive(Debug, Clone)]
pub struct ConfirmationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ConfirmationClient {
    pub fn new(config: &ConfirmationConfig) -> Result<Self, ConfirmationError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConfirmationError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfirmationError::InvalidUrl(config.base_url.clone()));
        }
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ConfirmationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConfirmationError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn try_register(&self, tx_hash: &str, chain: &str) -> Result<String, ConfirmationError> {
        let response = self
            .http
            .post(self.endpoint(&["register"])?)
            .json(&RegisterRequest { tx_hash, chain })
            .send()
            .await?;
        let response = ensure_success(response)?;
        let body: RegisterResponse = response
            .json()
            .await
            .map_err(|e| ConfirmationError::InvalidResponse(e.to_string()))?;
        Ok(body.confirmation_id)
    }

    async fn try_check(&self, confirmation_id: &str) -> Result<bool, ConfirmationError> {
        let response = self
            .http
            .get(self.endpoint(&["status", confirmation_id])?)
            .send()
            .await?;
        let response = ensure_success(response)?;
        let body: StatusResponse = response
            .json()
            .await
            .map_err(|e| ConfirmationError::InvalidResponse(e.to_string()))?;
        Ok(body.status == "confirmed")
    }
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ConfirmationError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ConfirmationError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        })
    }
}

#[async_trait]
impl ConfirmationService for ConfirmationClient {
    async fn register_transaction(&self, tx_hash: &str, chain: &str) -> String {
        match self.try_register(tx_hash, chain).await {
            Ok(confirmation_id) => {
                tracing::info!(tx_hash, chain, confirmation_id = %confirmation_id, "Registered transaction");
                confirmation_id
            }
            Err(e) => {
                tracing::warn!(tx_hash, chain, "Confirmation registration failed: {}", e);
                String::new()
            }
        }
    }

    async fn check_confirmation(&self, confirmation_id: &str) -> bool {
        if confirmation_id.is_empty() {
            return false;
        }
        match self.try_check(confirmation_id).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                tracing::warn!(confirmation_id, "Failed to check confirmation status: {}", e);
                false
            }
        }
    }

    async fn get_confirmation_details(
        &self,
        confirmation_id: &str,
    ) -> Result<ConfirmationDetails, ConfirmationError> {
        if confirmation_id.is_empty() {
            return Err(ConfirmationError::MissingId);
        }
        let response = self
            .http
            .get(self.endpoint(&["details", confirmation_id])?)
            .send()
            .await?;
        let response = ensure_success(response)?;
        response
            .json()
            .await
            .map_err(|e| ConfirmationError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(base: &str) -> ConfirmationClient {
        ConfirmationClient::new(&ConfirmationConfig {
            base_url: base.to_string(),
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_millis(500),
        })
        .unwrap()
    }

    #[test]
    fn endpoints_append_encoded_segments() {
        let nested = client("http://localhost:8080/api/confirmation");
        assert_eq!(
            nested.endpoint(&["status", "abc 1"]).unwrap().as_str(),
            "http://localhost:8080/api/confirmation/status/abc%201"
        );

        let trailing = client("http://localhost:8080/api/");
        assert_eq!(
            trailing.endpoint(&["register"]).unwrap().as_str(),
            "http://localhost:8080/api/register"
        );
    }

    #[test]
    fn details_parse_camel_case() {
        let details: ConfirmationDetails = serde_json::from_str(
            r#"{"status":"confirmed","confirmations":12,"targetChain":"sepolia","finalizedAt":1700000000000}"#,
        )
        .unwrap();
        assert!(details.is_confirmed());
        assert_eq!(details.target_chain.as_deref(), Some("sepolia"));

        let minimal: ConfirmationDetails =
            serde_json::from_str(r#"{"status":"pending","confirmations":0}"#).unwrap();
        assert!(!minimal.is_confirmed());
        assert_eq!(minimal.finalized_at, None);
    }

    #[tokio::test]
    async fn empty_id_is_rejected_without_a_request() {
        let offline = client("http://127.0.0.1:9");
        assert!(!offline.check_confirmation("").await);
        assert!(matches!(
            offline.get_confirmation_details("").await,
            Err(ConfirmationError::MissingId)
        ));
    }

    #[tokio::test]
    async fn unreachable_service_degrades_for_register_and_check() {
        let offline = client("http://127.0.0.1:9");
        assert_eq!(offline.register_transaction("0xabc", "sepolia").await, "");
        assert!(!offline.check_confirmation("conf-1").await);
        assert!(offline.get_confirmation_details("conf-1").await.is_err());
    }
}
