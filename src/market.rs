//! Read-only market listing (CoinGecko compatible `coins/markets`).

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::MarketConfig;
use crate::error::MarketError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub current_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub market_cap: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price_change_percentage_24h: Option<Decimal>,
}

pub struct MarketClient {
    http: reqwest::Client,
    base_url: String,
    default_limit: usize,
}

impl MarketClient {
    pub fn new(config: &MarketConfig, timeout: Duration) -> Result<Self, MarketError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("xpres/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            default_limit: config.default_limit,
        })
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Top coins by market cap, in USD.
    pub async fn list_coins(&self, limit: usize) -> Result<Vec<Coin>, MarketError> {
        let per_page = limit.clamp(1, 250).to_string();
        let response = self
            .http
            .get(format!("{}/coins/markets", self.base_url))
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("sparkline", "false"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let coins: Vec<Coin> = response.json().await?;
        tracing::debug!(count = coins.len(), "Fetched market listing");
        Ok(coins)
    }
}

/// Markdown table for the REPL and `xpres coins`.
pub fn render_coin_table(coins: &[Coin]) -> String {
    let mut out = String::from("| # | Coin | Price (USD) | 24h | Market cap |\n|---|---|---|---|---|\n");
    for (index, coin) in coins.iter().enumerate() {
        let rank = coin
            .market_cap_rank
            .map(|rank| rank.to_string())
            .unwrap_or_else(|| (index + 1).to_string());
        let price = coin
            .current_price
            .map(|p| format!("${}", p.round_dp(6).normalize()))
            .unwrap_or_else(|| "-".to_string());
        let change = coin
            .price_change_percentage_24h
            .map(|c| {
                let rounded = c.round_dp(2);
                if rounded.is_sign_negative() {
                    format!("{rounded}%")
                } else {
                    format!("+{rounded}%")
                }
            })
            .unwrap_or_else(|| "-".to_string());
        let cap = coin
            .market_cap
            .map(|cap| format!("${}", cap.round()))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "| {rank} | {} ({}) | {price} | {change} | {cap} |\n",
            coin.name,
            coin.symbol.to_uppercase()
        ));
    }
    out
}
