//! `xpres doctor` - active health diagnostics.
//!
//! Resolves configuration and probes the wallet RPC, confirmation service,
//! block explorer and market data endpoints so problems surface before a
//! transfer is attempted. Each check reports pass/fail with guidance.

use std::time::Duration;

use crate::config::Config;
use crate::error::WalletError;
use crate::wallet::{EvmWallet, WalletProvider};

/// Run diagnostic checks and print results.
pub async fn run_doctor_command(strict: bool) -> anyhow::Result<()> {
    println!("xpres doctor");
    println!("============\n");

    let mut passed = 0u32;
    let mut failed = 0u32;

    let config = match Config::load() {
        Ok(config) => {
            check(
                "Configuration",
                CheckResult::Pass(crate::settings::Settings::default_toml_path().display().to_string()),
                &mut passed,
                &mut failed,
            );
            config
        }
        Err(e) => {
            check(
                "Configuration",
                CheckResult::Fail(e.to_string()),
                &mut passed,
                &mut failed,
            );
            println!("\n  Fix the configuration error before running other checks.");
            anyhow::bail!("configuration is invalid: {e}");
        }
    };

    // ── Wallet ────────────────────────────────────────────────

    check(
        "Wallet RPC",
        check_wallet_rpc(&config).await,
        &mut passed,
        &mut failed,
    );

    // ── HTTP services ─────────────────────────────────────────

    let timeout = config.confirmation.timeout.min(Duration::from_secs(5));
    check(
        "Confirmation service",
        probe_http_endpoint("confirmation", &config.confirmation.base_url, timeout).await,
        &mut passed,
        &mut failed,
    );
    check(
        "Block explorer",
        probe_http_endpoint("explorer", &config.explorer.base_url, timeout).await,
        &mut passed,
        &mut failed,
    );
    check(
        "Market data",
        probe_http_endpoint("market", &format!("{}/ping", config.market.base_url), timeout).await,
        &mut passed,
        &mut failed,
    );

    // ── Summary ───────────────────────────────────────────────

    println!();
    println!("  {passed} passed, {failed} failed");

    if failed > 0 {
        println!("\n  Some checks failed. Chat still works; affected actions will report errors.");
        if strict {
            anyhow::bail!("doctor strict mode failed with {failed} check(s)");
        }
    }

    Ok(())
}

// ── Individual checks ───────────────────────────────────────

fn check(name: &str, result: CheckResult, passed: &mut u32, failed: &mut u32) {
    match result {
        CheckResult::Pass(detail) => {
            *passed += 1;
            println!("  [pass] {name}: {detail}");
        }
        CheckResult::Fail(detail) => {
            *failed += 1;
            println!("  [FAIL] {name}: {detail}");
        }
        CheckResult::Skip(reason) => {
            println!("  [skip] {name}: {reason}");
        }
    }
}

enum CheckResult {
    Pass(String),
    Fail(String),
    Skip(String),
}

async fn check_wallet_rpc(config: &Config) -> CheckResult {
    let wallet = match EvmWallet::from_config(&config.wallet) {
        Ok(wallet) => wallet,
        Err(WalletError::NotInstalled) => {
            return CheckResult::Skip("XPRES_RPC_URL not set".to_string());
        }
        Err(e) => return CheckResult::Fail(e.to_string()),
    };

    let signer = if wallet.uses_local_signer() {
        "local signer"
    } else {
        "remote signer"
    };
    match wallet.chain_info().await {
        Ok(chain) => CheckResult::Pass(format!(
            "{} (chain {}, {signer})",
            chain.name, chain.chain_id
        )),
        Err(e) => CheckResult::Fail(format!(
            "{} unreachable: {e}",
            redact_url_for_display(config.wallet.rpc_url.as_deref().unwrap_or_default())
        )),
    }
}

async fn probe_http_endpoint(label: &str, endpoint: &str, timeout: Duration) -> CheckResult {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return CheckResult::Fail(format!("{label} endpoint is empty"));
    }

    let url = match reqwest::Url::parse(endpoint) {
        Ok(url) => url,
        Err(e) => {
            return CheckResult::Fail(format!(
                "{label} endpoint URL is invalid ({}): {e}",
                redact_url_for_display(endpoint)
            ));
        }
    };

    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => return CheckResult::Fail(format!("cannot construct HTTP client: {e}")),
    };

    match client.get(url.clone()).send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_server_error() {
                CheckResult::Fail(format!(
                    "{label} reachable but unhealthy ({} at {})",
                    status,
                    redact_url_for_display(url.as_str())
                ))
            } else {
                CheckResult::Pass(format!(
                    "{} ({status})",
                    redact_url_for_display(url.as_str())
                ))
            }
        }
        Err(e) => CheckResult::Fail(format!(
            "{label} unreachable ({}): {e}",
            redact_url_for_display(url.as_str())
        )),
    }
}

/// Hide basic-auth credentials and the provider key path segment.
fn redact_url_for_display(raw: &str) -> String {
    match reqwest::Url::parse(raw) {
        Ok(mut url) => {
            if !url.username().is_empty() {
                let _ = url.set_username("redacted");
            }
            if url.password().is_some() {
                let _ = url.set_password(Some("redacted"));
            }
            let redacted_path = url.path_segments().and_then(|segments| {
                let segments: Vec<&str> = segments.collect();
                match segments.as_slice() {
                    [version, key] if version.starts_with('v') && key.len() >= 16 => {
                        Some(format!("/{version}/redacted"))
                    }
                    _ => None,
                }
            });
            if let Some(path) = redacted_path {
                url.set_path(&path);
            }
            url.to_string()
        }
        Err(_) => "<invalid-url>".to_string(),
    }
}
