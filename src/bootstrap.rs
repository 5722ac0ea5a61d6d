//! Bootstrap helpers for xpres.
//!
//! Env vars can live in `~/.xpres/.env` so the wallet RPC endpoint and the
//! private key do not have to be exported in every shell.
//!
//! File: `~/.xpres/.env` (standard dotenvy format)

use std::path::PathBuf;

use crate::settings::Settings;

/// Path to the xpres-specific `.env` file: `~/.xpres/.env`.
pub fn xpres_env_path() -> PathBuf {
    Settings::base_dir().join(".env")
}

/// Load env vars from `./.env` and then `~/.xpres/.env`.
///
/// dotenvy never overwrites existing env vars, so the effective priority is:
///
///   explicit env vars > `./.env` > `~/.xpres/.env`
pub fn load_env() {
    let _ = dotenvy::dotenv();

    let path = xpres_env_path();
    if path.exists() {
        let _ = dotenvy::from_path(&path);
    }
}

/// Write bootstrap vars to `~/.xpres/.env`.
///
/// Values are double-quoted so that `#` and other shell-special characters
/// are preserved by dotenvy.
pub fn save_bootstrap_env(vars: &[(&str, &str)]) -> std::io::Result<()> {
    let path = xpres_env_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, render_env(vars))
}

fn render_env(vars: &[(&str, &str)]) -> String {
    let mut content = String::new();
    for (key, value) in vars {
        // Escape backslashes and double quotes so a value cannot break out of
        // its quotes and inject another variable.
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        content.push_str(&format!("{}=\"{}\"\n", key, escaped));
    }
    content
}
