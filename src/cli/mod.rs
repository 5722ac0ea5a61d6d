//! Command-line interface for the `xpres` binary.

pub mod doctor;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::agent::{AgentRuntime, AgentStatusBoard, EvmPlugin, IntentParser, SwapRouterTable};
use crate::channels::ReplChannel;
use crate::chat::ChatSession;
use crate::config::Config;
use crate::confirmation::{ConfirmationClient, ConfirmationService};
use crate::error::WalletError;
use crate::market::{self, MarketClient};
use crate::settings::Settings;
use crate::wallet::{EvmWallet, WalletProvider};

pub use doctor::run_doctor_command;

#[derive(Parser, Debug)]
#[command(name = "xpres", version, about = "Chat with an agent that sends EVM transfers and swaps")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Send a single message, print the reply and exit.
    #[arg(short = 'm', long)]
    pub message: Option<String>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat (default).
    Chat,

    /// Parse a message and print the intent as JSON without executing it.
    Parse {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Fetch confirmation details for an id.
    Details { confirmation_id: String },

    /// Top coins by market cap.
    Coins {
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Manage ~/.xpres/config.toml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Probe configuration and external services.
    Doctor {
        /// Exit non-zero when any check fails.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Write a commented config file with defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,

        /// Also store XPRES_RPC_URL in ~/.xpres/.env.
        #[arg(long)]
        rpc_url: Option<String>,
    },

    /// Print the resolved configuration with secrets redacted.
    Show,
}

/// Dispatch the parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        None | Some(Command::Chat) => run_chat(cli.message).await,
        Some(Command::Parse { text }) => run_parse(&text.join(" ")),
        Some(Command::Details { confirmation_id }) => run_details(&confirmation_id).await,
        Some(Command::Coins { limit }) => run_coins(limit).await,
        Some(Command::Config { command }) => run_config(command),
        Some(Command::Doctor { strict }) => run_doctor_command(strict).await,
    }
}

/// Wire wallet, confirmation client, plugin and runtime into a session.
pub fn build_session(config: &Config) -> anyhow::Result<ChatSession> {
    let wallet: Option<Arc<dyn WalletProvider>> = match EvmWallet::from_config(&config.wallet) {
        Ok(evm) => {
            tracing::info!(local_signer = evm.uses_local_signer(), "Wallet provider ready");
            let evm: Arc<dyn WalletProvider> = Arc::new(evm);
            Some(evm)
        }
        Err(WalletError::NotInstalled) => {
            tracing::warn!("XPRES_RPC_URL is not set, wallet actions are unavailable");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let confirmation: Arc<dyn ConfirmationService> =
        Arc::new(ConfirmationClient::new(&config.confirmation)?);

    let plugin = Arc::new(EvmPlugin::new(
        wallet.clone(),
        Arc::clone(&confirmation),
        config.explorer.clone(),
        SwapRouterTable::with_overrides(&config.chat.swap_routers),
    ));
    let runtime = AgentRuntime::new(AgentStatusBoard::new(&config.chat.agent_chains))
        .with_plugin(plugin);

    Ok(ChatSession::new(
        IntentParser::new(config.chat.default_chain.clone()),
        Arc::new(runtime),
        wallet,
        confirmation,
    ))
}

async fn run_chat(message: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let session = build_session(&config)?;

    let market = match MarketClient::new(&config.market, config.confirmation.timeout) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!("Market data disabled: {}", e);
            None
        }
    };

    let channel = match message {
        Some(message) => ReplChannel::with_message(message),
        None => ReplChannel::new(),
    };
    channel
        .run(&session, market.as_ref(), config.confirmation.poll_interval)
        .await?;
    Ok(())
}

fn run_parse(text: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let intent = IntentParser::new(config.chat.default_chain).parse(text);
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}

async fn run_details(confirmation_id: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = ConfirmationClient::new(&config.confirmation)?;
    let details = client.get_confirmation_details(confirmation_id).await?;
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}

async fn run_coins(limit: Option<usize>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = MarketClient::new(&config.market, config.confirmation.timeout)?;
    let coins = client
        .list_coins(limit.unwrap_or(client.default_limit()))
        .await?;
    print!("{}", market::render_coin_table(&coins));
    Ok(())
}

fn run_config(command: ConfigCommand) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Init { force, rpc_url } => {
            let path = Settings::default_toml_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Settings::default()
                .save_toml(&path)
                .map_err(anyhow::Error::msg)?;
            println!("Wrote {}", path.display());

            if let Some(rpc_url) = rpc_url {
                let rpc_url =
                    crate::config::helpers::validate_base_url("XPRES_RPC_URL", &rpc_url)?;
                crate::bootstrap::save_bootstrap_env(&[("XPRES_RPC_URL", rpc_url.as_str())])?;
                println!("Saved XPRES_RPC_URL to {}", crate::bootstrap::xpres_env_path().display());
            }
            Ok(())
        }
        ConfigCommand::Show => {
            let config = Config::load()?;
            for line in config.summary_lines() {
                println!("{line}");
            }
            Ok(())
        }
    }
}
