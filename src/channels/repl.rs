//! Interactive REPL channel with line editing and markdown rendering.
//!
//! Uses rustyline for line editing, history, and tab-completion.
//! Uses termimad for rendering agent replies inline.
//!
//! ## Commands
//!
//! - `/help` - Show available commands
//! - `/quit` or `/exit` - Exit the REPL
//! - `/debug` - Toggle debug mode (raw action cards)
//! - `/connect` / `/disconnect` - Wallet account access
//! - `/wallet` - Connected address, balance and chain
//! - `/agents` - Agent status board
//! - `/pending` - Transactions awaiting confirmation
//! - `/details <id>` - Confirmation details
//! - `/coins [n]` - Market listing
//! - `/clear` - Clear the conversation

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use rustyline::completion::Completer;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Editor, Helper};
use termimad::MadSkin;
use tokio::sync::mpsc;

use crate::agent::router::SLASH_COMMANDS;
use crate::agent::{AgentState, AgentStatus, ReplCommand, Router, truncate_for_preview};
use crate::chat::{ChatMessage, ChatSession};
use crate::confirmation::ConfirmationNotice;
use crate::error::{ChannelError, Error, RuntimeErrorPayload};
use crate::market::{self, MarketClient};
use crate::settings::Settings;

/// Max characters for incident messages in the terminal.
const CLI_STATUS_MAX: usize = 200;

/// Rustyline helper for slash-command tab completion.
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let prefix = &line[..pos];
        let matches: Vec<String> = SLASH_COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| cmd.to_string())
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if !line.starts_with('/') || pos < line.len() {
            return None;
        }

        SLASH_COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && **cmd != line)
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Highlighter for ReplHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{hint}\x1b[0m"))
    }
}

impl Validator for ReplHelper {}
impl Helper for ReplHelper {}

/// Build a termimad skin with our color scheme.
fn make_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.set_headers_fg(termimad::crossterm::style::Color::Yellow);
    skin.bold.set_fg(termimad::crossterm::style::Color::White);
    skin.italic
        .set_fg(termimad::crossterm::style::Color::Magenta);
    skin.inline_code
        .set_fg(termimad::crossterm::style::Color::Green);
    skin.code_block
        .set_fg(termimad::crossterm::style::Color::Green);
    skin.code_block.left_margin = 2;
    skin
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80)
}

/// Whether the loop keeps reading input.
enum Flow {
    Continue,
    Quit,
}

/// REPL channel with line editing and markdown rendering.
pub struct ReplChannel {
    /// Optional single message to send (for -m flag).
    single_message: Option<String>,
    /// Debug mode flag (shared with input thread).
    debug_mode: Arc<AtomicBool>,
    router: Router,
}

impl ReplChannel {
    pub fn new() -> Self {
        Self {
            single_message: None,
            debug_mode: Arc::new(AtomicBool::new(false)),
            router: Router::new(),
        }
    }

    /// Create a REPL channel that sends a single message and exits.
    pub fn with_message(message: String) -> Self {
        Self {
            single_message: Some(message),
            ..Self::new()
        }
    }

    fn is_debug(&self) -> bool {
        self.debug_mode.load(Ordering::Relaxed)
    }

    /// Spawn the blocking input thread. Lines arrive on the returned receiver.
    fn start_input(&self) -> Result<mpsc::Receiver<String>, ChannelError> {
        let (tx, rx) = mpsc::channel(32);
        let single_message = self.single_message.clone();
        let debug_mode = Arc::clone(&self.debug_mode);

        std::thread::Builder::new()
            .name("xpres-repl-input".to_string())
            .spawn(move || {
                // Single message mode: send it and return
                if let Some(msg) = single_message {
                    let _ = tx.blocking_send(msg);
                    return;
                }

                let config = Config::builder()
                    .auto_add_history(true)
                    .completion_type(CompletionType::List)
                    .build();

                let mut rl = match Editor::with_config(config) {
                    Ok(editor) => editor,
                    Err(e) => {
                        eprintln!("Failed to initialize line editor: {e}");
                        return;
                    }
                };

                rl.set_helper(Some(ReplHelper));

                let hist_path = history_path();
                if let Some(parent) = hist_path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                let _ = rl.load_history(&hist_path);

                println!("\x1b[1mxpres\x1b[0m  /help for commands, /quit to exit");
                println!();

                loop {
                    let prompt = if debug_mode.load(Ordering::Relaxed) {
                        "\x1b[33m[debug]\x1b[0m \x1b[1;36m\u{203A}\x1b[0m "
                    } else {
                        "\x1b[1;36m\u{203A}\x1b[0m "
                    };

                    match rl.readline(prompt) {
                        Ok(line) => {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }

                            // Commands that need no session state stay on this thread.
                            match line.to_lowercase().as_str() {
                                "/quit" | "/exit" => break,
                                "/help" => {
                                    print_help();
                                    continue;
                                }
                                "/debug" => {
                                    let current = debug_mode.load(Ordering::Relaxed);
                                    debug_mode.store(!current, Ordering::Relaxed);
                                    if !current {
                                        println!("\x1b[90mdebug mode on\x1b[0m");
                                    } else {
                                        println!("\x1b[90mdebug mode off\x1b[0m");
                                    }
                                    continue;
                                }
                                _ => {}
                            }

                            if tx.blocking_send(line.to_string()).is_err() {
                                break;
                            }
                        }
                        Err(ReadlineError::Interrupted) => {
                            println!("\x1b[90m(use /quit or Ctrl+D to exit)\x1b[0m");
                        }
                        Err(ReadlineError::Eof) => break,
                        Err(e) => {
                            eprintln!("Input error: {e}");
                            break;
                        }
                    }
                }

                let _ = rl.save_history(&history_path());
            })
            .map_err(|e| ChannelError::StartupFailed {
                name: "repl".to_string(),
                reason: e.to_string(),
            })?;

        Ok(rx)
    }

    /// Run the chat loop until the user quits or input closes.
    pub async fn run(
        &self,
        session: &ChatSession,
        market: Option<&MarketClient>,
        poll_interval: Duration,
    ) -> Result<(), ChannelError> {
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
        let _poller = session.spawn_poller(poll_interval, notice_tx.clone());
        let mut input = self.start_input()?;

        if self.single_message.is_none() {
            render_latest(session).await;
        }

        loop {
            tokio::select! {
                line = input.recv() => {
                    let Some(line) = line else { break };
                    if let Flow::Quit = self.dispatch(&line, session, market).await {
                        break;
                    }
                }
                Some(notice) = notice_rx.recv() => render_notice(&notice),
            }
        }

        // One-shot mode: give a pending confirmation one poll interval to land.
        if self.single_message.is_some() && !session.pending().await.is_empty() {
            eprintln!("\x1b[90m  waiting {}s for confirmation...\x1b[0m", poll_interval.as_secs());
            tokio::time::sleep(poll_interval).await;
            session.poller().with_notifier(notice_tx).tick().await;
        }
        while let Ok(notice) = notice_rx.try_recv() {
            render_notice(&notice);
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        line: &str,
        session: &ChatSession,
        market: Option<&MarketClient>,
    ) -> Flow {
        let Some(command) = self.router.route_command(line) else {
            let reply = session.handle_input(line).await;
            self.render_reply(&reply);
            return Flow::Continue;
        };

        tracing::debug!(command = command.label(), "REPL command");
        match command {
            ReplCommand::Quit => return Flow::Quit,
            ReplCommand::Help => print_help(),
            ReplCommand::Debug => {
                let current = self.debug_mode.fetch_xor(true, Ordering::Relaxed);
                println!("\x1b[90mdebug mode {}\x1b[0m", if current { "off" } else { "on" });
            }
            ReplCommand::Connect => match session.connect_wallet().await {
                Ok(status) => println!(
                    "  \x1b[32m\u{25CF}\x1b[0m connected {} \x1b[90m({} {} on {})\x1b[0m",
                    status.address, status.balance, status.chain.native_symbol, status.chain.name
                ),
                Err(e) => render_incident(&Error::from(e).to_runtime_error_payload()),
            },
            ReplCommand::Disconnect => match session.disconnect_wallet() {
                Ok(()) => println!("  \x1b[90m\u{25CB} wallet disconnected\x1b[0m"),
                Err(e) => render_incident(&Error::from(e).to_runtime_error_payload()),
            },
            ReplCommand::Wallet => match session.wallet_status().await {
                Ok(status) => {
                    println!("  \x1b[1maddress\x1b[0m  {}", status.address);
                    println!(
                        "  \x1b[1mbalance\x1b[0m  {} {}",
                        status.balance, status.chain.native_symbol
                    );
                    println!(
                        "  \x1b[1mchain\x1b[0m    {} ({})",
                        status.chain.name, status.chain.chain_id
                    );
                }
                Err(e) => render_incident(&Error::from(e).to_runtime_error_payload()),
            },
            ReplCommand::Agents => {
                for line in build_agent_lines(&session.agents()) {
                    println!("{line}");
                }
            }
            ReplCommand::Pending => {
                let pending = session.pending().await;
                if pending.is_empty() {
                    println!("  \x1b[90mno transactions awaiting confirmation\x1b[0m");
                }
                for tx in pending {
                    println!(
                        "  \x1b[33m\u{23F3}\x1b[0m {} \x1b[90m{} on {} (confirmation {})\x1b[0m",
                        tx.hash,
                        tx.amount,
                        tx.chain,
                        tx.confirmation_id.as_deref().unwrap_or("-")
                    );
                }
            }
            ReplCommand::Details { confirmation_id } => {
                let id = confirmation_id.unwrap_or_default();
                match session.details(&id).await {
                    Ok(details) => {
                        let rendered = serde_json::to_string_pretty(&details)
                            .unwrap_or_else(|_| format!("{details:?}"));
                        render_markdown(&format!("```\n{rendered}\n```"));
                    }
                    Err(e) => render_incident(&Error::from(e).to_runtime_error_payload()),
                }
            }
            ReplCommand::Coins { limit } => match market {
                Some(client) => {
                    match client
                        .list_coins(limit.unwrap_or(client.default_limit()))
                        .await
                    {
                        Ok(coins) => render_markdown(&market::render_coin_table(&coins)),
                        Err(e) => render_incident(&Error::from(e).to_runtime_error_payload()),
                    }
                }
                None => println!("  \x1b[90mmarket data is not configured\x1b[0m"),
            },
            ReplCommand::Clear => {
                session.clear().await;
                print!("\x1b[2J\x1b[H");
                render_latest(session).await;
            }
            ReplCommand::Unknown { command } => {
                println!("  \x1b[31munknown command /{command}\x1b[0m \x1b[90m(try /help)\x1b[0m");
            }
        }
        Flow::Continue
    }

    fn render_reply(&self, reply: &ChatMessage) {
        let sep_width = terminal_width().min(80);
        eprintln!("\x1b[90m{}\x1b[0m", "\u{2500}".repeat(sep_width));
        render_markdown(&reply.text);

        if let Some(card) = &reply.action {
            match &card.incident {
                Some(incident) => {
                    eprintln!("  \x1b[31m\u{2717} {} (failed)\x1b[0m", card.kind.label());
                    render_incident(incident);
                }
                None => eprintln!("  \x1b[32m\u{25CF} {}\x1b[0m", card.kind.label()),
            }
            if self.is_debug() {
                eprintln!("    \x1b[90m{:?}\x1b[0m", card.request);
            }
        }
    }
}

impl Default for ReplChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn render_markdown(text: &str) {
    let skin = make_skin();
    let formatted = termimad::FmtText::from(&skin, text, Some(terminal_width()));
    print!("{formatted}");
    println!();
}

/// Render the most recent transcript entry (the welcome line after start or clear).
async fn render_latest(session: &ChatSession) {
    let transcript = session.transcript();
    let guard = transcript.read().await;
    if let Some(message) = guard.last() {
        render_markdown(&message.text);
    }
}

fn render_notice(notice: &ConfirmationNotice) {
    eprintln!("\x1b[34m\u{25CF}\x1b[0m notification");
    eprintln!("  {}", notice.message());
}

fn print_help() {
    let h = "\x1b[1m"; // bold (section headers)
    let c = "\x1b[1;36m"; // bold cyan (commands)
    let d = "\x1b[90m"; // dim gray (descriptions)
    let r = "\x1b[0m"; // reset

    println!();
    println!("  {h}xpres REPL{r}");
    println!();
    println!("  {h}Commands{r}");
    println!("  {c}/help{r}              {d}show this help{r}");
    println!("  {c}/debug{r}             {d}toggle verbose output{r}");
    println!("  {c}/quit{r} {c}/exit{r}        {d}exit the repl{r}");
    println!();
    println!("  {h}Wallet{r}");
    println!("  {c}/connect{r}           {d}request account access{r}");
    println!("  {c}/disconnect{r}        {d}forget the connected account{r}");
    println!("  {c}/wallet{r}            {d}address, balance and chain{r}");
    println!();
    println!("  {h}Agents & confirmations{r}");
    println!("  {c}/agents{r}            {d}agent status board{r}");
    println!("  {c}/pending{r}           {d}transactions awaiting confirmation{r}");
    println!("  {c}/details <id>{r}      {d}confirmation details{r}");
    println!("  {c}/coins [n]{r}         {d}top coins by market cap{r}");
    println!("  {c}/clear{r}             {d}clear conversation{r}");
    println!();
    println!("  {h}Chat{r}");
    println!("  {d}transfer 0.1 ETH to 0x... on sepolia{r}");
    println!("  {d}swap 0.1 ETH to USDC on cappuccino{r}");
    println!("  {d}balance of 0x...{r}");
    println!();
}

fn agent_status_style(status: AgentStatus) -> (&'static str, &'static str) {
    match status {
        AgentStatus::Idle => ("\u{25CB}", "\x1b[90m"),
        AgentStatus::Active => ("\u{25CF}", "\x1b[33m"),
        AgentStatus::Error => ("\u{2717}", "\x1b[31m"),
    }
}

fn build_agent_lines(agents: &[AgentState]) -> Vec<String> {
    agents
        .iter()
        .map(|agent| {
            let (icon, color) = agent_status_style(agent.status);
            format!(
                "  {color}{icon} {}\x1b[0m \x1b[90m{} ({})\x1b[0m",
                agent.id,
                agent.chain,
                agent.status.as_str()
            )
        })
        .collect()
}

fn incident_color(domain: &str) -> &'static str {
    match domain {
        "wallet" => "\x1b[33m",
        "confirmation" => "\x1b[36m",
        "config" => "\x1b[35m",
        _ => "\x1b[31m",
    }
}

static SENSITIVE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\b(bearer)\s+[a-z0-9._\-~+/]+=*", "$1 [REDACTED]"),
        (
            r"(?i)\b(token|api[_\-]?key|secret|password|private[_\-]?key)\b(\s*[:=]\s*)([^,\s]+)",
            "$1$2[REDACTED]",
        ),
        // RPC provider URLs carry the project key as the last path segment.
        (r"(?i)(/v[23]/)[a-z0-9_\-]{16,}", "${1}[REDACTED]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

fn redact_sensitive_preview(raw: &str) -> String {
    let mut value = raw.to_string();
    for (re, replacement) in SENSITIVE_PATTERNS.iter() {
        value = re.replace_all(&value, *replacement).to_string();
    }
    value
}

fn build_incident_lines(incident: &RuntimeErrorPayload) -> Vec<String> {
    let domain = incident.domain.as_str();
    let color = incident_color(domain);
    let message = if incident.message.trim().is_empty() {
        "No incident message provided".to_string()
    } else {
        truncate_for_preview(&redact_sensitive_preview(&incident.message), CLI_STATUS_MAX)
    };
    let retryable = if incident.retryable { "yes" } else { "no" };

    vec![
        format!("  {color}\u{26A0} incident {domain}\x1b[0m"),
        format!("    \x1b[90mcode:\x1b[0m {}", incident.code),
        format!("    \x1b[90mretryable:\x1b[0m {retryable}"),
        format!("    \x1b[90mmessage:\x1b[0m {message}"),
    ]
}

fn render_incident(incident: &RuntimeErrorPayload) {
    for line in build_incident_lines(incident) {
        eprintln!("{line}");
    }
}

/// Get the history file path (~/.xpres/history).
fn history_path() -> std::path::PathBuf {
    Settings::base_dir().join("history")
}
