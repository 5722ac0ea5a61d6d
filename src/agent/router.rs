//! Slash-command routing for the REPL.
//!
//! Messages starting with the command prefix are parsed into a
//! [`ReplCommand`]; everything else goes to the intent parser.

/// Command typed at the REPL prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Quit,
    Debug,
    Connect,
    Disconnect,
    Wallet,
    Agents,
    Pending,
    Details { confirmation_id: Option<String> },
    Coins { limit: Option<usize> },
    Clear,
    /// Unrecognized command, kept for the error message.
    Unknown { command: String },
}

impl ReplCommand {
    /// Stable label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Debug => "debug",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Wallet => "wallet",
            Self::Agents => "agents",
            Self::Pending => "pending",
            Self::Details { .. } => "details",
            Self::Coins { .. } => "coins",
            Self::Clear => "clear",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Slash commands offered for tab completion.
pub const SLASH_COMMANDS: &[&str] = &[
    "/help",
    "/quit",
    "/exit",
    "/debug",
    "/connect",
    "/disconnect",
    "/wallet",
    "/agents",
    "/pending",
    "/details",
    "/coins",
    "/clear",
];

/// Routes explicit commands.
pub struct Router {
    /// Command prefix ("/")
    command_prefix: String,
}

impl Router {
    pub fn new() -> Self {
        Self {
            command_prefix: "/".to_string(),
        }
    }

    /// Parse an explicit command. Returns `None` for ordinary chat text.
    pub fn route_command(&self, content: &str) -> Option<ReplCommand> {
        let without_prefix = content.trim().strip_prefix(&self.command_prefix)?;
        let parts: Vec<&str> = without_prefix.split_whitespace().collect();

        let command = match parts.first().map(|s| s.to_lowercase()).as_deref() {
            Some("help") | Some("?") => ReplCommand::Help,
            Some("quit") | Some("exit") => ReplCommand::Quit,
            Some("debug") => ReplCommand::Debug,
            Some("connect") => ReplCommand::Connect,
            Some("disconnect") => ReplCommand::Disconnect,
            Some("wallet") => ReplCommand::Wallet,
            Some("agents") | Some("status") => ReplCommand::Agents,
            Some("pending") => ReplCommand::Pending,
            Some("details") => ReplCommand::Details {
                confirmation_id: parts.get(1).map(|s| s.to_string()),
            },
            Some("coins") => ReplCommand::Coins {
                limit: parts.get(1).and_then(|s| s.parse().ok()),
            },
            Some("clear") => ReplCommand::Clear,
            Some(other) => ReplCommand::Unknown {
                command: other.to_string(),
            },
            None => ReplCommand::Unknown {
                command: String::new(),
            },
        };
        Some(command)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
