//! Free text to [`Intent`] classification.
//!
//! Rules run in a fixed order and the first match wins:
//!
//! 1. greeting prefix (`hi`, `hello`, `hey`, `gm`, `ho`, `yes`, `please`)
//! 2. topic keywords (hotshot, network, security, integration)
//! 3. "tell me more" / "more information" topic rotation
//! 4. generic help keywords (`help`, `info`, `what`, `about`)
//! 5. bare `transfer` or `swap`
//! 6. transfer command
//! 7. swap command
//! 8. balance command
//! 9. coordinate command
//! 10. capabilities menu plus a lore line
//!
//! Keyword rules look at the trimmed, lowercased input. Command patterns are
//! case-insensitive and run on the trimmed original text so addresses keep
//! the case the user typed.

use std::sync::{LazyLock, Mutex};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::{Captures, Regex};
use uuid::Uuid;

use crate::agent::intent::Intent;
use crate::agent::knowledge;

static GREETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(hi|hello|hey|gm|ho|yes|please)").expect("greeting pattern is valid")
});

static TRANSFER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)transfer\s+([\d.]+)\s*(?:eth)?\s+to\s+(0x[a-f0-9]{40})\b(?:\s+(?:on|from)\s+(\w+))?",
    )
    .expect("transfer pattern is valid")
});

static SWAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)swap\s+([\d.]+)\s+(\w+)\s+to\s+(\w+)(?:\s+on\s+(\w+))?")
        .expect("swap pattern is valid")
});

static BALANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)balance\s+(?:of\s+)?(0x[a-f0-9]{40})\b(?:\s+on\s+(\w+))?")
        .expect("balance pattern is valid")
});

static COORDINATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)coordinate\s+(?:with|between)\s+(\w+)(?:\s+and\s+(\w+))?")
        .expect("coordinate pattern is valid")
});

/// Rule-based intent parser.
///
/// Parsing is synchronous and never fails; unmatched input gets the
/// capabilities menu. The RNG only picks between known canned replies.
pub struct IntentParser {
    agent_id: String,
    default_chain: String,
    rng: Mutex<StdRng>,
}

impl IntentParser {
    pub fn new(default_chain: impl Into<String>) -> Self {
        Self::with_rng(default_chain, StdRng::from_entropy())
    }

    /// Parser with a caller-supplied RNG, for reproducible replies.
    pub fn with_rng(default_chain: impl Into<String>, rng: StdRng) -> Self {
        let short = Uuid::new_v4().simple().to_string();
        Self {
            agent_id: format!("agent-{}", &short[..8]),
            default_chain: default_chain.into().to_ascii_lowercase(),
            rng: Mutex::new(rng),
        }
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Opening line for a new session.
    pub fn welcome(&self) -> &'static str {
        self.pick(knowledge::WELCOME_GREETINGS)
    }

    pub fn parse(&self, input: &str) -> Intent {
        let original = input.trim();
        let lowered = original.to_lowercase();

        if GREETING_RE.is_match(&lowered) {
            return Intent::normal_chat(knowledge::GREETING_MENU);
        }

        if let Some(topic) = knowledge::find_topic(&lowered) {
            tracing::debug!(topic = topic.name, "Matched topic keyword");
            return Intent::normal_chat(topic.response);
        }

        if knowledge::MORE_TRIGGERS
            .iter()
            .any(|trigger| lowered.contains(trigger))
        {
            let fact = self.pick(&knowledge::MORE_FACTS);
            return Intent::normal_chat(format!("{fact}{}", knowledge::MORE_SUFFIX));
        }

        if knowledge::HELP_KEYWORDS
            .iter()
            .any(|keyword| lowered.contains(keyword))
        {
            return Intent::normal_chat(knowledge::HELP_TEXT);
        }

        match lowered.as_str() {
            "transfer" => return Intent::normal_chat(knowledge::TRANSFER_FORMAT),
            "swap" => return Intent::normal_chat(knowledge::SWAP_FORMAT),
            _ => {}
        }

        if let Some(intent) = self.match_transfer(original) {
            return intent;
        }
        if let Some(intent) = self.match_swap(original) {
            return intent;
        }
        if let Some(intent) = self.match_balance(original) {
            return intent;
        }
        if let Some(intent) = self.match_coordinate(original) {
            return intent;
        }

        let lore = self.pick(knowledge::LORE);
        Intent::normal_chat(format!("{}\n\n{lore}", knowledge::CAPABILITIES_MENU))
    }

    fn match_transfer(&self, text: &str) -> Option<Intent> {
        let caps = TRANSFER_RE.captures(text)?;
        let raw_amount = caps.get(1)?.as_str();
        let amount = positive_amount(raw_amount)?;
        let address = caps.get(2)?.as_str();
        let chain = self.chain_or_default(&caps, 3);

        Some(Intent::transfer(
            amount,
            address,
            &chain,
            format!(
                "🚀 Sending {raw_amount} ETH to {address} on {chain}...\n\nHotShot consensus will confirm it within seconds."
            ),
        )
        .with_raw_amount(canonical_amount(raw_amount)))
    }

    fn match_swap(&self, text: &str) -> Option<Intent> {
        let caps = SWAP_RE.captures(text)?;
        let raw_amount = caps.get(1)?.as_str();
        let amount = positive_amount(raw_amount)?;
        let from_token = caps.get(2)?.as_str().to_uppercase();
        let to_token = caps.get(3)?.as_str().to_uppercase();
        let chain = self.chain_or_default(&caps, 4);

        Some(Intent::swap(
            amount,
            &from_token,
            &to_token,
            &chain,
            format!(
                "⚡ Swapping {raw_amount} {from_token} to {to_token} on {chain}...\n\nEspresso Network will settle it quickly."
            ),
        )
        .with_raw_amount(canonical_amount(raw_amount)))
    }

    fn match_balance(&self, text: &str) -> Option<Intent> {
        let caps = BALANCE_RE.captures(text)?;
        let address = caps.get(1)?.as_str();
        let chain = self.chain_or_default(&caps, 2);

        Some(Intent::check_balance(
            address,
            &chain,
            format!("Looking up the balance on {chain}... 💼"),
        ))
    }

    fn match_coordinate(&self, text: &str) -> Option<Intent> {
        let caps = COORDINATE_RE.captures(text)?;
        let source = caps.get(1)?.as_str().to_ascii_lowercase();
        let target = self.chain_or_default(&caps, 2);

        Some(Intent::coordinate(
            &source,
            &target,
            format!(
                "Agent {} is coordinating between {source} and {target}...",
                self.agent_id
            ),
        ))
    }

    fn chain_or_default(&self, caps: &Captures<'_>, group: usize) -> String {
        caps.get(group)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_else(|| self.default_chain.clone())
    }

    fn pick(&self, options: &[&'static str]) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        options.choose(&mut *rng).copied().unwrap_or_default()
    }
}

/// Positive finite amount, or `None` so the rule falls through.
fn positive_amount(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

/// Typed amount with a leading `0` added to `.5` and a trailing `.` dropped.
fn canonical_amount(raw: &str) -> String {
    let trimmed = raw.strip_suffix('.').unwrap_or(raw);
    if trimmed.starts_with('.') {
        format!("0{trimmed}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::intent::IntentKind;
    use pretty_assertions::assert_eq;

    fn parser() -> IntentParser {
        IntentParser::with_rng("cappuccino", StdRng::seed_from_u64(7)).with_agent_id("agent-test")
    }

    #[test]
    fn transfer_with_chain_suffix() {
        let intent = parser().parse(
            "transfer 0.1 ETH to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e on sepolia",
        );
        assert_eq!(intent.intent, IntentKind::Transfer);
        assert_eq!(intent.amount, Some(0.1));
        assert_eq!(
            intent.recipient_address.as_deref(),
            Some("0x742d35Cc6634C0532925a3b844Bc454e4438f44e")
        );
        assert_eq!(intent.source_chain.as_deref(), Some("sepolia"));
        assert_eq!(intent.target_chain.as_deref(), Some("sepolia"));
    }

    #[test]
    fn transfer_without_suffix_uses_default_chain() {
        let intent =
            parser().parse("Transfer 2 to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e");
        assert_eq!(intent.intent, IntentKind::Transfer);
        assert_eq!(intent.amount, Some(2.0));
        assert_eq!(intent.source_chain.as_deref(), Some("cappuccino"));
    }

    #[test]
    fn transfer_from_keyword_and_chain_case() {
        let intent = parser().parse(
            "transfer 0.5 eth to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e from Arbitrum",
        );
        assert_eq!(intent.source_chain.as_deref(), Some("arbitrum"));
    }

    #[test]
    fn zero_or_malformed_amount_falls_through() {
        let zero = parser().parse("transfer 0 ETH to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e");
        assert_eq!(zero.intent, IntentKind::NormalChat);

        let dotted =
            parser().parse("transfer 1.2.3 ETH to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e");
        assert_eq!(dotted.intent, IntentKind::NormalChat);
    }

    #[test]
    fn swap_uppercases_tokens_and_defaults_chain() {
        let intent = parser().parse("swap 0.1 eth to usdc");
        assert_eq!(intent.intent, IntentKind::Swap);
        assert_eq!(intent.amount, Some(0.1));
        assert_eq!(intent.source_token.as_deref(), Some("ETH"));
        assert_eq!(intent.destination_token.as_deref(), Some("USDC"));
        assert_eq!(intent.source_chain.as_deref(), Some("cappuccino"));
        assert_eq!(intent.target_chain.as_deref(), Some("cappuccino"));
    }

    #[test]
    fn balance_keeps_address_case() {
        let intent = parser().parse("balance of 0xABCDEF0123456789ABCDEF0123456789ABCDEF01");
        assert_eq!(intent.intent, IntentKind::CheckBalance);
        assert_eq!(
            intent.wallet_address.as_deref(),
            Some("0xABCDEF0123456789ABCDEF0123456789ABCDEF01")
        );
        assert_eq!(intent.source_chain.as_deref(), Some("cappuccino"));
    }

    #[test]
    fn coordinate_names_the_agent() {
        let intent = parser().parse("coordinate with Arbitrum");
        assert_eq!(intent.intent, IntentKind::Coordinate);
        assert_eq!(intent.source_chain.as_deref(), Some("arbitrum"));
        assert_eq!(intent.target_chain.as_deref(), Some("cappuccino"));
        assert!(intent.general_response.contains("agent-test"));
        assert!(intent.to_action().is_none());
    }

    #[test]
    fn greeting_returns_menu() {
        let intent = parser().parse("hello");
        assert_eq!(intent.intent, IntentKind::NormalChat);
        assert_eq!(intent.general_response, knowledge::GREETING_MENU);

        // Prefix match only: "gm ser" is a greeting, "say hi" is not.
        assert_eq!(parser().parse("GM ser").general_response, knowledge::GREETING_MENU);
        assert_ne!(parser().parse("say hi").general_response, knowledge::GREETING_MENU);
    }

    #[test]
    fn topics_win_over_help() {
        let intent = parser().parse("what is espresso");
        assert_eq!(intent.general_response, knowledge::TOPICS[1].response);

        let help = parser().parse("can you help me");
        assert_eq!(help.general_response, knowledge::HELP_TEXT);
    }

    #[test]
    fn bare_commands_show_format() {
        assert_eq!(parser().parse("  Transfer ").general_response, knowledge::TRANSFER_FORMAT);
        assert_eq!(parser().parse("swap").general_response, knowledge::SWAP_FORMAT);
    }

    #[test]
    fn tell_me_more_rotates_known_facts() {
        let parser = parser();
        for _ in 0..8 {
            let intent = parser.parse("tell me more");
            assert_eq!(intent.intent, IntentKind::NormalChat);
            assert!(
                knowledge::MORE_FACTS
                    .iter()
                    .any(|fact| intent.general_response.starts_with(fact))
            );
        }
    }

    #[test]
    fn fallback_appends_a_lore_line() {
        let intent = parser().parse("xyzzy");
        assert_eq!(intent.intent, IntentKind::NormalChat);
        assert!(intent.general_response.starts_with(knowledge::CAPABILITIES_MENU));
        assert!(
            knowledge::LORE
                .iter()
                .any(|line| intent.general_response.ends_with(line))
        );
    }

    #[test]
    fn seeded_parsers_agree() {
        let a = IntentParser::with_rng("cappuccino", StdRng::seed_from_u64(42));
        let b = IntentParser::with_rng("cappuccino", StdRng::seed_from_u64(42));
        for _ in 0..4 {
            assert_eq!(a.parse("gibberish"), b.parse("gibberish"));
        }
    }

    #[test]
    fn typed_amount_reaches_the_wallet_unrounded() {
        use crate::agent::actions::ActionRequest;
        use ethers::types::U256;

        let cases = [
            ("1.000000000000000001", "1000000000000000001"),
            ("0.123456789012345678", "123456789012345678"),
            ("12345678.9000000001", "12345678900000000100000000"),
        ];
        for (typed, wei) in cases {
            let intent = parser().parse(&format!(
                "transfer {typed} ETH to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
            ));
            let Some(ActionRequest::Transfer(action)) = intent.to_action() else {
                panic!("no transfer action for {typed}");
            };
            assert_eq!(action.amount, typed);
            assert_eq!(
                crate::wallet::parse_amount(&action.amount).unwrap(),
                U256::from_dec_str(wei).unwrap()
            );
        }

        let swap = parser().parse("swap 0.000000000000000001 eth to usdc");
        let Some(ActionRequest::Swap(action)) = swap.to_action() else {
            panic!("no swap action");
        };
        assert_eq!(action.amount, "0.000000000000000001");
    }

    #[test]
    fn bare_decimal_points_are_normalized() {
        assert_eq!(canonical_amount(".5"), "0.5");
        assert_eq!(canonical_amount("5."), "5");
        assert_eq!(canonical_amount("0.25"), "0.25");
    }
}
