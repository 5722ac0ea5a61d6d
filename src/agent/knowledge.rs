//! Static response tables used by the intent parser and the chat session.

/// A keyword-triggered explanation.
pub struct Topic {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub response: &'static str,
}

/// Reply to greetings and short affirmatives.
pub const GREETING_MENU: &str = "Hey! Glad you're here. I can walk you through Espresso Network and run a few operations for you 🚀\n\n\
What I do best:\n\
1. ⚡ Fast cross-chain transfers finalized by HotShot consensus\n\
2. 🔄 Token swaps on supported chains\n\
3. 🌐 Rollup integrations with Arbitrum, Optimism and Polygon\n\n\
Try one of these:\n\
• Ask how HotShot consensus works\n\
• Send a cross-chain transfer\n\
• Look at integration options\n\n\
Type 'transfer' or 'swap' to see the command format.";

/// Topic table, checked in order. The first topic with a matching keyword wins.
pub const TOPICS: &[Topic] = &[
    Topic {
        name: "hotshot",
        keywords: &["hotshot", "consensus", "how does it work", "tell me about hotshot"],
        response: "HotShot is the consensus protocol behind Espresso Network 🚀\n\n\
Highlights:\n\
• Transactions confirm in a few seconds\n\
• Cross-chain operations get fast finality\n\
• Mainnet 0 runs it on 100 independent nodes\n\
• Sequencers cannot equivocate\n\
• Confirmed blocks are protected from reorgs\n\n\
Want to watch it work? Send a transfer and follow the confirmation.",
    },
    Topic {
        name: "network",
        keywords: &["network", "espresso network", "tell me about espresso", "what is espresso"],
        response: "Espresso Network is a shared confirmation layer for rollups ☕\n\n\
What it provides:\n\
• One global layer that confirms transactions quickly\n\
• Data availability that costs less than posting to Ethereum\n\
• Support for Arbitrum, OP Stack and Polygon based chains\n\
• Fast finality from HotShot consensus\n\
• Reliability from 100 decentralized nodes\n\n\
Which part should we dig into?",
    },
    Topic {
        name: "security",
        keywords: &["security", "how secure", "protection", "safe"],
        response: "Security comes first on Espresso Network 🔐\n\n\
How it is protected:\n\
• 100 decentralized nodes take part in consensus\n\
• Sequencer equivocation is prevented\n\
• Finalized transactions cannot be reorged\n\
• Finality is immediate once confirmed\n\
• Messages between chains are passed securely\n\n\
Ask about any of these for more detail.",
    },
    Topic {
        name: "integration",
        keywords: &["integrate", "integration", "how to use", "implement"],
        response: "Plugging into Espresso Network is simple 🛠️\n\n\
Supported stacks:\n\
• Arbitrum Orbit\n\
• OP Stack\n\
• Polygon CDK\n\
• Cartesi\n\n\
Test networks you can use today:\n\
• Cappuccino (primary testnet)\n\
• Sepolia (Ethereum testnet)\n\n\
Ready to send a test transaction?",
    },
];

/// Triggers for the topic rotation.
pub const MORE_TRIGGERS: &[&str] = &["tell me more", "more information"];

/// Facts picked at random when the user asks for more.
pub const MORE_FACTS: [&str; 4] = [
    "HotShot consensus confirms transactions in seconds, so cross-chain operations feel instant.",
    "Mainnet 0 runs on 100 decentralized nodes, which keeps transaction processing dependable.",
    "Espresso offers data availability at a lower cost than Ethereum, which cuts rollup operating costs.",
    "Sequencer equivocation is prevented and reorgs are ruled out, which makes the network safer to build on.",
];

pub const MORE_SUFFIX: &str = "\n\nWhich part would you like to explore next?";

/// Generic help triggers, matched by substring on the lowercased input.
pub const HELP_KEYWORDS: &[&str] = &["help", "info", "what", "about"];

pub const HELP_TEXT: &str = "Here is what I can run on Espresso Network:\n\n\
🚀 Cross-chain transfers:\n   transfer 0.1 ETH to 0x... on sepolia\n\n\
🔄 Token swaps:\n   swap 0.1 ETH to USDC on cappuccino\n\n\
💼 Balance checks:\n   balance of 0x...\n\n\
Pick one to try.";

pub const TRANSFER_FORMAT: &str = "Sending a cross-chain transfer:\n\n\
Format: transfer [amount] ETH to [address] on [chain]\n\
Example: transfer 0.1 ETH to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e on sepolia\n\n\
Chains:\n\
• cappuccino (testnet)\n\
• sepolia\n\n\
HotShot confirms transfers within seconds 🚀";

pub const SWAP_FORMAT: &str = "Swapping tokens:\n\n\
Format: swap [amount] [fromToken] to [toToken] on [chain]\n\
Example: swap 0.1 ETH to USDC on cappuccino\n\n\
Tokens:\n\
• ETH\n\
• USDC\n\
• USDT\n\
• DAI\n\n\
Chains:\n\
• cappuccino (testnet)\n\
• sepolia\n\n\
Swaps settle with fast confirmations ⚡";

/// Fallback reply, followed by one lore line.
pub const CAPABILITIES_MENU: &str = "I'm the XpresAI assistant for Espresso Network. Here is what I can do:\n\n\
📚 Explain:\n\
• HotShot consensus\n\
• Network security\n\
• Integration options\n\n\
🔧 Run:\n\
• Cross-chain transfers\n\
• Token swaps\n\
• Balance checks\n\n\
What would you like to know?";

pub const LORE: &[&str] = &[
    "XpresAI was built to make cross-chain operations feel as quick as ordering a coffee.",
    "Every agent on the board watches its own chain and reports back to the same conversation.",
    "The first XpresAI agents were tested on Cappuccino, Espresso's main testnet.",
    "XpresAI trusts the confirmation layer, not the sequencer, to say when a transaction is final.",
    "Agents coordinate across rollups so the user only ever talks to one assistant.",
];

/// Opening lines for a new chat session.
pub const WELCOME_GREETINGS: &[&str] = &[
    "Welcome to XpresAI! I'm your Espresso Network assistant. Ask me about fast cross-chain operations.",
    "Hi! I'm an XpresAI agent on Espresso Network. Want to hear about quick confirmations or try a cross-chain operation?",
    "Hello! I can help you explore XpresAI and Espresso Network:\n\
🚀 Learn how HotShot consensus works\n\
💫 Send a cross-chain transfer\n\
🔄 Swap tokens\n\
💼 Check a balance",
];

/// First topic whose keywords occur in `lowered`.
pub fn find_topic(lowered: &str) -> Option<&'static Topic> {
    TOPICS
        .iter()
        .find(|topic| topic.keywords.iter().any(|keyword| lowered.contains(keyword)))
}
