use std::collections::BTreeMap;

use anyhow::Context;
use serde::Deserialize;

fn default_prices_path() -> String {
    "prices.json".to_string()
}

fn default_messages_path() -> String {
    "messages.json".to_string()
}

fn default_message_log_path() -> String {
    "messages.txt".to_string()
}

fn default_currency_divisor() -> u32 {
    9
}

/// Which price side is charged on each half of an offer. The original bot's
/// two code paths disagreed on this, so it stays a config decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingPolicy {
    /// Items we give are valued at their sell price, items we receive at
    /// their buy price.
    #[default]
    Defensive,
    /// The opposite assignment.
    Mirrored,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub owner_id: String,

    #[serde(default = "default_prices_path")]
    pub prices_path: String,
    #[serde(default = "default_messages_path")]
    pub messages_path: String,
    #[serde(default = "default_message_log_path")]
    pub message_log_path: String,

    #[serde(default = "default_currency_divisor")]
    pub currency_divisor: u32,
    #[serde(default)]
    pub pricing_policy: PricingPolicy,

    // Stats
    #[serde(default)]
    pub stats_log_sec: u64,
    #[serde(default)]
    pub stats_jsonl_path: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let c = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;
        Ok(c.try_deserialize()?)
    }
}

fn default_unit_label() -> String {
    "ref".to_string()
}

fn default_offer_echo_prefix() -> String {
    "[tradeoffer".to_string()
}

fn default_logging_off() -> String {
    "logging off".to_string()
}

/// A canned command: exact keyword -> fixed reply, plus the description line
/// shown by `help`.
#[derive(Debug, Clone, Deserialize)]
pub struct BasicCommand {
    pub reply: String,
    pub description: String,
}

/// Reply templates sent around accept/decline actions, keyed by the
/// classification reason.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeMessages {
    pub admin_trade: String,
    pub donation: String,
    pub stealing: String,
    pub sufficient: String,
    pub insufficient: String,
    /// Warning prefix for an unpriced item on the giving side.
    pub not_giving: String,
    /// Warning prefix for an unpriced item on the receiving side.
    pub not_receiving: String,
}

/// The whole reply-template surface, loaded once at startup from a JSON
/// file and never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct Messages {
    pub attempted_shutdown: String,
    pub upcoming_feature: String,
    #[serde(default = "default_logging_off")]
    pub logging_off: String,
    pub added: String,
    pub promoted_prefix: String,
    pub promoted: String,
    /// Prefix of the inventory-valuation reply, e.g. "your backpack is worth ".
    pub value_prefix: String,
    #[serde(default = "default_unit_label")]
    pub unit_label: String,
    /// Chat lines starting with this token are transport echoes of trade
    /// offers, not commands.
    #[serde(default = "default_offer_echo_prefix")]
    pub offer_echo_prefix: String,
    #[serde(default)]
    pub upcoming_features: Vec<String>,
    pub basic: BTreeMap<String, BasicCommand>,
    pub trade: TradeMessages,
}

impl Messages {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read messages file {path}"))?;
        let m: Messages = serde_json::from_str(&raw)
            .with_context(|| format!("decode messages file {path}"))?;
        Ok(m)
    }
}
