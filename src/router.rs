use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::Messages;
use crate::pricebook::PriceBook;
use crate::stats::Stats;
use crate::types::{ChatCommand, Decision, ItemRef};

/// What a normalized chat line resolved to. Matching order is a deliberate
/// precedence policy: quit outranks everything, canned replies outrank the
/// built-ins, and transport echoes are filtered before the fallback.
#[derive(Debug)]
enum CommandKind<'a> {
    Quit,
    Basic(&'a str),
    Upcoming,
    Help,
    ValuateInventory,
    Prices(PricesQuery),
    OfferEcho,
    Unknown,
}

#[derive(Debug)]
enum PricesQuery {
    Buy,
    Sell,
    Item(String),
}

/// Normalization applied before any matching: trim, strip one leading "!",
/// lowercase.
fn normalize(raw: &str) -> String {
    let t = raw.trim();
    let t = t.strip_prefix('!').unwrap_or(t);
    t.to_lowercase()
}

pub struct CommandRouter {
    owner_id: String,
    divisor: Decimal,
    messages: Messages,
    /// command -> description, assembled once; `help` renders it in key order.
    descriptions: BTreeMap<String, String>,
    stats: Arc<Stats>,
}

impl CommandRouter {
    pub fn new(owner_id: String, divisor: u32, messages: Messages, stats: Arc<Stats>) -> Self {
        let mut descriptions: BTreeMap<String, String> = BTreeMap::new();
        descriptions.insert("help".into(), "list every command".into());
        descriptions.insert(
            "prices".into(),
            "list prices: prices [buy|sell|<item>]".into(),
        );
        descriptions.insert("valuemyinv".into(), "value your tradable inventory".into());
        descriptions.insert("quit".into(), "owner only: log the bot off".into());
        for (cmd, basic) in &messages.basic {
            descriptions.insert(cmd.clone(), basic.description.clone());
        }
        Self {
            owner_id,
            divisor: Decimal::from(divisor),
            messages,
            descriptions,
            stats,
        }
    }

    pub fn route(&self, cmd: &ChatCommand, book: &PriceBook) -> Decision {
        let content = normalize(&cmd.raw_text);
        match self.resolve(&content) {
            CommandKind::Quit => {
                if cmd.sender_id == self.owner_id {
                    tracing::info!(sender = %cmd.sender_id, "authorized shutdown");
                    Decision::Shutdown
                } else {
                    tracing::warn!(sender = %cmd.sender_id, "unauthorized shutdown attempt");
                    Decision::Reply(self.messages.attempted_shutdown.clone())
                }
            }
            CommandKind::Basic(reply) => Decision::Reply(reply.to_string()),
            CommandKind::Upcoming => {
                tracing::info!(content = %content, "upcoming feature hinted");
                Decision::Reply(self.messages.upcoming_feature.clone())
            }
            CommandKind::Help => Decision::Reply(self.help_text()),
            CommandKind::ValuateInventory => Decision::ValuateInventory,
            CommandKind::Prices(q) => Decision::Reply(self.prices_reply(&q, book)),
            CommandKind::OfferEcho => Decision::NoAction,
            CommandKind::Unknown => {
                self.stats.inc_invalid_command();
                tracing::info!(content = %content, "invalid command");
                Decision::NoAction
            }
        }
    }

    fn resolve<'a>(&'a self, content: &str) -> CommandKind<'a> {
        if content == "quit" {
            return CommandKind::Quit;
        }
        if let Some(basic) = self.messages.basic.get(content) {
            return CommandKind::Basic(&basic.reply);
        }
        if self.messages.upcoming_features.iter().any(|f| f == content) {
            return CommandKind::Upcoming;
        }
        if content == "help" {
            return CommandKind::Help;
        }
        if content == "valuemyinv" || content == "value" {
            return CommandKind::ValuateInventory;
        }
        if content == "prices" || content.starts_with("prices ") {
            let arg = content.strip_prefix("prices").unwrap_or("").trim();
            return CommandKind::Prices(match arg {
                "" | "buy" => PricesQuery::Buy,
                "sell" => PricesQuery::Sell,
                item => PricesQuery::Item(item.to_string()),
            });
        }
        if content.starts_with(&self.messages.offer_echo_prefix) {
            return CommandKind::OfferEcho;
        }
        CommandKind::Unknown
    }

    /// One "- <command> - <description>" line per registered command, in the
    /// mapping's iteration order.
    fn help_text(&self) -> String {
        self.descriptions
            .iter()
            .map(|(cmd, desc)| format!("- {cmd} - {desc}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn prices_reply(&self, q: &PricesQuery, book: &PriceBook) -> String {
        match q {
            PricesQuery::Buy => self.price_listing(book, |e| e.buy),
            PricesQuery::Sell => self.price_listing(book, |e| e.sell),
            PricesQuery::Item(name) => {
                // Input is lowercased by normalization, book keys are not.
                let found = book
                    .iter()
                    .find(|(market_name, _)| market_name.eq_ignore_ascii_case(name));
                match found {
                    Some((market_name, e)) => format!(
                        "{market_name} - buy {}, sell {}",
                        self.format_currency(e.buy),
                        self.format_currency(e.sell)
                    ),
                    None => "invalid item or command".to_string(),
                }
            }
        }
    }

    fn price_listing(
        &self,
        book: &PriceBook,
        side: impl Fn(&crate::pricebook::PriceEntry) -> Decimal,
    ) -> String {
        book.iter()
            .map(|(name, e)| format!("{name} - {}", self.format_currency(side(e))))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Sum of buy prices over tradable, priced items. Unpriced or untradable
    /// items contribute nothing.
    pub fn inventory_value(&self, items: &[ItemRef], book: &PriceBook) -> Decimal {
        items
            .iter()
            .filter(|i| i.tradable)
            .filter_map(|i| book.get(&i.market_name))
            .map(|e| e.buy)
            .sum()
    }

    pub fn inventory_value_reply(&self, items: &[ItemRef], book: &PriceBook) -> String {
        let value = self.inventory_value(items, book);
        format!("{}{}", self.messages.value_prefix, self.format_currency(value))
    }

    /// Display-time conversion only: divide by the configured divisor and
    /// round half-up to 2 decimals. Decision logic never calls this.
    fn format_currency(&self, v: Decimal) -> String {
        let converted =
            (v / self.divisor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{converted}{}", self.messages.unit_label)
    }
}
