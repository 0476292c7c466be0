mod adapter;
mod config;
mod evaluator;
mod platform;
mod pricebook;
mod router;
mod stats;
mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::adapter::{EventAdapter, Flow};
use crate::config::Settings;
use crate::evaluator::OfferEvaluator;
use crate::platform::{ConsoleClient, EventSource};
use crate::pricebook::PriceBook;
use crate::router::CommandRouter;
use crate::stats::Stats;

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

async fn maybe_write_jsonl(path: &Option<String>, line: &str) {
    if let Some(p) = path.as_ref().map(|x| x.trim().to_string()).filter(|x| !x.is_empty()) {
        if let Ok(mut f) = tokio::fs::OpenOptions::new().create(true).append(true).open(&p).await {
            use tokio::io::AsyncWriteExt;
            let _ = f.write_all(line.as_bytes()).await;
            let _ = f.write_all(b"\n").await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let s = Settings::from_env()?;

    let book = PriceBook::load(&s.prices_path)?;
    let messages = config::Messages::load(&s.messages_path)?;
    tracing::info!(
        priced_items = book.len(),
        basic_commands = messages.basic.len(),
        owner = %s.owner_id,
        "configuration loaded"
    );

    let stats = Stats::new(now_ms());

    let router = CommandRouter::new(
        s.owner_id.clone(),
        s.currency_divisor,
        messages.clone(),
        stats.clone(),
    );
    let evaluator = OfferEvaluator::new(
        s.owner_id.clone(),
        s.pricing_policy,
        messages.trade.clone(),
        stats.clone(),
    );

    let client = Arc::new(ConsoleClient::new(s.owner_id.clone()));
    let adapter = EventAdapter::new(
        client.clone(),
        router,
        evaluator,
        book,
        messages,
        s.message_log_path.clone(),
        stats.clone(),
    );

    tracing::info!("event loop started");
    loop {
        let event = match client.next_event().await? {
            Some(ev) => ev,
            None => {
                tracing::info!("event stream ended");
                break;
            }
        };

        if adapter.handle(event).await? == Flow::Stop {
            break;
        }

        // stats summary
        let t = now_ms();
        if stats.should_log(t, s.stats_log_sec) {
            let ss = stats.snapshot(t);
            stats.mark_logged(t);

            let line = serde_json::to_string(&ss).unwrap_or_default();
            tracing::info!(
                up_sec = ss.up_sec,
                messages_seen = ss.messages_seen,
                invalid_commands = ss.invalid_commands,
                replies_sent = ss.replies_sent,
                offers_evaluated = ss.offers_evaluated,
                offers_accepted = ss.offers_accepted,
                offers_declined = ss.offers_declined,
                unknown_items = ss.unknown_items,
                "stats"
            );

            maybe_write_jsonl(&s.stats_jsonl_path, &line).await;
        }
    }

    tracing::info!("logged off");
    Ok(())
}
