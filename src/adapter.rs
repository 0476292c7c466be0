use std::sync::Arc;

use anyhow::Result;
use tokio::io::AsyncWriteExt;

use crate::config::Messages;
use crate::evaluator::OfferEvaluator;
use crate::platform::PlatformClient;
use crate::pricebook::PriceBook;
use crate::router::CommandRouter;
use crate::stats::Stats;
use crate::types::{
    ChatCommand, Decision, OfferReason, PlatformEvent, RelationshipState, TradeOffer,
};

/// What the event loop should do after an event is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Glue between the platform collaborator and the two decision engines.
/// Engines return `Decision` values; this is the only place that turns them
/// into collaborator calls. Collaborator I/O failures are logged and
/// swallowed; evaluator contract violations propagate.
pub struct EventAdapter {
    client: Arc<dyn PlatformClient>,
    router: CommandRouter,
    evaluator: OfferEvaluator,
    book: PriceBook,
    messages: Messages,
    message_log_path: String,
    stats: Arc<Stats>,
}

impl EventAdapter {
    pub fn new(
        client: Arc<dyn PlatformClient>,
        router: CommandRouter,
        evaluator: OfferEvaluator,
        book: PriceBook,
        messages: Messages,
        message_log_path: String,
        stats: Arc<Stats>,
    ) -> Self {
        Self { client, router, evaluator, book, messages, message_log_path, stats }
    }

    pub async fn handle(&self, event: PlatformEvent) -> Result<Flow> {
        match event {
            PlatformEvent::SessionEstablished => {
                tracing::info!("session established");
                Ok(Flow::Continue)
            }
            PlatformEvent::MessageReceived { sender_id, text } => {
                self.handle_message(&sender_id, &text).await
            }
            PlatformEvent::RelationshipChanged { sender_id, state } => {
                self.handle_relationship(&sender_id, state).await;
                Ok(Flow::Continue)
            }
            PlatformEvent::OfferReceived(offer) => {
                self.handle_offer(&offer).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn handle_message(&self, sender_id: &str, text: &str) -> Result<Flow> {
        self.stats.inc_message();
        let name = self.display_name(sender_id).await;
        tracing::info!(sender = %name, text = %text, "message received");
        self.append_message_log(&name, text).await;

        let cmd = ChatCommand { raw_text: text.to_string(), sender_id: sender_id.to_string() };
        match self.router.route(&cmd, &self.book) {
            Decision::Reply(reply) => {
                self.send(sender_id, &reply).await;
                Ok(Flow::Continue)
            }
            Decision::ValuateInventory => {
                match self.client.fetch_inventory(sender_id).await {
                    Ok(items) => {
                        let reply = self.router.inventory_value_reply(&items, &self.book);
                        self.send(sender_id, &reply).await;
                    }
                    Err(e) => {
                        tracing::error!(sender = %sender_id, error = %e, "inventory fetch failed");
                    }
                }
                Ok(Flow::Continue)
            }
            Decision::Shutdown => {
                self.send(sender_id, &self.messages.logging_off).await;
                tracing::info!("shutting down on owner command");
                Ok(Flow::Stop)
            }
            Decision::NoAction | Decision::AcceptOffer(_) | Decision::DeclineOffer(_) => {
                Ok(Flow::Continue)
            }
        }
    }

    async fn handle_offer(&self, offer: &TradeOffer) -> Result<()> {
        tracing::info!(
            offer_id = %offer.id,
            partner = %offer.partner_id,
            message = %offer.message,
            "offer received"
        );
        let verdict = self.evaluator.evaluate(offer, &self.book)?;
        let offer_id = offer.id.to_string();
        match verdict.decision {
            Decision::AcceptOffer(reason) => {
                if let Err(e) = self.client.accept_offer(&offer_id).await {
                    tracing::error!(offer_id = %offer_id, error = %e, "accept failed");
                } else {
                    self.stats.inc_offer_accepted();
                }
                self.send(&offer.partner_id, self.reason_reply(reason)).await;
            }
            Decision::DeclineOffer(reason) => {
                if let Err(e) = self.client.decline_offer(&offer_id).await {
                    tracing::error!(offer_id = %offer_id, error = %e, "decline failed");
                } else {
                    self.stats.inc_offer_declined();
                }
                // A glitched offer gets no chat, matching the platform's own
                // silence on invalid-state offers.
                if reason != OfferReason::Glitched {
                    self.send(&offer.partner_id, self.reason_reply(reason)).await;
                }
            }
            _ => {}
        }
        for warning in &verdict.warnings {
            self.send(&offer.partner_id, warning).await;
        }
        Ok(())
    }

    async fn handle_relationship(&self, sender_id: &str, state: RelationshipState) {
        match state {
            RelationshipState::IncomingRequest => {
                tracing::info!(sender = %sender_id, "friend request received");
                if let Err(e) = self.client.add_friend(sender_id).await {
                    tracing::error!(sender = %sender_id, error = %e, "add friend failed");
                    return;
                }
                self.send(sender_id, &self.messages.added).await;
                let promo =
                    format!("{}{}", self.messages.promoted_prefix, self.messages.promoted);
                self.send(sender_id, &promo).await;
            }
            RelationshipState::Friend => {
                let name = self.display_name(sender_id).await;
                tracing::info!(sender = %name, "now friends");
            }
            RelationshipState::Removed => {
                tracing::info!(sender = %sender_id, "relationship removed");
            }
        }
    }

    fn reason_reply(&self, reason: OfferReason) -> &str {
        let t = &self.messages.trade;
        match reason {
            // Unreachable in practice, glitched declines skip the chat.
            OfferReason::Glitched => &t.insufficient,
            OfferReason::Admin => &t.admin_trade,
            OfferReason::Donation => &t.donation,
            OfferReason::Stealing => &t.stealing,
            OfferReason::Sufficient => &t.sufficient,
            OfferReason::Insufficient => &t.insufficient,
        }
    }

    async fn send(&self, to: &str, text: &str) {
        if let Err(e) = self.client.send_chat_message(to, text).await {
            tracing::error!(to = %to, error = %e, "send failed");
        } else {
            self.stats.inc_reply();
        }
    }

    async fn display_name(&self, sender_id: &str) -> String {
        match self.client.persona_name(sender_id).await {
            Ok(Some(name)) => name,
            Ok(None) => format!("[{sender_id}]"),
            Err(e) => {
                tracing::error!(sender = %sender_id, error = %e, "persona lookup failed");
                format!("[{sender_id}]")
            }
        }
    }

    /// Append-only plain-text log: resolved name, then the raw message, one
    /// line each. Never read back; failures are logged and ignored.
    async fn append_message_log(&self, name: &str, text: &str) {
        let line = format!("{name}\n{text}\n");
        let open = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.message_log_path)
            .await;
        match open {
            Ok(mut f) => {
                if let Err(e) = f.write_all(line.as_bytes()).await {
                    tracing::error!(path = %self.message_log_path, error = %e, "message log write failed");
                }
            }
            Err(e) => {
                tracing::error!(path = %self.message_log_path, error = %e, "message log open failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_messages;
    use crate::config::PricingPolicy;
    use crate::pricebook::tests::sample_book;
    use crate::types::ItemRef;
    use async_trait::async_trait;
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Action {
        Chat(String, String),
        Accept(String),
        Decline(String),
        AddFriend(String),
        FetchInventory(String),
    }

    #[derive(Default)]
    struct MockClient {
        actions: std::sync::Mutex<Vec<Action>>,
        inventory: Vec<ItemRef>,
        fail_sends: bool,
    }

    impl MockClient {
        fn actions(&self) -> Vec<Action> {
            self.actions.lock().unwrap().clone()
        }

        fn record(&self, a: Action) {
            self.actions.lock().unwrap().push(a);
        }
    }

    #[async_trait]
    impl PlatformClient for MockClient {
        async fn send_chat_message(&self, to: &str, text: &str) -> anyhow::Result<()> {
            if self.fail_sends {
                anyhow::bail!("send refused");
            }
            self.record(Action::Chat(to.to_string(), text.to_string()));
            Ok(())
        }

        async fn accept_offer(&self, offer_id: &str) -> anyhow::Result<()> {
            self.record(Action::Accept(offer_id.to_string()));
            Ok(())
        }

        async fn decline_offer(&self, offer_id: &str) -> anyhow::Result<()> {
            self.record(Action::Decline(offer_id.to_string()));
            Ok(())
        }

        async fn fetch_inventory(&self, user_id: &str) -> anyhow::Result<Vec<ItemRef>> {
            self.record(Action::FetchInventory(user_id.to_string()));
            Ok(self.inventory.clone())
        }

        async fn add_friend(&self, user_id: &str) -> anyhow::Result<()> {
            self.record(Action::AddFriend(user_id.to_string()));
            Ok(())
        }

        async fn persona_name(&self, _user_id: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
    }

    fn adapter_with(client: Arc<MockClient>) -> EventAdapter {
        let stats = crate::stats::Stats::new(0);
        let messages = sample_messages();
        let router =
            CommandRouter::new("owner-1".into(), 9, messages.clone(), stats.clone());
        let evaluator = OfferEvaluator::new(
            "owner-1".into(),
            PricingPolicy::Defensive,
            messages.trade.clone(),
            stats.clone(),
        );
        let log_path = std::env::temp_dir()
            .join(format!("barter-bot-test-{}.txt", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned();
        EventAdapter::new(
            client,
            router,
            evaluator,
            sample_book(),
            messages,
            log_path,
            stats,
        )
    }

    fn offer(partner: &str, give: &[&str], receive: &[&str]) -> TradeOffer {
        TradeOffer {
            id: Uuid::new_v4(),
            partner_id: partner.to_string(),
            items_to_give: give.iter().map(|n| ItemRef::tradable(n)).collect(),
            items_to_receive: receive.iter().map(|n| ItemRef::tradable(n)).collect(),
            message: String::new(),
            is_glitched: false,
        }
    }

    #[tokio::test]
    async fn sufficient_offer_accepts_then_replies() {
        let client = Arc::new(MockClient::default());
        let adapter = adapter_with(client.clone());
        let o = offer("stranger", &["Hat"], &["Hat", "Hat"]);
        let id = o.id.to_string();

        let flow = adapter.handle(PlatformEvent::OfferReceived(o)).await.unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            client.actions(),
            vec![
                Action::Accept(id),
                Action::Chat("stranger".into(), "fair deal, accepting".into()),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_give_item_declines_and_warns() {
        let client = Arc::new(MockClient::default());
        let adapter = adapter_with(client.clone());
        let o = offer("stranger", &["UnknownItem"], &["Hat"]);
        let id = o.id.to_string();

        adapter.handle(PlatformEvent::OfferReceived(o)).await.unwrap();
        let actions = client.actions();
        assert_eq!(actions[0], Action::Decline(id));
        assert_eq!(
            actions[1],
            Action::Chat("stranger".into(), "not enough value, declined".into())
        );
        let Action::Chat(_, warning) = &actions[2] else { panic!("expected warning chat") };
        assert!(warning.contains("UnknownItem"));
        assert_eq!(actions.len(), 3);
    }

    #[tokio::test]
    async fn glitched_offer_declines_silently() {
        let client = Arc::new(MockClient::default());
        let adapter = adapter_with(client.clone());
        let mut o = offer("stranger", &["Hat"], &["Hat"]);
        o.is_glitched = true;
        let id = o.id.to_string();
        adapter.handle(PlatformEvent::OfferReceived(o)).await.unwrap();
        assert_eq!(client.actions(), vec![Action::Decline(id)]);
    }

    #[tokio::test]
    async fn malformed_offer_propagates() {
        let client = Arc::new(MockClient::default());
        let adapter = adapter_with(client.clone());
        let o = offer("", &["Hat"], &["Hat"]);
        assert!(adapter.handle(PlatformEvent::OfferReceived(o)).await.is_err());
        assert!(client.actions().is_empty());
    }

    #[tokio::test]
    async fn owner_quit_stops_the_loop() {
        let client = Arc::new(MockClient::default());
        let adapter = adapter_with(client.clone());
        let flow = adapter
            .handle(PlatformEvent::MessageReceived {
                sender_id: "owner-1".into(),
                text: "!quit".into(),
            })
            .await
            .unwrap();
        assert_eq!(flow, Flow::Stop);
        assert_eq!(
            client.actions(),
            vec![Action::Chat("owner-1".into(), "logging off".into())]
        );
    }

    #[tokio::test]
    async fn stranger_quit_continues_with_reply() {
        let client = Arc::new(MockClient::default());
        let adapter = adapter_with(client.clone());
        let flow = adapter
            .handle(PlatformEvent::MessageReceived {
                sender_id: "stranger-7".into(),
                text: "!quit".into(),
            })
            .await
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            client.actions(),
            vec![Action::Chat(
                "stranger-7".into(),
                "nice try, only the owner can do that".into()
            )]
        );
    }

    #[tokio::test]
    async fn inventory_valuation_fetches_then_replies() {
        let client = Arc::new(MockClient {
            inventory: vec![ItemRef::tradable("Hat"), ItemRef::tradable("Key")],
            ..Default::default()
        });
        let adapter = adapter_with(client.clone());
        adapter
            .handle(PlatformEvent::MessageReceived {
                sender_id: "stranger".into(),
                text: "!valuemyinv".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            client.actions(),
            vec![
                Action::FetchInventory("stranger".into()),
                // (10 + 50) / 9 = 6.67
                Action::Chat(
                    "stranger".into(),
                    "your tradable inventory is worth 6.67ref".into()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn friend_request_adds_and_welcomes() {
        let client = Arc::new(MockClient::default());
        let adapter = adapter_with(client.clone());
        adapter
            .handle(PlatformEvent::RelationshipChanged {
                sender_id: "newcomer".into(),
                state: RelationshipState::IncomingRequest,
            })
            .await
            .unwrap();
        assert_eq!(
            client.actions(),
            vec![
                Action::AddFriend("newcomer".into()),
                Action::Chat("newcomer".into(), "hi, thanks for adding me".into()),
                Action::Chat(
                    "newcomer".into(),
                    "psst: try !help to see what I can do".into()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn send_failure_is_not_fatal() {
        let client = Arc::new(MockClient { fail_sends: true, ..Default::default() });
        let adapter = adapter_with(client.clone());
        let flow = adapter
            .handle(PlatformEvent::MessageReceived {
                sender_id: "anyone".into(),
                text: "!hello".into(),
            })
            .await
            .unwrap();
        assert_eq!(flow, Flow::Continue);
    }

    #[tokio::test]
    async fn messages_are_appended_to_the_log() {
        let client = Arc::new(MockClient::default());
        let adapter = adapter_with(client.clone());
        let path = adapter.message_log_path.clone();
        adapter
            .handle(PlatformEvent::MessageReceived {
                sender_id: "u1".into(),
                text: "hello bot".into(),
            })
            .await
            .unwrap();
        let logged = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(logged, "[u1]\nhello bot\n");
        let _ = tokio::fs::remove_file(&path).await;
    }
}
