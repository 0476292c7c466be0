use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::platform::{EventSource, PlatformClient};
use crate::types::{ItemRef, PlatformEvent};

/// Observer-mode collaborator: stdin lines become chat messages from the
/// configured sender, and every action is a structured log line instead of
/// a platform call. Lets the whole loop run without a live session.
pub struct ConsoleClient {
    sender_id: String,
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleClient {
    pub fn new(sender_id: String) -> Self {
        Self {
            sender_id,
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

#[async_trait]
impl EventSource for ConsoleClient {
    async fn next_event(&self) -> anyhow::Result<Option<PlatformEvent>> {
        let mut lines = self.lines.lock().await;
        Ok(lines.next_line().await?.map(|text| PlatformEvent::MessageReceived {
            sender_id: self.sender_id.clone(),
            text,
        }))
    }
}

#[async_trait]
impl PlatformClient for ConsoleClient {
    async fn send_chat_message(&self, to: &str, text: &str) -> anyhow::Result<()> {
        tracing::info!(to = %to, text = %text, "chat message");
        Ok(())
    }

    async fn accept_offer(&self, offer_id: &str) -> anyhow::Result<()> {
        tracing::info!(offer_id = %offer_id, "accept offer");
        Ok(())
    }

    async fn decline_offer(&self, offer_id: &str) -> anyhow::Result<()> {
        tracing::info!(offer_id = %offer_id, "decline offer");
        Ok(())
    }

    async fn fetch_inventory(&self, user_id: &str) -> anyhow::Result<Vec<ItemRef>> {
        tracing::info!(user_id = %user_id, "fetch inventory (observer mode, empty)");
        Ok(vec![])
    }

    async fn add_friend(&self, user_id: &str) -> anyhow::Result<()> {
        tracing::info!(user_id = %user_id, "add friend");
        Ok(())
    }

    async fn persona_name(&self, _user_id: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}
