pub mod console;

use async_trait::async_trait;

use crate::types::{ItemRef, PlatformEvent};

/// Event side of the platform collaborator. `None` means the stream ended
/// (logged off / connection closed) and the loop should exit.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn next_event(&self) -> anyhow::Result<Option<PlatformEvent>>;
}

/// Action side of the platform collaborator. All network plumbing (session,
/// auth, confirmations, timeouts) lives behind these calls.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn send_chat_message(&self, to: &str, text: &str) -> anyhow::Result<()>;

    async fn accept_offer(&self, offer_id: &str) -> anyhow::Result<()>;

    async fn decline_offer(&self, offer_id: &str) -> anyhow::Result<()>;

    async fn fetch_inventory(&self, user_id: &str) -> anyhow::Result<Vec<ItemRef>>;

    async fn add_friend(&self, user_id: &str) -> anyhow::Result<()>;

    /// Display name for an identity, if the platform knows one.
    async fn persona_name(&self, user_id: &str) -> anyhow::Result<Option<String>>;
}

pub use console::ConsoleClient;
