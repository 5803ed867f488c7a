use async_trait::async_trait;

use crate::{domain::ChannelId, messaging::types::OutgoingMessage, Result};

/// Outbound side of the chat platform.
///
/// Replies to interactions are rendered by the adapter directly; this port
/// covers messages the bot posts on its own (due-date reminders).
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_message(&self, channel: &ChannelId, msg: OutgoingMessage) -> Result<()>;
}
