use crate::error::DeliveryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::utils::parse_channel_mention;

pub mod discord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: u64,
    pub name: String,
}

/// A message event as seen by the dispatcher.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: u64,
    pub content: String,
    pub author: UserRef,
    pub channel_id: u64,
    /// `None` for private (direct message) channels
    pub server_id: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub raw_mentions: Vec<u64>,
    pub raw_channel_mentions: Vec<u64>,
}

impl InboundMessage {
    pub fn is_private(&self) -> bool {
        self.server_id.is_none()
    }
}

/// A custom emoji and the servers carrying one by that name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiMatch {
    pub name: String,
    pub url: String,
    pub servers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub id: u64,
    pub channel_id: u64,
}

/// The messaging platform as the bot sees it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, channel_id: u64, text: &str) -> Result<SentMessage, DeliveryError>;

    async fn edit(
        &self,
        channel_id: u64,
        message_id: u64,
        text: &str,
    ) -> Result<SentMessage, DeliveryError>;

    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), DeliveryError>;

    /// Looks up a member of a server, `None` when unknown.
    fn member(&self, server_id: u64, user_id: u64) -> Option<UserRef>;

    /// Looks up a channel of a server, `None` when unknown.
    fn channel(&self, server_id: u64, channel_id: u64) -> Option<ChannelRef>;

    /// Finds a custom emoji by exact name across every visible server.
    fn emoji(&self, name: &str) -> Option<EmojiMatch>;

    /// Visible members whose legacy discriminator equals `discriminator`.
    fn users_with_discriminator(&self, discriminator: u16) -> Vec<UserRef>;

    /// Replaces the account's "playing" status.
    fn set_status(&self, text: &str);

    /// The account's current voice connection on a server.
    async fn voice_channel(&self, server_id: u64) -> Option<ChannelRef>;

    async fn join_voice(&self, server_id: u64, channel_id: u64) -> Result<(), DeliveryError>;

    async fn leave_voice(&self, server_id: u64) -> Result<(), DeliveryError>;
}

/// Ids of `<#id>` channel mentions in `content`, in order of first appearance.
pub fn channel_mentions(content: &str) -> Vec<u64> {
    let mut ids = Vec::new();
    let words = content.split_whitespace().map(|word| {
        word.trim_start_matches(|c: char| c != '<')
            .trim_end_matches(|c: char| c != '>')
    });
    for channel in words.filter_map(parse_channel_mention) {
        if !ids.contains(&channel.get()) {
            ids.push(channel.get());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_mentions() {
        assert_eq!(
            channel_mentions("see <#10>, <#20> and (<#10>)"),
            vec![10, 20]
        );
        assert!(channel_mentions("<@10> <#abc> #general").is_empty());
    }
}
