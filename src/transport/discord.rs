//! serenity-backed [`Transport`] and the gateway event handler that feeds
//! the dispatcher.

use super::{
    channel_mentions, ChannelRef, EmojiMatch, InboundMessage, SentMessage, Transport, UserRef,
};
use crate::config::Config;
use crate::error::DeliveryError;
use crate::state::BotState;
use crate::{dispatch, Data};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    ActivityData, Cache, ChannelId, ChannelType, Context, EditMessage, EventHandler, GuildId, Http,
    Message, MessageId, Ready, ShardMessenger, UserId,
};
use serenity::http::HttpError;
use songbird::Songbird;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{error, info, warn};

pub struct DiscordTransport {
    http: Arc<Http>,
    cache: Arc<Cache>,
    shard: ShardMessenger,
    voice: Option<Arc<Songbird>>,
}

impl DiscordTransport {
    pub fn new(
        http: Arc<Http>,
        cache: Arc<Cache>,
        shard: ShardMessenger,
        voice: Option<Arc<Songbird>>,
    ) -> Self {
        Self {
            http,
            cache,
            shard,
            voice,
        }
    }

    fn voice(&self) -> Result<&Arc<Songbird>, DeliveryError> {
        self.voice
            .as_ref()
            .ok_or_else(|| DeliveryError::Transport("voice client not initialized".to_string()))
    }

    fn is_voice_channel(&self, server_id: u64, channel_id: u64) -> bool {
        self.cache
            .guild(GuildId::new(server_id))
            .and_then(|guild| {
                guild
                    .channels
                    .get(&ChannelId::new(channel_id))
                    .map(|channel| matches!(channel.kind, ChannelType::Voice | ChannelType::Stage))
            })
            .unwrap_or(false)
    }
}

fn classify(e: serenity::Error) -> DeliveryError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &e {
        match response.status_code.as_u16() {
            403 => return DeliveryError::Forbidden,
            404 => return DeliveryError::NotFound,
            _ => {}
        }
    }
    DeliveryError::Transport(e.to_string())
}

fn sent(message: &Message) -> SentMessage {
    SentMessage {
        id: message.id.get(),
        channel_id: message.channel_id.get(),
    }
}

#[async_trait]
impl Transport for DiscordTransport {
    async fn send(&self, channel_id: u64, text: &str) -> Result<SentMessage, DeliveryError> {
        let message = ChannelId::new(channel_id)
            .say(&self.http, text)
            .await
            .map_err(classify)?;
        Ok(sent(&message))
    }

    async fn edit(
        &self,
        channel_id: u64,
        message_id: u64,
        text: &str,
    ) -> Result<SentMessage, DeliveryError> {
        let message = ChannelId::new(channel_id)
            .edit_message(
                &self.http,
                MessageId::new(message_id),
                EditMessage::new().content(text),
            )
            .await
            .map_err(classify)?;
        Ok(sent(&message))
    }

    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), DeliveryError> {
        ChannelId::new(channel_id)
            .delete_message(&self.http, MessageId::new(message_id))
            .await
            .map_err(classify)
    }

    fn member(&self, server_id: u64, user_id: u64) -> Option<UserRef> {
        let guild = self.cache.guild(GuildId::new(server_id))?;
        let member = guild.members.get(&UserId::new(user_id))?;
        Some(UserRef {
            id: user_id,
            name: member.display_name().to_string(),
        })
    }

    fn channel(&self, server_id: u64, channel_id: u64) -> Option<ChannelRef> {
        let guild = self.cache.guild(GuildId::new(server_id))?;
        let channel = guild.channels.get(&ChannelId::new(channel_id))?;
        Some(ChannelRef {
            id: channel_id,
            name: channel.name.clone(),
        })
    }

    fn emoji(&self, name: &str) -> Option<EmojiMatch> {
        let mut found: Option<EmojiMatch> = None;
        for guild_id in self.cache.guilds() {
            let Some(guild) = self.cache.guild(guild_id) else {
                continue;
            };
            let Some(emoji) = guild.emojis.values().find(|emoji| emoji.name == name) else {
                continue;
            };
            found
                .get_or_insert_with(|| EmojiMatch {
                    name: emoji.name.clone(),
                    url: emoji.url(),
                    servers: Vec::new(),
                })
                .servers
                .push(guild.name.clone());
        }
        found
    }

    fn users_with_discriminator(&self, discriminator: u16) -> Vec<UserRef> {
        let mut users: Vec<UserRef> = Vec::new();
        for guild_id in self.cache.guilds() {
            let Some(guild) = self.cache.guild(guild_id) else {
                continue;
            };
            let matching = guild
                .members
                .values()
                .filter(|member| member.user.discriminator.map(|d| d.get()) == Some(discriminator));
            for member in matching {
                let id = member.user.id.get();
                if !users.iter().any(|user| user.id == id) {
                    users.push(UserRef {
                        id,
                        name: member.user.name.clone(),
                    });
                }
            }
        }
        users
    }

    fn set_status(&self, text: &str) {
        self.shard.set_activity(Some(ActivityData::playing(text)));
    }

    async fn voice_channel(&self, server_id: u64) -> Option<ChannelRef> {
        let call = self.voice.as_ref()?.get(GuildId::new(server_id))?;
        let current = call.lock().await.current_channel()?;
        let channel_id = u64::from(current.0);
        self.channel(server_id, channel_id).or(Some(ChannelRef {
            id: channel_id,
            name: channel_id.to_string(),
        }))
    }

    async fn join_voice(&self, server_id: u64, channel_id: u64) -> Result<(), DeliveryError> {
        if !self.is_voice_channel(server_id, channel_id) {
            return Err(DeliveryError::NotFound);
        }
        self.voice()?
            .join(GuildId::new(server_id), ChannelId::new(channel_id))
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }

    async fn leave_voice(&self, server_id: u64) -> Result<(), DeliveryError> {
        let manager = self.voice()?;
        let guild_id = GuildId::new(server_id);
        if manager.get(guild_id).is_none() {
            return Err(DeliveryError::NotFound);
        }
        manager
            .remove(guild_id)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }
}

/// Converts a gateway message into the dispatcher's view of it.
pub fn inbound(message: &Message) -> InboundMessage {
    InboundMessage {
        id: message.id.get(),
        content: message.content.clone(),
        author: UserRef {
            id: message.author.id.get(),
            name: message.author.name.clone(),
        },
        channel_id: message.channel_id.get(),
        server_id: message.guild_id.map(|id| id.get()),
        timestamp: DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)
            .unwrap_or_else(Utc::now),
        raw_mentions: message.mentions.iter().map(|user| user.id.get()).collect(),
        raw_channel_mentions: channel_mentions(&message.content),
    }
}

/// Builds [`Data`] once the gateway reports who we are, then routes every
/// message event through [`dispatch::handle`].
pub struct Handler {
    pending: Mutex<Option<(Config, BotState)>>,
    data: OnceLock<Arc<Data>>,
}

impl Handler {
    pub fn new(config: Config, state: BotState) -> Self {
        Self {
            pending: Mutex::new(Some((config, state))),
            data: OnceLock::new(),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some((config, state)) = pending else {
            info!("Reconnected as {}", ready.user.name);
            return;
        };

        let voice = songbird::get(&ctx).await;
        if voice.is_none() {
            warn!("Voice client not registered, voice commands will fail");
        }
        let transport = Arc::new(DiscordTransport::new(
            Arc::clone(&ctx.http),
            Arc::clone(&ctx.cache),
            ctx.shard.clone(),
            voice,
        ));
        match Data::new(config, state, transport, ready.user.id.get()) {
            Ok(data) => {
                info!(
                    "Logged in as {} ({}) with {} commands",
                    ready.user.name,
                    ready.user.id,
                    data.registry.names().len()
                );
                let _ = self.data.set(Arc::new(data));
            }
            Err(e) => error!("Failed building command registry: {}", e),
        }
    }

    async fn message(&self, _ctx: Context, message: Message) {
        let Some(data) = self.data.get() else {
            return;
        };
        // The handler task logs its own outcome.
        let _ = dispatch::handle(data, inbound(&message)).await;
    }
}
