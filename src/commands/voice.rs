use super::{say, say_for, warn};
use crate::command::{BoundCall, CommandDescriptor, ContextKind, Guard};
use crate::error::DeliveryError;
use crate::Data;
use anyhow::anyhow;
use std::sync::Arc;
use tracing::info;

pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("mentions", "List the users and channels mentioned", handler!(mentions))
            .context(ContextKind::Message)
            .context(ContextKind::UserMentions)
            .context(ContextKind::ChannelMentions)
            .guard(Guard::NonPrivate),
        CommandDescriptor::new("voice", "Show the current voice channel", handler!(voice))
            .context(ContextKind::Message)
            .context(ContextKind::VoiceChannel)
            .guard(Guard::NonPrivate),
        CommandDescriptor::new("join", "Join the mentioned voice channel", handler!(join))
            .context(ContextKind::Message)
            .context(ContextKind::Server)
            .context(ContextKind::ChannelMentions)
            .guard(Guard::NonPrivate),
        CommandDescriptor::new("leave", "Leave voice on this server", handler!(leave))
            .context(ContextKind::Message)
            .context(ContextKind::Server)
            .guard(Guard::NonPrivate),
    ]
}

async fn mentions(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let users: Vec<&str> = call.user_mentions().iter().map(|u| u.name.as_str()).collect();
    let channels: Vec<String> = call
        .channel_mentions()
        .iter()
        .map(|c| format!("#{}", c.name))
        .collect();
    if users.is_empty() && channels.is_empty() {
        warn(&data, &call, "Nothing mentioned").await;
        return Ok(());
    }

    let mut lines = Vec::new();
    if !users.is_empty() {
        lines.push(format!(":bust_in_silhouette: Users: {}", users.join(", ")));
    }
    if !channels.is_empty() {
        lines.push(format!(":hash: Channels: {}", channels.join(", ")));
    }
    say(&data, &call, &lines.join("\n")).await;
    Ok(())
}

async fn voice(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    match call.voice_channel() {
        Some(channel) => {
            say(&data, &call, &format!(":loud_sound: Connected to **{}**", channel.name)).await
        }
        None => say(&data, &call, ":mute: Not connected to voice").await,
    }
    Ok(())
}

async fn join(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let server_id = call
        .server()
        .ok_or_else(|| anyhow!("`join` was called without a server"))?;
    let Some(channel) = call.channel_mentions().first() else {
        warn(&data, &call, "Mention the voice channel to join").await;
        return Ok(());
    };

    match data.transport.join_voice(server_id, channel.id).await {
        Ok(()) => {
            info!("Joined voice channel {} on {}", channel.id, server_id);
            say_for(&data, &call, &format!(":loud_sound: Joined **{}**", channel.name), 10).await;
        }
        Err(DeliveryError::Forbidden) => {
            warn(&data, &call, &format!("Not allowed to join **{}**", channel.name)).await
        }
        Err(DeliveryError::NotFound) => {
            warn(&data, &call, &format!("**{}** is not a voice channel", channel.name)).await
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn leave(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let server_id = call
        .server()
        .ok_or_else(|| anyhow!("`leave` was called without a server"))?;
    match data.transport.leave_voice(server_id).await {
        Ok(()) => {
            info!("Left voice on {}", server_id);
            say_for(&data, &call, ":mute: Left voice", 10).await;
        }
        Err(DeliveryError::NotFound) => warn(&data, &call, "Not connected to voice").await,
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
