use super::{code_list, say, say_for, warn};
use crate::command::{BoundCall, CommandDescriptor, ContextKind, Param};
use crate::Data;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::info;

/// Milliseconds between the Unix epoch and the first second of 2015
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("help", "List commands or show how to use one", handler!(help))
            .context(ContextKind::Message)
            .param(Param::optional("command", "all")),
        CommandDescriptor::new("reload", "Re-read tags and responses from disk", handler!(reload))
            .context(ContextKind::Message),
        CommandDescriptor::new("flip", "Flip a coin", handler!(flip)).context(ContextKind::Message),
        CommandDescriptor::new("snowflake", "Show when a Discord id was created", handler!(snowflake))
            .context(ContextKind::Message)
            .param(Param::required("id")),
        CommandDescriptor::new("status", "Change the game shown on the profile", handler!(status))
            .context(ContextKind::Message)
            .param(Param::required("status"))
            .context(ContextKind::LeftoverArgs),
    ]
}

async fn help(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let prefix = &data.config.prefix;
    let Some(name) = call.arg("command") else {
        let names = data
            .registry
            .names()
            .into_iter()
            .filter(|name| data.registry.get(name).is_some_and(|d| !d.reserved));
        let text = format!(
            ":book: Commands: {}\nUse `{}help <command>` for details.",
            code_list(names),
            prefix
        );
        say(&data, &call, &text).await;
        return Ok(());
    };

    match data.registry.get(&name.to_lowercase()) {
        Some(descriptor) if !descriptor.reserved => {
            let text = format!(
                ":book: `{}`\n{}",
                descriptor.usage(prefix),
                descriptor.help
            );
            say(&data, &call, &text).await;
        }
        _ => warn(&data, &call, &format!("No command found: **{}**", name)).await,
    }
    Ok(())
}

async fn reload(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    data.state.reload().await?;
    say_for(&data, &call, ":package: Reloaded", 5).await;
    Ok(())
}

async fn flip(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let winner = data
        .config
        .flip_outcomes
        .choose(&mut rand::thread_rng())
        .cloned();
    match winner {
        Some(winner) => {
            let text = format!(":moneybag: Flipped a coin... **{}** wins!", winner);
            say(&data, &call, &text).await;
        }
        None => warn(&data, &call, "No coin outcomes configured").await,
    }
    Ok(())
}

async fn status(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let status = call.rest_of("status");
    data.transport.set_status(&status);
    info!("Status set to {:?}", status);
    let text = format!(":speech_left: Status set to **{}**", status);
    say_for(&data, &call, &text, 30).await;
    Ok(())
}

/// Creation time encoded in the top 42 bits of a Discord id.
pub fn snowflake_time(id: u64) -> Option<DateTime<Utc>> {
    let millis = (id >> 22).checked_add(DISCORD_EPOCH_MS)?;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

async fn snowflake(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let raw = call.arg_or("id", "");
    let created = raw
        .trim_matches(|c: char| !c.is_ascii_digit())
        .parse::<u64>()
        .ok()
        .and_then(snowflake_time);
    match created {
        Some(created) => {
            let text = format!(
                ":snowflake: `{}` was created at **{}**",
                raw,
                created.format("%Y-%m-%d %H:%M:%S UTC")
            );
            say(&data, &call, &text).await;
        }
        None => warn(&data, &call, &format!("Invalid id: **{}**", raw)).await,
    }
    Ok(())
}
