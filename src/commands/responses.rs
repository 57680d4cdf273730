use super::{code_list, say, say_for, warn};
use crate::command::{BoundCall, CommandDescriptor, ContextKind, Param};
use crate::Data;
use anyhow::anyhow;
use std::sync::Arc;

pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(
            "respond",
            "Auto-reply in this channel when a trigger appears (use _ for spaces in the trigger)",
            handler!(respond),
        )
        .context(ContextKind::Message)
        .context(ContextKind::Channel)
        .param(Param::required("trigger"))
        .param(Param::required("response"))
        .context(ContextKind::LeftoverArgs),
        CommandDescriptor::new("unrespond", "Remove an auto-reply", handler!(unrespond))
            .context(ContextKind::Message)
            .context(ContextKind::Channel)
            .param(Param::required("trigger")),
        CommandDescriptor::new("responses", "List auto-reply triggers", handler!(responses))
            .context(ContextKind::Message)
            .context(ContextKind::Channel),
    ]
}

fn trigger_text(raw: &str) -> String {
    raw.replace('_', " ")
}

fn channel_of(call: &BoundCall) -> anyhow::Result<u64> {
    call.channel()
        .ok_or_else(|| anyhow!("`{}` was called without a channel", call.command))
}

async fn respond(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let channel_id = channel_of(&call)?;
    let trigger = trigger_text(call.arg_or("trigger", ""));
    let response = call.rest_of("response");
    data.state.add_response(channel_id, &trigger, &response).await?;
    say_for(
        &data,
        &call,
        &format!(":speech_balloon: Responding to **{}**", trigger),
        10,
    )
    .await;
    Ok(())
}

async fn unrespond(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let channel_id = channel_of(&call)?;
    let trigger = trigger_text(call.arg_or("trigger", ""));
    if data.state.remove_response(channel_id, &trigger).await? {
        say_for(
            &data,
            &call,
            &format!(":wastebasket: No longer responding to **{}**", trigger),
            10,
        )
        .await;
    } else {
        warn(&data, &call, &format!("No response found for **{}**", trigger)).await;
    }
    Ok(())
}

async fn responses(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let channel_id = channel_of(&call)?;
    let triggers: Vec<String> = data
        .state
        .responses_for(channel_id)
        .into_iter()
        .map(|(trigger, _)| trigger)
        .collect();
    if triggers.is_empty() {
        warn(&data, &call, "No responses in this channel").await;
    } else {
        say(
            &data,
            &call,
            &format!(":speech_balloon: Triggers: {}", code_list(triggers)),
        )
        .await;
    }
    Ok(())
}
