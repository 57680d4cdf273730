//! Per-message dispatch: gates, autoresponses, tokenizing, binding and
//! fire-and-forget handler execution.

use crate::command::{bind, CommandDescriptor};
use crate::reply::DeliverOptions;
use crate::transport::InboundMessage;
use crate::Data;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Seconds before usage and guard warnings are removed
pub const WARNING_DELETE_AFTER: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub command: String,
    pub args: Vec<String>,
}

/// Splits `<prefix><command> <args...>` on whitespace. The command name is
/// lowercased, the arguments are kept verbatim.
pub fn tokenize(content: &str, prefix: &str) -> Option<Tokens> {
    let mut words = content.split_whitespace();
    let command = words.next()?.strip_prefix(prefix)?;
    Some(Tokens {
        command: command.to_lowercase(),
        args: words.map(str::to_string).collect(),
    })
}

/// Processes one inbound message. Returns the spawned handler task when a
/// command was dispatched.
pub async fn handle(data: &Arc<Data>, message: InboundMessage) -> Option<JoinHandle<()>> {
    let prefix = data.config.prefix.as_str();
    let mode = &data.state.mode;
    let from_self = message.author.id == data.self_id;
    let content = message.content.trim();

    if mode.is_blacklisted(message.author.id) {
        return None;
    }

    // An application account never types; its own messages are replies we posted.
    if from_self && data.config.bot {
        return None;
    }

    if mode.is_disabled() {
        if is_exact_command(content, prefix, "enable") && may_enable(data, message.author.id) {
            return run_reserved(data, "enable", message).await;
        }
        return None;
    }

    if is_exact_command(content, prefix, "disable")
        && (from_self || mode.is_moderator(message.author.id))
    {
        return run_reserved(data, "disable", message).await;
    }

    if !from_self {
        if data.config.autorespond && !message.is_private() {
            autorespond(data, &message).await;
        }
        if !data.config.bot {
            return None;
        }
    }

    let tokens = tokenize(content, prefix)?;
    let descriptor = data.registry.get(&tokens.command)?;
    if descriptor.reserved {
        return None;
    }

    for guard in &descriptor.guards {
        if let Err(warning) = guard.check(&data.config, &message) {
            debug!("Command `{}` denied: {}", descriptor.name, warning);
            data.reply
                .deliver(
                    &message,
                    &warning,
                    DeliverOptions::delete_after(WARNING_DELETE_AFTER),
                )
                .await;
            return None;
        }
    }

    invoke(data, descriptor, message, tokens.args).await
}

/// In self mode only the account itself may enable. In bot mode nobody
/// types as the account, so moderators take that role.
fn may_enable(data: &Data, author_id: u64) -> bool {
    if data.config.bot {
        data.state.mode.is_moderator(author_id)
    } else {
        author_id == data.self_id
    }
}

fn is_exact_command(content: &str, prefix: &str, name: &str) -> bool {
    content
        .strip_prefix(prefix)
        .is_some_and(|rest| rest == name)
}

async fn run_reserved(
    data: &Arc<Data>,
    name: &str,
    message: InboundMessage,
) -> Option<JoinHandle<()>> {
    let descriptor = data.registry.get(name)?;
    invoke(data, descriptor, message, Vec::new()).await
}

async fn invoke(
    data: &Arc<Data>,
    descriptor: &CommandDescriptor,
    message: InboundMessage,
    args: Vec<String>,
) -> Option<JoinHandle<()>> {
    let call = match bind(descriptor, &message, args, data.transport.as_ref()).await {
        Ok(call) => call,
        Err(e) => {
            debug!("Binding failed: {}", e);
            let usage = descriptor.usage(&data.config.prefix);
            data.reply
                .deliver(
                    &message,
                    &format!(":warning: Invalid usage: `{}`", usage),
                    DeliverOptions::delete_after(WARNING_DELETE_AFTER),
                )
                .await;
            return None;
        }
    };

    info!(
        "{} ({}) {}",
        message.author.name,
        message.author.id,
        message.content.trim()
    );

    let name = descriptor.name;
    let author = message.author.id;
    let task = tokio::spawn((descriptor.handler)(Arc::clone(data), call));
    Some(tokio::spawn(async move {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Command `{}` from {} failed: {:?}", name, author, e),
            Err(e) => error!("Command `{}` from {} panicked: {}", name, author, e),
        }
    }))
}

async fn autorespond(data: &Data, message: &InboundMessage) {
    for (trigger, response) in data
        .state
        .matching_responses(message.channel_id, &message.content)
    {
        info!(
            "{} ({}) Response: {}",
            message.author.name, message.author.id, trigger
        );
        data.reply
            .send(message.channel_id, &response, DeliverOptions::default())
            .await;
    }
}
