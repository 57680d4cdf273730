use super::{code_list, say, warn};
use crate::command::{BoundCall, CommandDescriptor, ContextKind, Param};
use crate::Data;
use std::sync::Arc;

pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("emoji", "Show a custom emoji and where it lives", handler!(emoji))
            .context(ContextKind::Message)
            .param(Param::required("name")),
        CommandDescriptor::new(
            "discrim",
            "List visible names with a discriminator",
            handler!(discrim),
        )
        .context(ContextKind::Message)
        .param(Param::required("discrim")),
    ]
}

async fn emoji(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let name = call.arg_or("name", "");
    match data.transport.emoji(name) {
        Some(found) => {
            let text = format!(
                ":performing_arts: **{}**\nServers: {}\n{}",
                found.name,
                code_list(&found.servers),
                found.url
            );
            say(&data, &call, &text).await;
        }
        None => warn(&data, &call, &format!("No emoji found with name **{}**", name)).await,
    }
    Ok(())
}

async fn discrim(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let raw = call.arg_or("discrim", "");
    let mut names: Vec<String> = Vec::new();
    if let Ok(discriminator) = raw.parse::<u16>() {
        let users = data.transport.users_with_discriminator(discriminator);
        for user in users.into_iter().filter(|user| user.id != data.self_id) {
            if !names.contains(&user.name) {
                names.push(user.name);
            }
        }
    }
    if names.is_empty() {
        let text = format!("No names found with discriminator **{}**", raw);
        warn(&data, &call, &text).await;
    } else {
        let text = format!(
            ":label: Names with discriminator **{}**\n{}",
            raw,
            code_list(names)
        );
        say(&data, &call, &text).await;
    }
    Ok(())
}
