use super::say;
use crate::command::{BoundCall, CommandDescriptor, ContextKind, HandlerFn, Param};
use crate::Data;
use std::sync::Arc;

pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        formatter("strike", "Strike through text", handler!(strike)),
        formatter("italics", "Italicize text", handler!(italics)),
        formatter("bold", "Embolden text", handler!(bold)),
    ]
}

fn formatter(name: &'static str, help: &'static str, handler: HandlerFn) -> CommandDescriptor {
    CommandDescriptor::new(name, help, handler)
        .context(ContextKind::Message)
        .param(Param::required("content"))
        .context(ContextKind::LeftoverArgs)
}

async fn wrap(data: &Data, call: &BoundCall, marker: &str) -> anyhow::Result<()> {
    let content = call.rest_of("content");
    say(data, call, &format!("{marker}{content}{marker}")).await;
    Ok(())
}

async fn strike(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    wrap(&data, &call, "~~").await
}

async fn italics(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    wrap(&data, &call, "*").await
}

async fn bold(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    wrap(&data, &call, "**").await
}
