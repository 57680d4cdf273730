use super::say_for;
use crate::command::{BoundCall, CommandDescriptor, ContextKind};
use crate::Data;
use std::sync::Arc;

pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("enable", "Start responding to commands again", handler!(enable))
            .context(ContextKind::Message)
            .reserved(),
        CommandDescriptor::new("disable", "Stop responding to commands", handler!(disable))
            .context(ContextKind::Message)
            .reserved(),
    ]
}

async fn enable(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    data.state.set_disabled(false);
    say_for(&data, &call, ":white_check_mark: Enabled", 5).await;
    Ok(())
}

async fn disable(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    data.state.set_disabled(true);
    say_for(&data, &call, ":no_entry_sign: Disabled", 5).await;
    Ok(())
}
