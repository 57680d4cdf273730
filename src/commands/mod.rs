//! Command bodies. Each module lists its descriptors; [`registry`] collects them.

use crate::command::{BoundCall, CommandRegistry};
use crate::error::RegistryError;
use crate::reply::DeliverOptions;
use crate::Data;

/// Wraps an `async fn(Arc<Data>, BoundCall) -> anyhow::Result<()>` into a [`crate::command::HandlerFn`].
macro_rules! handler {
    ($f:path) => {{
        fn wrapped(
            data: std::sync::Arc<crate::Data>,
            call: crate::command::BoundCall,
        ) -> crate::command::HandlerFuture {
            Box::pin($f(data, call))
        }
        wrapped as crate::command::HandlerFn
    }};
}

mod lookup;
mod misc;
mod mode;
mod responses;
mod tags;
mod text;
mod timer;
mod voice;
mod web;

/// Seconds a user-facing warning stays visible
pub const WARNING_SECS: u64 = 30;

pub fn registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();
    let descriptors = mode::descriptors()
        .into_iter()
        .chain(text::descriptors())
        .chain(tags::descriptors())
        .chain(responses::descriptors())
        .chain(misc::descriptors())
        .chain(lookup::descriptors())
        .chain(timer::descriptors())
        .chain(voice::descriptors())
        .chain(web::descriptors());
    for descriptor in descriptors {
        registry.register(descriptor)?;
    }
    Ok(registry)
}

async fn say(data: &Data, call: &BoundCall, text: &str) {
    data.reply
        .deliver(&call.message, text, DeliverOptions::default())
        .await;
}

/// Replies and removes the reply after `secs`.
async fn say_for(data: &Data, call: &BoundCall, text: &str, secs: u64) {
    data.reply
        .deliver(&call.message, text, DeliverOptions::delete_after(secs))
        .await;
}

async fn warn(data: &Data, call: &BoundCall, text: &str) {
    say_for(data, call, &format!(":warning: {}", text), WARNING_SECS).await;
}

/// Formats names as `` `a`, `b` ``.
fn code_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("`{}`", item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
