use super::{say, say_for, warn};
use crate::command::{BoundCall, CommandDescriptor, ContextKind, Param};
use crate::timers::TimerEntry;
use crate::Data;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("timer", "Start a `minutes:seconds` countdown", handler!(timer))
            .context(ContextKind::Message)
            .context(ContextKind::Author)
            .context(ContextKind::Channel)
            .context(ContextKind::Server)
            .param(Param::required("duration")),
        CommandDescriptor::new("timers", "List running timers", handler!(timers))
            .context(ContextKind::Message),
    ]
}

async fn timer(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let owner = call
        .author()
        .cloned()
        .ok_or_else(|| anyhow!("`timer` was called without an author"))?;
    let channel_id = call
        .channel()
        .ok_or_else(|| anyhow!("`timer` was called without a channel"))?;

    let started = data.state.timers.start(
        &data.reply,
        owner,
        channel_id,
        call.server(),
        call.message.timestamp,
        call.arg_or("duration", ""),
    );
    match started {
        Ok(handle) => {
            let text = format!(":alarm_clock: Timer set for **{}**", handle.label);
            say_for(&data, &call, &text, 10).await;
        }
        Err(e) => warn(&data, &call, &e.to_string()).await,
    }
    Ok(())
}

fn describe(entry: &TimerEntry, now: DateTime<Utc>) -> String {
    let place = match entry.server_id {
        Some(_) => format!("<#{}>", entry.channel_id),
        None => "a private channel".to_string(),
    };
    format!(
        "**{}** for {} in {}, {} left",
        entry.label(),
        entry.owner.name,
        place,
        humantime::format_duration(entry.remaining(now))
    )
}

async fn timers(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let entries = data.state.timers.list();
    if entries.is_empty() {
        warn(&data, &call, "No timers running").await;
        return Ok(());
    }
    let now = Utc::now();
    let lines: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {}", i + 1, describe(entry, now)))
        .collect();
    say(&data, &call, &format!(":alarm_clock: Timers:\n{}", lines.join("\n"))).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dispatch::handle;
    use crate::testing::{harness, message, Action, CHANNEL_ID, OTHER_ID, SELF_ID, SERVER_ID};
    use crate::transport::UserRef;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_timer_scenario() {
        let h = harness(Config {
            bot: true,
            ..Config::default()
        });
        handle(&h.data, message(OTHER_ID, "$timer 1:30"))
            .await
            .unwrap()
            .await
            .unwrap();
        assert_eq!(h.data.state.timers.len(), 1);
        assert_eq!(
            h.transport.texts(),
            vec![":alarm_clock: Timer set for **1:30**".to_string()]
        );

        tokio::time::sleep(Duration::from_secs(91)).await;
        assert!(h.data.state.timers.is_empty());
        assert!(h.transport.actions().contains(&Action::Send {
            channel_id: CHANNEL_ID,
            text: ":alarm_clock: <@2> Timer for **1:30** finished!".to_string()
        }));
    }

    #[tokio::test]
    async fn test_malformed_duration_warns() {
        let h = harness(Config::default());
        handle(&h.data, message(SELF_ID, "$timer 90"))
            .await
            .unwrap()
            .await
            .unwrap();
        assert!(h.data.state.timers.is_empty());
        assert_eq!(
            h.transport.texts(),
            vec![":warning: Invalid duration `90`, expected `minutes:seconds`".to_string()]
        );
    }

    #[test]
    fn test_describe() {
        let created_at = Utc::now();
        let entry = TimerEntry {
            id: 1,
            owner: UserRef {
                id: OTHER_ID,
                name: "alice".to_string(),
            },
            channel_id: CHANNEL_ID,
            server_id: Some(SERVER_ID),
            created_at,
            minutes: 2,
            seconds: 5,
            total_seconds: 125,
        };
        assert_eq!(
            describe(&entry, created_at + chrono::Duration::seconds(5)),
            "**2:05** for alice in <#200>, 2m left"
        );

        let private = TimerEntry {
            server_id: None,
            ..entry
        };
        assert_eq!(
            describe(&private, created_at),
            "**2:05** for alice in a private channel, 2m 5s left"
        );
    }
}
