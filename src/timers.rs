use crate::error::TimerError;
use crate::reply::{DeliverOptions, ResponsePolicy};
use crate::schedule::{schedule, TaskHandle};
use crate::transport::UserRef;
use chrono::{DateTime, Utc};
use serenity::all::{Mentionable, UserId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEntry {
    pub id: u64,
    pub owner: UserRef,
    pub channel_id: u64,
    pub server_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub minutes: u64,
    pub seconds: u64,
    pub total_seconds: u64,
}

impl TimerEntry {
    /// `M:SS`
    pub fn label(&self) -> String {
        format!("{}:{:02}", self.minutes, self.seconds)
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = (now - self.created_at).num_seconds().max(0) as u64;
        Duration::from_secs(self.total_seconds.saturating_sub(elapsed))
    }
}

/// Parses `minutes:seconds` into its two parts.
pub fn parse_duration(text: &str) -> Result<(u64, u64), TimerError> {
    let malformed = || TimerError::Malformed(text.to_string());
    let (minutes, seconds) = text.split_once(':').ok_or_else(malformed)?;
    if seconds.contains(':') {
        return Err(malformed());
    }
    let minutes = minutes.trim().parse().map_err(|_| malformed())?;
    let seconds = seconds.trim().parse().map_err(|_| malformed())?;
    Ok((minutes, seconds))
}

struct Slot {
    entry: TimerEntry,
    task: Option<TaskHandle>,
}

/// In-flight timers, in creation order. Nothing here survives a restart.
#[derive(Clone, Default)]
pub struct TimerRegistry {
    slots: Arc<Mutex<BTreeMap<u64, Slot>>>,
    next_id: Arc<AtomicU64>,
}

/// Returned by [`TimerRegistry::start`].
pub struct TimerHandle {
    pub id: u64,
    /// `M:SS`
    pub label: String,
    registry: TimerRegistry,
}

impl TimerHandle {
    /// Stops the countdown and forgets the timer. Returns false if it already fired.
    pub fn cancel(&self) -> bool {
        self.registry.cancel(self.id)
    }
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, BTreeMap<u64, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(
        &self,
        reply: &ResponsePolicy,
        owner: UserRef,
        channel_id: u64,
        server_id: Option<u64>,
        created_at: DateTime<Utc>,
        duration: &str,
    ) -> Result<TimerHandle, TimerError> {
        let (minutes, seconds) = parse_duration(duration)?;
        let total_seconds = minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .ok_or_else(|| TimerError::Malformed(duration.to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = TimerEntry {
            id,
            owner,
            channel_id,
            server_id,
            created_at,
            minutes,
            seconds,
            total_seconds,
        };
        let notice = completion_notice(&entry, reply.self_id());
        let label = entry.label();
        info!(
            "Timer {} started by {} ({}) for {}",
            id,
            entry.owner.name,
            entry.owner.id,
            label
        );
        self.slots().insert(id, Slot { entry, task: None });

        let registry = self.clone();
        let reply = reply.clone();
        let task = schedule(Duration::from_secs(total_seconds), async move {
            reply
                .send(channel_id, &notice, DeliverOptions::default())
                .await;
            registry.remove(id);
            debug!("Timer {} finished", id);
        });

        if let Some(slot) = self.slots().get_mut(&id) {
            slot.task = Some(task);
        }

        Ok(TimerHandle {
            id,
            label,
            registry: self.clone(),
        })
    }

    pub fn list(&self) -> Vec<TimerEntry> {
        self.slots().values().map(|slot| slot.entry.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    fn remove(&self, id: u64) -> bool {
        self.slots().remove(&id).is_some()
    }

    /// Forgets a timer and aborts its pending notice.
    pub fn cancel(&self, id: u64) -> bool {
        let slot = self.slots().remove(&id);
        match slot {
            Some(slot) => {
                if let Some(task) = slot.task {
                    task.cancel();
                }
                true
            }
            None => false,
        }
    }
}

fn completion_notice(entry: &TimerEntry, self_id: u64) -> String {
    if entry.owner.id == self_id {
        format!(":alarm_clock: Timer for **{}** finished!", entry.label())
    } else {
        format!(
            ":alarm_clock: {} Timer for **{}** finished!",
            UserId::new(entry.owner.id).mention(),
            entry.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Action, RecordingTransport, CHANNEL_ID, OTHER_ID, SELF_ID, SERVER_ID};

    fn owner(id: u64) -> UserRef {
        UserRef {
            id,
            name: format!("user{}", id),
        }
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("01:30"), Ok((1, 30)));
        assert_eq!(parse_duration("0:05"), Ok((0, 5)));
        assert!(parse_duration("90").is_err());
        assert!(parse_duration("1:2:3").is_err());
        assert!(parse_duration("a:30").is_err());
        assert!(parse_duration("1:-5").is_err());
        assert!(parse_duration(":30").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_and_removes_itself() {
        let transport = Arc::new(RecordingTransport::default());
        let reply = ResponsePolicy::new(transport.clone(), true, SELF_ID);
        let timers = TimerRegistry::new();

        timers
            .start(&reply, owner(OTHER_ID), CHANNEL_ID, Some(SERVER_ID), Utc::now(), "01:30")
            .unwrap();
        let entries = timers.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total_seconds, 90);
        assert_eq!(entries[0].label(), "1:30");

        tokio::time::sleep(Duration::from_secs(89)).await;
        assert!(transport.actions().is_empty());
        assert_eq!(timers.len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            transport.actions(),
            vec![Action::Send {
                channel_id: CHANNEL_ID,
                text: format!(":alarm_clock: <@{}> Timer for **1:30** finished!", OTHER_ID),
            }]
        );
        assert!(timers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_timer_does_not_mention() {
        let transport = Arc::new(RecordingTransport::default());
        let reply = ResponsePolicy::new(transport.clone(), true, SELF_ID);
        let timers = TimerRegistry::new();

        timers
            .start(&reply, owner(SELF_ID), CHANNEL_ID, None, Utc::now(), "0:05")
            .unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(
            transport.texts(),
            vec![":alarm_clock: Timer for **0:05** finished!".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_keeps_insertion_order_and_cancel() {
        let transport = Arc::new(RecordingTransport::default());
        let reply = ResponsePolicy::new(transport.clone(), true, SELF_ID);
        let timers = TimerRegistry::new();

        let first = timers
            .start(&reply, owner(OTHER_ID), CHANNEL_ID, None, Utc::now(), "5:00")
            .unwrap();
        timers
            .start(&reply, owner(SELF_ID), CHANNEL_ID, None, Utc::now(), "0:10")
            .unwrap();
        let labels: Vec<String> = timers.list().iter().map(TimerEntry::label).collect();
        assert_eq!(labels, vec!["5:00", "0:10"]);

        assert!(first.cancel());
        assert!(!first.cancel());
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(transport.actions().len(), 1);
        assert!(timers.is_empty());
    }
}
