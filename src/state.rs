use crate::error::StoreError;
use crate::store::{ResponseMap, Store, TagMap};
use crate::timers::TimerRegistry;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Enable/disable flag plus the blacklist and moderator gates.
#[derive(Debug, Default)]
pub struct ModeState {
    disabled: AtomicBool,
    blacklist: HashSet<u64>,
    moderators: HashSet<u64>,
}

impl ModeState {
    pub fn new(blacklist: HashSet<u64>, moderators: HashSet<u64>) -> Self {
        Self {
            disabled: AtomicBool::new(false),
            blacklist,
            moderators,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Returns the previous value.
    pub fn set_disabled(&self, disabled: bool) -> bool {
        self.disabled.swap(disabled, Ordering::SeqCst)
    }

    pub fn is_blacklisted(&self, user_id: u64) -> bool {
        self.blacklist.contains(&user_id)
    }

    pub fn is_moderator(&self, user_id: u64) -> bool {
        self.moderators.contains(&user_id)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything commands mutate. Writes go through the named operations
/// below, which update memory first and then flush the whole document.
/// `writer` is held from the in-memory change until the file is replaced,
/// so saves reach disk in the order their changes were made.
pub struct BotState {
    pub mode: ModeState,
    pub timers: TimerRegistry,
    store: Store,
    tags: Mutex<TagMap>,
    responses: Mutex<ResponseMap>,
    writer: tokio::sync::Mutex<()>,
}

impl BotState {
    pub fn new(
        store: Store,
        mode: ModeState,
        timers: TimerRegistry,
        tags: TagMap,
        responses: ResponseMap,
    ) -> Self {
        Self {
            mode,
            timers,
            store,
            tags: Mutex::new(tags),
            responses: Mutex::new(responses),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn load(
        store: Store,
        mode: ModeState,
        timers: TimerRegistry,
    ) -> Result<Self, StoreError> {
        let tags = store.load_tags().await?;
        let responses = store.load_responses().await?;
        info!(
            "Loaded {} tags and autoresponses for {} channels",
            tags.len(),
            responses.len()
        );
        Ok(Self::new(store, mode, timers, tags, responses))
    }

    pub fn set_disabled(&self, disabled: bool) -> bool {
        let previous = self.mode.set_disabled(disabled);
        info!("Bot {}", if disabled { "disabled" } else { "enabled" });
        previous
    }

    /// Re-reads tags and autoresponses from disk.
    pub async fn reload(&self) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let tags = self.store.load_tags().await?;
        let responses = self.store.load_responses().await?;
        *lock(&self.tags) = tags;
        *lock(&self.responses) = responses;
        Ok(())
    }

    pub fn tag(&self, name: &str) -> Option<String> {
        lock(&self.tags).get(name).cloned()
    }

    pub fn tag_names(&self) -> Vec<String> {
        lock(&self.tags).keys().cloned().collect()
    }

    pub async fn add_tag(&self, name: &str, value: &str) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let snapshot = {
            let mut tags = lock(&self.tags);
            tags.insert(name.to_string(), value.to_string());
            tags.clone()
        };
        self.store.save_tags(&snapshot).await
    }

    /// Returns false when no such tag existed.
    pub async fn remove_tag(&self, name: &str) -> Result<bool, StoreError> {
        let _writer = self.writer.lock().await;
        let snapshot = {
            let mut tags = lock(&self.tags);
            if tags.remove(name).is_none() {
                return Ok(false);
            }
            tags.clone()
        };
        self.store.save_tags(&snapshot).await?;
        Ok(true)
    }

    /// `(trigger, response)` pairs registered for a channel.
    pub fn responses_for(&self, channel_id: u64) -> Vec<(String, String)> {
        lock(&self.responses)
            .get(&channel_id.to_string())
            .map(|triggers| {
                triggers
                    .iter()
                    .map(|(trigger, response)| (trigger.clone(), response.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Responses whose trigger occurs anywhere in `content`.
    pub fn matching_responses(&self, channel_id: u64, content: &str) -> Vec<(String, String)> {
        self.responses_for(channel_id)
            .into_iter()
            .filter(|(trigger, _)| content.contains(trigger.as_str()))
            .collect()
    }

    pub async fn add_response(
        &self,
        channel_id: u64,
        trigger: &str,
        response: &str,
    ) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let snapshot = {
            let mut responses = lock(&self.responses);
            responses
                .entry(channel_id.to_string())
                .or_default()
                .insert(trigger.to_string(), response.to_string());
            responses.clone()
        };
        self.store.save_responses(&snapshot).await
    }

    /// Returns false when the channel had no such trigger.
    pub async fn remove_response(&self, channel_id: u64, trigger: &str) -> Result<bool, StoreError> {
        let _writer = self.writer.lock().await;
        let snapshot = {
            let mut responses = lock(&self.responses);
            let key = channel_id.to_string();
            let Some(triggers) = responses.get_mut(&key) else {
                return Ok(false);
            };
            if triggers.remove(trigger).is_none() {
                return Ok(false);
            }
            if triggers.is_empty() {
                responses.remove(&key);
            }
            responses.clone()
        };
        self.store.save_responses(&snapshot).await?;
        Ok(true)
    }
}
