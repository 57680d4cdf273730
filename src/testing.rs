//! Test fixtures: an in-memory transport and message builders.

use crate::config::Config;
use crate::error::DeliveryError;
use crate::state::{BotState, ModeState};
use crate::store::{ResponseMap, Store, TagMap};
use crate::timers::TimerRegistry;
use crate::transport::{
    channel_mentions, ChannelRef, EmojiMatch, InboundMessage, SentMessage, Transport, UserRef,
};
use crate::Data;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) const SELF_ID: u64 = 1;
pub(crate) const OTHER_ID: u64 = 2;
pub(crate) const MOD_ID: u64 = 3;
pub(crate) const BANNED_ID: u64 = 4;
pub(crate) const SERVER_ID: u64 = 100;
pub(crate) const CHANNEL_ID: u64 = 200;

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(10_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Send {
        channel_id: u64,
        text: String,
    },
    Edit {
        channel_id: u64,
        message_id: u64,
        text: String,
    },
    Delete {
        channel_id: u64,
        message_id: u64,
    },
}

#[derive(Default)]
pub(crate) struct RecordingTransport {
    actions: Mutex<Vec<Action>>,
    failure: Mutex<Option<DeliveryError>>,
    members: Mutex<HashMap<(u64, u64), UserRef>>,
    channels: Mutex<HashMap<(u64, u64), ChannelRef>>,
    voice: Mutex<HashMap<u64, ChannelRef>>,
    emojis: Mutex<HashMap<String, EmojiMatch>>,
    discriminators: Mutex<Vec<(u16, UserRef)>>,
    status: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl RecordingTransport {
    pub(crate) fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    /// Text of every send and edit, in order.
    pub(crate) fn texts(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                Action::Send { text, .. } | Action::Edit { text, .. } => Some(text),
                Action::Delete { .. } => None,
            })
            .collect()
    }

    pub(crate) fn fail_with(&self, error: DeliveryError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub(crate) fn add_member(&self, server_id: u64, user_id: u64, name: &str) {
        self.members.lock().unwrap().insert(
            (server_id, user_id),
            UserRef {
                id: user_id,
                name: name.to_string(),
            },
        );
    }

    pub(crate) fn add_channel(&self, server_id: u64, channel_id: u64, name: &str) {
        self.channels.lock().unwrap().insert(
            (server_id, channel_id),
            ChannelRef {
                id: channel_id,
                name: name.to_string(),
            },
        );
    }

    /// Makes emoji `name` visible on `server`.
    pub(crate) fn add_emoji(&self, name: &str, url: &str, server: &str) {
        self.emojis
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert_with(|| EmojiMatch {
                name: name.to_string(),
                url: url.to_string(),
                servers: Vec::new(),
            })
            .servers
            .push(server.to_string());
    }

    pub(crate) fn add_discriminator(&self, user_id: u64, name: &str, discriminator: u16) {
        self.discriminators.lock().unwrap().push((
            discriminator,
            UserRef {
                id: user_id,
                name: name.to_string(),
            },
        ));
    }

    pub(crate) fn status(&self) -> Option<String> {
        self.status.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), DeliveryError> {
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn record(&self, action: Action) {
        self.actions.lock().unwrap().push(action);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, channel_id: u64, text: &str) -> Result<SentMessage, DeliveryError> {
        self.check()?;
        self.record(Action::Send {
            channel_id,
            text: text.to_string(),
        });
        Ok(SentMessage {
            id: 50_000 + self.next_id.fetch_add(1, Ordering::SeqCst),
            channel_id,
        })
    }

    async fn edit(
        &self,
        channel_id: u64,
        message_id: u64,
        text: &str,
    ) -> Result<SentMessage, DeliveryError> {
        self.check()?;
        self.record(Action::Edit {
            channel_id,
            message_id,
            text: text.to_string(),
        });
        Ok(SentMessage {
            id: message_id,
            channel_id,
        })
    }

    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), DeliveryError> {
        self.check()?;
        self.record(Action::Delete {
            channel_id,
            message_id,
        });
        Ok(())
    }

    fn member(&self, server_id: u64, user_id: u64) -> Option<UserRef> {
        self.members
            .lock()
            .unwrap()
            .get(&(server_id, user_id))
            .cloned()
    }

    fn channel(&self, server_id: u64, channel_id: u64) -> Option<ChannelRef> {
        self.channels
            .lock()
            .unwrap()
            .get(&(server_id, channel_id))
            .cloned()
    }

    fn emoji(&self, name: &str) -> Option<EmojiMatch> {
        self.emojis.lock().unwrap().get(name).cloned()
    }

    fn users_with_discriminator(&self, discriminator: u16) -> Vec<UserRef> {
        self.discriminators
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, _)| *d == discriminator)
            .map(|(_, user)| user.clone())
            .collect()
    }

    fn set_status(&self, text: &str) {
        *self.status.lock().unwrap() = Some(text.to_string());
    }

    async fn voice_channel(&self, server_id: u64) -> Option<ChannelRef> {
        self.voice.lock().unwrap().get(&server_id).cloned()
    }

    async fn join_voice(&self, server_id: u64, channel_id: u64) -> Result<(), DeliveryError> {
        self.check()?;
        let channel = self
            .channel(server_id, channel_id)
            .ok_or(DeliveryError::NotFound)?;
        self.voice.lock().unwrap().insert(server_id, channel);
        Ok(())
    }

    async fn leave_voice(&self, server_id: u64) -> Result<(), DeliveryError> {
        self.check()?;
        self.voice
            .lock()
            .unwrap()
            .remove(&server_id)
            .map(|_| ())
            .ok_or(DeliveryError::NotFound)
    }
}

/// A server message from `author_id` in [`CHANNEL_ID`].
pub(crate) fn message(author_id: u64, content: &str) -> InboundMessage {
    InboundMessage {
        id: NEXT_MESSAGE_ID.fetch_add(1, Ordering::SeqCst),
        content: content.to_string(),
        author: UserRef {
            id: author_id,
            name: format!("user{}", author_id),
        },
        channel_id: CHANNEL_ID,
        server_id: Some(SERVER_ID),
        timestamp: Utc::now(),
        raw_mentions: content
            .split_whitespace()
            .filter_map(serenity::utils::parse_user_mention)
            .map(|user| user.get())
            .collect(),
        raw_channel_mentions: channel_mentions(content),
    }
}

pub(crate) fn private_message(author_id: u64, content: &str) -> InboundMessage {
    InboundMessage {
        server_id: None,
        ..message(author_id, content)
    }
}

pub(crate) struct Harness {
    pub(crate) data: Arc<Data>,
    pub(crate) transport: Arc<RecordingTransport>,
    pub(crate) dir: tempfile::TempDir,
}

/// Builds shared data around a recording transport. [`MOD_ID`] is a
/// moderator and [`BANNED_ID`] is blacklisted.
pub(crate) fn harness(config: Config) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let config = Config {
        config_dir: dir.path().to_path_buf(),
        moderators: HashSet::from([MOD_ID]),
        ..config
    };
    let mode = ModeState::new(HashSet::from([BANNED_ID]), config.moderators.clone());
    let state = BotState::new(
        Store::new(dir.path()),
        mode,
        TimerRegistry::new(),
        TagMap::new(),
        ResponseMap::new(),
    );
    let data = Data::new(config, state, transport.clone(), SELF_ID).unwrap();
    Harness {
        data: Arc::new(data),
        transport,
        dir,
    }
}
