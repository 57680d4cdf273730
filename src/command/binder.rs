use super::{CommandDescriptor, ContextKind, Param};
use crate::error::BindError;
use crate::transport::{ChannelRef, InboundMessage, Transport, UserRef};
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Channel(u64),
    Author(UserRef),
    Server(Option<u64>),
    UserMentions(Vec<UserRef>),
    ChannelMentions(Vec<ChannelRef>),
    VoiceChannel(Option<ChannelRef>),
    LeftoverArgs(Vec<String>),
}

/// A handler call with every declared parameter filled in.
#[derive(Debug, Clone)]
pub struct BoundCall {
    pub command: String,
    pub message: InboundMessage,
    context: BTreeMap<ContextKind, ContextValue>,
    positionals: HashMap<&'static str, String>,
}

impl BoundCall {
    pub fn has(&self, kind: ContextKind) -> bool {
        self.context.contains_key(&kind)
    }

    pub fn context(&self, kind: ContextKind) -> Option<&ContextValue> {
        self.context.get(&kind)
    }

    /// A bound positional; `None` when it was left to its default.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.positionals.get(name).map(String::as_str)
    }

    pub fn arg_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.arg(name).unwrap_or(default)
    }

    /// Number of positionals that received a word.
    pub fn bound_len(&self) -> usize {
        self.positionals.len()
    }

    pub fn leftover_args(&self) -> &[String] {
        match self.context.get(&ContextKind::LeftoverArgs) {
            Some(ContextValue::LeftoverArgs(words)) => words,
            _ => &[],
        }
    }

    /// Positional `name` followed by the leftover words, space separated.
    pub fn rest_of(&self, name: &str) -> String {
        let mut words: Vec<&str> = self.arg(name).into_iter().collect();
        words.extend(self.leftover_args().iter().map(String::as_str));
        words.join(" ")
    }

    pub fn channel(&self) -> Option<u64> {
        match self.context.get(&ContextKind::Channel) {
            Some(ContextValue::Channel(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn author(&self) -> Option<&UserRef> {
        match self.context.get(&ContextKind::Author) {
            Some(ContextValue::Author(user)) => Some(user),
            _ => None,
        }
    }

    pub fn server(&self) -> Option<u64> {
        match self.context.get(&ContextKind::Server) {
            Some(ContextValue::Server(id)) => *id,
            _ => None,
        }
    }

    pub fn user_mentions(&self) -> &[UserRef] {
        match self.context.get(&ContextKind::UserMentions) {
            Some(ContextValue::UserMentions(users)) => users,
            _ => &[],
        }
    }

    pub fn channel_mentions(&self) -> &[ChannelRef] {
        match self.context.get(&ContextKind::ChannelMentions) {
            Some(ContextValue::ChannelMentions(channels)) => channels,
            _ => &[],
        }
    }

    pub fn voice_channel(&self) -> Option<&ChannelRef> {
        match self.context.get(&ContextKind::VoiceChannel) {
            Some(ContextValue::VoiceChannel(channel)) => channel.as_ref(),
            _ => None,
        }
    }
}

/// Builds the call for `descriptor` from a message and its argument words.
///
/// Positionals take one word each in declaration order. A positional with a
/// default is skipped once the words run out; one without fails the binding.
/// Words left after that are only visible to a handler declaring
/// `leftover_args`. Mentions that the server registry does not know are dropped.
pub async fn bind(
    descriptor: &CommandDescriptor,
    message: &InboundMessage,
    args: Vec<String>,
    transport: &dyn Transport,
) -> Result<BoundCall, BindError> {
    let mut remaining: VecDeque<String> = args.into();
    let mut positionals = HashMap::new();

    for param in &descriptor.params {
        let Param::Positional { name, default } = param else {
            continue;
        };
        match remaining.pop_front() {
            Some(word) => {
                positionals.insert(*name, word);
            }
            None if default.is_some() => {}
            None => {
                return Err(BindError::MissingArgument {
                    command: descriptor.name.to_string(),
                    parameter: name.to_string(),
                })
            }
        }
    }

    let mut context = BTreeMap::new();
    for kind in ContextKind::PRIORITY {
        if !descriptor.declares(kind) {
            continue;
        }
        let value = match kind {
            // Always carried in `BoundCall::message`.
            ContextKind::Message => continue,
            ContextKind::Channel => ContextValue::Channel(message.channel_id),
            ContextKind::Author => ContextValue::Author(message.author.clone()),
            ContextKind::Server => ContextValue::Server(message.server_id),
            ContextKind::UserMentions => ContextValue::UserMentions(match message.server_id {
                Some(server_id) => message
                    .raw_mentions
                    .iter()
                    .filter_map(|id| transport.member(server_id, *id))
                    .collect(),
                None => Vec::new(),
            }),
            ContextKind::ChannelMentions => {
                ContextValue::ChannelMentions(match message.server_id {
                    Some(server_id) => message
                        .raw_channel_mentions
                        .iter()
                        .filter_map(|id| transport.channel(server_id, *id))
                        .collect(),
                    None => Vec::new(),
                })
            }
            ContextKind::VoiceChannel => ContextValue::VoiceChannel(match message.server_id {
                Some(server_id) => transport.voice_channel(server_id).await,
                None => None,
            }),
            ContextKind::LeftoverArgs => {
                ContextValue::LeftoverArgs(std::mem::take(&mut remaining).into())
            }
        };
        context.insert(kind, value);
    }

    Ok(BoundCall {
        command: descriptor.name.to_string(),
        message: message.clone(),
        context,
        positionals,
    })
}
