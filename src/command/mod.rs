//! Command descriptors and the registry that maps names to them.
//!
//! Every handler is registered with an explicit, ordered parameter list.
//! Contextual parameters are filled from the triggering message, positional
//! parameters from the words the user typed after the command name.

use crate::config::Config;
use crate::error::RegistryError;
use crate::transport::InboundMessage;
use crate::Data;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub mod binder;

pub use binder::{bind, BoundCall, ContextValue};

/// Values a handler can ask for from the message context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextKind {
    Message,
    Channel,
    Author,
    Server,
    UserMentions,
    ChannelMentions,
    VoiceChannel,
    LeftoverArgs,
}

impl ContextKind {
    /// Resolution order used by the binder
    pub const PRIORITY: [ContextKind; 8] = [
        ContextKind::Message,
        ContextKind::Channel,
        ContextKind::Author,
        ContextKind::Server,
        ContextKind::UserMentions,
        ContextKind::ChannelMentions,
        ContextKind::VoiceChannel,
        ContextKind::LeftoverArgs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ContextKind::Message => "message",
            ContextKind::Channel => "channel",
            ContextKind::Author => "author",
            ContextKind::Server => "server",
            ContextKind::UserMentions => "user_mentions",
            ContextKind::ChannelMentions => "channel_mentions",
            ContextKind::VoiceChannel => "voice_channel",
            ContextKind::LeftoverArgs => "leftover_args",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::PRIORITY.into_iter().find(|kind| kind.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Contextual(ContextKind),
    Positional {
        name: &'static str,
        default: Option<&'static str>,
    },
}

impl Param {
    pub const fn required(name: &'static str) -> Self {
        Param::Positional {
            name,
            default: None,
        }
    }

    /// A positional the handler defaults itself when no word is left for it.
    pub const fn optional(name: &'static str, default: &'static str) -> Self {
        Param::Positional {
            name,
            default: Some(default),
        }
    }
}

/// Pre-binding checks, evaluated in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    NonPrivate,
    ApiKey(&'static str),
}

impl Guard {
    /// `Err` carries the warning shown to the user.
    pub fn check(&self, config: &Config, message: &InboundMessage) -> Result<(), String> {
        match self {
            Guard::NonPrivate if message.is_private() => {
                Err(":warning: This command cannot be used in private channels".to_string())
            }
            Guard::ApiKey(name) if config.api_key(name).is_none() => Err(format!(
                ":warning: This command requires an API key for **{}**",
                name
            )),
            _ => Ok(()),
        }
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
pub type HandlerFn = fn(Arc<Data>, BoundCall) -> HandlerFuture;

#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub params: Vec<Param>,
    pub guards: Vec<Guard>,
    /// Only reachable through the mode gates, never through the prefix path
    pub reserved: bool,
    pub handler: HandlerFn,
}

impl CommandDescriptor {
    pub fn new(name: &'static str, help: &'static str, handler: HandlerFn) -> Self {
        Self {
            name,
            help,
            params: Vec::new(),
            guards: Vec::new(),
            reserved: false,
            handler,
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn context(self, kind: ContextKind) -> Self {
        self.param(Param::Contextual(kind))
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn reserved(mut self) -> Self {
        self.reserved = true;
        self
    }

    pub fn declares(&self, kind: ContextKind) -> bool {
        self.params.contains(&Param::Contextual(kind))
    }

    /// e.g. `$tag tag [leftover_args...]` or `$help [command=all]`
    pub fn usage(&self, prefix: &str) -> String {
        let mut parts = vec![format!("{}{}", prefix, self.name)];
        for param in &self.params {
            if let Param::Positional { name, default } = param {
                parts.push(match default {
                    Some(default) => format!("[{}={}]", name, default),
                    None => name.to_string(),
                });
            }
        }
        if self.declares(ContextKind::LeftoverArgs) {
            parts.push("[leftover_args...]".to_string());
        }
        parts.join(" ")
    }
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("guards", &self.guards)
            .field("reserved", &self.reserved)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandDescriptor>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        for param in &descriptor.params {
            if let Param::Positional { name, .. } = param {
                if ContextKind::from_name(name).is_some() {
                    return Err(RegistryError::ReservedParameter {
                        command: descriptor.name.to_string(),
                        parameter: name.to_string(),
                    });
                }
            }
        }

        let name = descriptor.name.to_lowercase();
        if self.commands.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.commands.insert(name, descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    /// Sorted command names, reserved ones included.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
