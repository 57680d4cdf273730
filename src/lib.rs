pub mod command;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod reply;
pub mod schedule;
pub mod state;
pub mod store;
pub mod timers;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

/// Shared data handed to every command handler
pub struct Data {
    pub config: config::Config,
    pub state: state::BotState,
    pub registry: command::CommandRegistry,
    pub reply: reply::ResponsePolicy,
    pub transport: Arc<dyn transport::Transport>,
    pub http_client: reqwest::Client,
    /// The account's own user ID
    pub self_id: u64,
}

impl Data {
    pub fn new(
        config: config::Config,
        state: state::BotState,
        transport: Arc<dyn transport::Transport>,
        self_id: u64,
    ) -> Result<Self, error::RegistryError> {
        let registry = commands::registry()?;
        let reply = reply::ResponsePolicy::new(Arc::clone(&transport), !config.bot, self_id);
        Ok(Self {
            config,
            state,
            registry,
            reply,
            transport,
            http_client: reqwest::Client::new(),
            self_id,
        })
    }
}
