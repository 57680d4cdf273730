use serenity::all::{Client, GatewayIntents};
use serenity::cache::Settings as CacheSettings;
use songbird::serenity::SerenityInit;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use turbo::config::Config;
use turbo::state::{BotState, ModeState};
use turbo::store::Store;
use turbo::timers::TimerRegistry;
use turbo::transport::discord::Handler;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    info!("Loaded configuration: {:?}", config);

    let store = Store::new(&config.config_dir);
    let mode = ModeState::new(store.load_blacklist().await, config.moderators.clone());
    let state = BotState::load(store, mode, TimerRegistry::new()).await?;

    let mut cache_settings = CacheSettings::default();
    cache_settings.max_messages = config.max_messages;

    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES;

    let token = config.token.clone();
    let mut client = Client::builder(&token, intents)
        .cache_settings(cache_settings)
        .event_handler(Handler::new(config, state))
        .register_songbird()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    info!("Connecting...");
    client
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Client error: {}", e))
}
