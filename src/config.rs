use crate::error::ConfigError;
use dotenvy::dotenv;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONFIG_DIR: &str = "config";
pub const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_PREFIX: &str = "$";
pub const DEFAULT_MAX_MESSAGES: usize = 5000;
/// Smallest message cache size accepted from the config file
pub const MIN_MAX_MESSAGES: i64 = 100;
pub const DEFAULT_FLIP_OUTCOMES: &str = "Heads,Tails";

#[derive(Clone)]
pub struct Config {
    pub token: String,
    /// Application-type account. When false the bot runs under the user's own account.
    pub bot: bool,
    pub prefix: String,
    pub max_messages: usize,
    pub autorespond: bool,
    pub flip_outcomes: Vec<String>,
    pub moderators: HashSet<u64>,
    pub api_keys: HashMap<String, String>,
    pub config_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            bot: false,
            prefix: DEFAULT_PREFIX.to_string(),
            max_messages: DEFAULT_MAX_MESSAGES,
            autorespond: true,
            flip_outcomes: split_list(DEFAULT_FLIP_OUTCOMES),
            moderators: HashSet::new(),
            api_keys: HashMap::new(),
            config_dir: PathBuf::from(CONFIG_DIR),
        }
    }
}

#[derive(Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    auth: RawAuth,
    #[serde(default)]
    options: RawOptions,
    #[serde(default)]
    keys: HashMap<String, String>,
}

#[derive(Default, Deserialize)]
struct RawAuth {
    token: Option<String>,
    bot: Option<bool>,
}

#[derive(Default, Deserialize)]
struct RawOptions {
    prefix: Option<String>,
    max_messages: Option<i64>,
    autorespond: Option<bool>,
    flip_outcomes: Option<String>,
    moderators: Option<String>,
}

impl Config {
    /// Loads `config/config.toml`, letting `TURBO_TOKEN` (or `.env`) override the token.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_dir(CONFIG_DIR, env::var("TURBO_TOKEN").ok())
    }

    pub fn from_dir(
        dir: impl AsRef<Path>,
        token_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let path = dir.join(CONFIG_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ConfigError::Missing(path)),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let raw: RawConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;
        Self::build(raw, dir, token_override)
    }

    fn build(
        raw: RawConfig,
        dir: &Path,
        token_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let token = token_override
            .or(raw.auth.token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let prefix = match raw.options.prefix.map(|p| p.trim().to_string()) {
            Some(p) if !p.is_empty() => p,
            Some(_) => {
                warn!("Empty command prefix, using default `{}`", DEFAULT_PREFIX);
                defaults.prefix
            }
            None => defaults.prefix,
        };

        let max_messages = match raw.options.max_messages {
            Some(n) if n >= MIN_MAX_MESSAGES => n as usize,
            Some(n) => {
                warn!(
                    "max_messages {} is below {}, using default {}",
                    n, MIN_MAX_MESSAGES, DEFAULT_MAX_MESSAGES
                );
                defaults.max_messages
            }
            None => defaults.max_messages,
        };

        let flip_outcomes = match raw.options.flip_outcomes.as_deref().map(split_list) {
            Some(outcomes) if !outcomes.is_empty() => outcomes,
            Some(_) => {
                warn!(
                    "No coin flip outcomes configured, using default `{}`",
                    DEFAULT_FLIP_OUTCOMES
                );
                defaults.flip_outcomes
            }
            None => defaults.flip_outcomes,
        };

        let moderators = raw
            .options
            .moderators
            .as_deref()
            .map(parse_ids)
            .unwrap_or_default();

        Ok(Config {
            token,
            bot: raw.auth.bot.unwrap_or(defaults.bot),
            prefix,
            max_messages,
            autorespond: raw.options.autorespond.unwrap_or(defaults.autorespond),
            flip_outcomes,
            moderators,
            api_keys: raw.keys,
            config_dir: dir.to_path_buf(),
        })
    }

    /// A configured, non-blank API key.
    pub fn api_key(&self, name: &str) -> Option<&str> {
        self.api_keys
            .get(name)
            .map(String::as_str)
            .filter(|key| !key.trim().is_empty())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_ids(value: &str) -> HashSet<u64> {
    split_list(value)
        .into_iter()
        .filter_map(|item| match item.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Ignoring invalid moderator id `{}`", item);
                None
            }
        })
        .collect()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut key_names: Vec<&String> = self.api_keys.keys().collect();
        key_names.sort();
        f.debug_struct("Config")
            .field("token", &"[REDACTED]")
            .field("bot", &self.bot)
            .field("prefix", &self.prefix)
            .field("max_messages", &self.max_messages)
            .field("autorespond", &self.autorespond)
            .field("flip_outcomes", &self.flip_outcomes)
            .field("moderators", &self.moderators)
            .field("api_keys", &key_names)
            .field("config_dir", &self.config_dir)
            .finish()
    }
}
