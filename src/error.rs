use std::path::PathBuf;
use thiserror::Error;

/// Startup configuration failures. All of these are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The configuration file does not exist: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No token configured: set [auth] token or TURBO_TOKEN")]
    MissingToken,
}

/// Why an outbound send, edit or delete was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("missing permission")]
    Forbidden,

    #[error("target not found")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command `{0}` is registered twice")]
    Duplicate(String),

    #[error("command `{command}` uses reserved name `{parameter}` for a positional parameter")]
    ReservedParameter { command: String, parameter: String },
}

/// A command could not be bound to the words the user typed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("missing argument `{parameter}` for `{command}`")]
    MissingArgument { command: String, parameter: String },
}

impl BindError {
    pub fn command(&self) -> &str {
        match self {
            BindError::MissingArgument { command, .. } => command,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("Invalid duration `{0}`, expected `minutes:seconds`")]
    Malformed(String),
}
