use std::path::PathBuf;
use thiserror::Error;

/// Usage errors raised by the countdown engine.
///
/// Both are caller bugs: they are reported before any event is emitted and
/// are never worth retrying.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CountdownError {
    #[error("invalid countdown: {0}")]
    InvalidSpec(String),

    #[error("countdown already completed; start a new one")]
    AlreadyCompleted,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration format: '{0}' (expected e.g. 25m, 1m30s, 5s)")]
    Format(String),

    #[error("duration '{0}' is too large")]
    Overflow(String),

    #[error("duration must be greater than zero")]
    Zero,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("invalid tick interval in config: {0}")]
    Duration(#[from] DurationError),
}

/// Everything `main` can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Countdown(#[from] CountdownError),

    #[error("invalid --tick: {0}")]
    Tick(#[source] DurationError),
}
