use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::duration;
use crate::error::ConfigError;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_CYCLES: u32 = 4;
pub const DEFAULT_TICK: &str = "1s";

/// User configuration. Every key is optional in the file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Work session length in minutes.
    pub work: u32,
    /// Break session length in minutes.
    #[serde(rename = "break")]
    pub break_minutes: u32,
    pub cycles: u32,
    /// Progress refresh interval in whole seconds, e.g. `1s` or `5s`.
    pub tick: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            work: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            cycles: DEFAULT_CYCLES,
            tick: DEFAULT_TICK.to_string(),
        }
    }
}

impl Config {
    /// Loads the config from `explicit` if given, otherwise from the default
    /// location. Only a missing default file falls back to built-in values.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pomodoro")
            .join("config.toml")
    }

    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        Ok(duration::parse(&self.tick)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("work", self.work),
            ("break", self.break_minutes),
            ("cycles", self.cycles),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        self.tick_interval()?;
        Ok(())
    }
}
