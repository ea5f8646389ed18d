use std::time::Duration;

use thiserror::Error;

pub const ENV_OUT_OF_PROCESS: &str = "EMBER_WEBGL_OUT_OF_PROCESS";
pub const ENV_MAX_WARNINGS: &str = "EMBER_WEBGL_MAX_WARNINGS";
pub const ENV_ACTOR_TIMEOUT_MS: &str = "EMBER_WEBGL_ACTOR_TIMEOUT_MS";

pub const DEFAULT_MAX_WARNINGS: u32 = 32;
pub const DEFAULT_ACTOR_TIMEOUT: Duration = Duration::from_millis(5000);

/// Construction-time preferences for a context.
///
/// These are read once; changing them later has no effect on an existing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Route compositable handle updates through the compositor actor.
    pub out_of_process: bool,
    /// Console warnings reported before the context goes quiet.
    pub max_warnings: u32,
    /// Upper bound on a single actor round trip.
    pub actor_timeout: Duration,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            out_of_process: false,
            max_warnings: DEFAULT_MAX_WARNINGS,
            actor_timeout: DEFAULT_ACTOR_TIMEOUT,
        }
    }
}

impl ContextConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let out_of_process = match lookup(ENV_OUT_OF_PROCESS) {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidEnv(ENV_OUT_OF_PROCESS))?,
            None => defaults.out_of_process,
        };
        let max_warnings = match lookup(ENV_MAX_WARNINGS) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidEnv(ENV_MAX_WARNINGS))?,
            None => defaults.max_warnings,
        };
        let actor_timeout = match lookup(ENV_ACTOR_TIMEOUT_MS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::InvalidEnv(ENV_ACTOR_TIMEOUT_MS))?,
            None => defaults.actor_timeout,
        };

        Ok(Self {
            out_of_process,
            max_warnings,
            actor_timeout,
        })
    }

    pub fn out_of_process(mut self, enabled: bool) -> Self {
        self.out_of_process = enabled;
        self
    }

    pub fn max_warnings(mut self, max_warnings: u32) -> Self {
        self.max_warnings = max_warnings;
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for env var {0}")]
    InvalidEnv(&'static str),
}
