//! Runtime configuration, read from the environment.

use crate::ConfigError;
use std::{env, time::Duration};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_SESSION_KEY: &str = "default";
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    pub gemini_api_key: String,
    pub podchaser_api_key: String,
    /// Model used for both topic extraction and the recommendation chat.
    pub model: String,
    /// Overrides the Podchaser GraphQL endpoint.
    pub podchaser_endpoint: Option<String>,
    /// Upper bound on each outbound call of a turn.
    pub call_timeout: Duration,
    pub session_key: String,
    /// Switch to the results panel after a successful turn.
    pub narrow_viewport: bool,
}

impl RecommenderConfig {
    /// Loads configuration from environment variables.
    ///
    /// * `GEMINI_API_KEY`: required.
    /// * `PODCHASER_API_KEY`: required.
    /// * `GEMINI_MODEL`: defaults to `gemini-2.0-flash`.
    /// * `PODCHASER_ENDPOINT`: optional.
    /// * `MOODCAST_CALL_TIMEOUT_SECS`: defaults to 30.
    /// * `MOODCAST_SESSION_KEY`: defaults to `default`.
    /// * `MOODCAST_NARROW_VIEWPORT`: `true`/`false`, defaults to `false`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let call_timeout = match lookup("MOODCAST_CALL_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidValue("MOODCAST_CALL_TIMEOUT_SECS", raw)),
            },
            None => DEFAULT_CALL_TIMEOUT,
        };

        let narrow_viewport = match lookup("MOODCAST_NARROW_VIEWPORT") {
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue("MOODCAST_NARROW_VIEWPORT", raw))?,
            None => false,
        };

        Ok(Self {
            gemini_api_key: required("GEMINI_API_KEY")?,
            podchaser_api_key: required("PODCHASER_API_KEY")?,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            podchaser_endpoint: lookup("PODCHASER_ENDPOINT"),
            call_timeout,
            session_key: lookup("MOODCAST_SESSION_KEY")
                .unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string()),
            narrow_viewport,
        })
    }
}
