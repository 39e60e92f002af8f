//! Runtime configuration resolved from `TASKDESK_*` environment variables.
//!
//! # Invariants
//! - Every setting has a default except the speech API key and log dir.
//! - Malformed numeric values are rejected, never silently defaulted.

use crate::logging::default_log_level;
use crate::service::identity_service::{
    DEFAULT_RESET_TOKEN_TTL_MINUTES, MAX_RESET_TOKEN_TTL_MINUTES,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "TASKDESK_DB_PATH";
pub const ENV_LOG_DIR: &str = "TASKDESK_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "TASKDESK_LOG_LEVEL";
pub const ENV_SPEECH_ENDPOINT: &str = "TASKDESK_SPEECH_ENDPOINT";
pub const ENV_SPEECH_API_KEY: &str = "TASKDESK_SPEECH_API_KEY";
pub const ENV_SPEECH_LANGUAGE: &str = "TASKDESK_SPEECH_LANGUAGE";
pub const ENV_SPEECH_TIMEOUT_SECS: &str = "TASKDESK_SPEECH_TIMEOUT_SECS";
pub const ENV_RESET_TOKEN_TTL_MINUTES: &str = "TASKDESK_RESET_TOKEN_TTL_MINUTES";

const DEFAULT_DB_FILE_NAME: &str = "taskdesk.sqlite3";
pub const DEFAULT_SPEECH_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";
const DEFAULT_SPEECH_LANGUAGE: &str = "en-US";
const DEFAULT_SPEECH_TIMEOUT_SECS: u64 = 30;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    OutOfRange {
        key: &'static str,
        value: String,
        max: i64,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive integer, got `{value}`")
            }
            Self::OutOfRange { key, value, max } => {
                write!(f, "{key} must be at most {max}, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings for the speech recognition endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// BCP-47 language tag sent with every request.
    pub language: String,
    pub timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SPEECH_ENDPOINT.to_string(),
            api_key: None,
            language: DEFAULT_SPEECH_LANGUAGE.to_string(),
            timeout: Duration::from_secs(DEFAULT_SPEECH_TIMEOUT_SECS),
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// File logging is off when unset.
    pub log_dir: Option<String>,
    pub log_level: String,
    pub speech: SpeechConfig,
    pub reset_token_ttl: chrono::Duration,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let speech_defaults = SpeechConfig::default();
        let timeout_secs = match get(ENV_SPEECH_TIMEOUT_SECS) {
            Some(value) => parse_positive(ENV_SPEECH_TIMEOUT_SECS, &value)?,
            None => DEFAULT_SPEECH_TIMEOUT_SECS,
        };
        let reset_token_ttl = match get(ENV_RESET_TOKEN_TTL_MINUTES) {
            Some(value) => parse_reset_token_ttl(&value)?,
            None => chrono::Duration::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES),
        };

        Ok(Self {
            db_path: get(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_dir: get(ENV_LOG_DIR),
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            speech: SpeechConfig {
                endpoint: get(ENV_SPEECH_ENDPOINT).unwrap_or(speech_defaults.endpoint),
                api_key: get(ENV_SPEECH_API_KEY),
                language: get(ENV_SPEECH_LANGUAGE).unwrap_or(speech_defaults.language),
                timeout: Duration::from_secs(timeout_secs),
            },
            reset_token_ttl,
        })
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_reset_token_ttl(value: &str) -> Result<chrono::Duration, ConfigError> {
    let minutes = parse_positive(ENV_RESET_TOKEN_TTL_MINUTES, value)?;
    i64::try_from(minutes)
        .ok()
        .filter(|minutes| *minutes <= MAX_RESET_TOKEN_TTL_MINUTES)
        .and_then(chrono::Duration::try_minutes)
        .ok_or_else(|| ConfigError::OutOfRange {
            key: ENV_RESET_TOKEN_TTL_MINUTES,
            value: value.to_string(),
            max: MAX_RESET_TOKEN_TTL_MINUTES,
        })
}

#[cfg(test)]
mod tests {
    use super::{
        AppConfig, ConfigError, DEFAULT_SPEECH_ENDPOINT, ENV_DB_PATH, ENV_LOG_DIR,
        ENV_RESET_TOKEN_TTL_MINUTES, ENV_SPEECH_API_KEY, ENV_SPEECH_TIMEOUT_SECS,
        MAX_RESET_TOKEN_TTL_MINUTES,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).expect("defaults should resolve");
        assert!(config.db_path.ends_with("taskdesk.sqlite3"));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.speech.endpoint, DEFAULT_SPEECH_ENDPOINT);
        assert_eq!(config.speech.api_key, None);
        assert_eq!(config.speech.language, "en-US");
        assert_eq!(config.reset_token_ttl, chrono::Duration::minutes(60));
    }

    #[test]
    fn explicit_values_override_defaults_and_blanks_are_ignored() {
        let config = config_from(&[
            (ENV_DB_PATH, "/var/lib/taskdesk/tasks.db"),
            (ENV_LOG_DIR, "   "),
            (ENV_SPEECH_API_KEY, "k-123"),
            (ENV_SPEECH_TIMEOUT_SECS, "5"),
        ])
        .expect("explicit values should resolve");
        assert_eq!(config.db_path, PathBuf::from("/var/lib/taskdesk/tasks.db"));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.speech.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.speech.timeout, Duration::from_secs(5));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        for value in ["0", "-1", "soon"] {
            let err = config_from(&[(ENV_SPEECH_TIMEOUT_SECS, value)])
                .expect_err("malformed timeout should be rejected");
            assert_eq!(
                err,
                ConfigError::InvalidNumber {
                    key: ENV_SPEECH_TIMEOUT_SECS,
                    value: value.to_string(),
                }
            );
        }
    }

    #[test]
    fn reset_token_ttl_is_bounded() {
        let config = config_from(&[(ENV_RESET_TOKEN_TTL_MINUTES, "15")])
            .expect("small ttl should be accepted");
        assert_eq!(config.reset_token_ttl, chrono::Duration::minutes(15));

        let max = MAX_RESET_TOKEN_TTL_MINUTES.to_string();
        let config = config_from(&[(ENV_RESET_TOKEN_TTL_MINUTES, max.as_str())])
            .expect("ttl at the bound should be accepted");
        assert_eq!(
            config.reset_token_ttl,
            chrono::Duration::minutes(MAX_RESET_TOKEN_TTL_MINUTES)
        );

        for value in ["9223372036854775807", "18446744073709551615", "1000000000000"] {
            let err = config_from(&[(ENV_RESET_TOKEN_TTL_MINUTES, value)])
                .expect_err("oversized ttl should be rejected");
            assert_eq!(
                err,
                ConfigError::OutOfRange {
                    key: ENV_RESET_TOKEN_TTL_MINUTES,
                    value: value.to_string(),
                    max: MAX_RESET_TOKEN_TTL_MINUTES,
                }
            );
        }
        assert!(matches!(
            config_from(&[(ENV_RESET_TOKEN_TTL_MINUTES, "0")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
