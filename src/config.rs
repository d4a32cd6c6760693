//! Configuration chargée une fois au démarrage (fichier JSON).

use crate::model::{ChannelId, ResetTime};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEZONE: &str = "Asia/Seoul";
pub const DEFAULT_POLL_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Identifiant accepté sous forme de nombre ou de chaîne.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    token: String,
    target_channel_id: RawId,
    #[serde(default)]
    reset: ResetTime,
    #[serde(default = "default_timezone")]
    timezone: String,
    #[serde(default = "default_poll_secs")]
    poll_interval_secs: u64,
    #[serde(default = "default_help_image")]
    help_image: Option<PathBuf>,
    #[serde(default)]
    help_link: Option<String>,
    #[serde(default = "default_true")]
    show_unavailable: bool,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_poll_secs() -> u64 {
    DEFAULT_POLL_SECS
}
fn default_help_image() -> Option<PathBuf> {
    Some(PathBuf::from("menu.png"))
}
fn default_true() -> bool {
    true
}

/// Configuration validée, immuable après chargement.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub target_channel: ChannelId,
    pub reset: ResetTime,
    pub timezone: Tz,
    pub poll_interval: Duration,
    pub help_image: Option<PathBuf>,
    pub help_link: Option<String>,
    pub show_unavailable: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_raw(raw)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.token.trim().is_empty() {
            return Err(ConfigError::Invalid("token cannot be empty".into()));
        }
        let target_channel = match raw.target_channel_id {
            RawId::Number(n) => ChannelId::new(n.to_string()),
            RawId::Text(s) if !s.trim().is_empty() => ChannelId::new(s.trim()),
            RawId::Text(_) => {
                return Err(ConfigError::Invalid(
                    "target_channel_id cannot be empty".into(),
                ))
            }
        };
        let reset =
            ResetTime::new(raw.reset.hour, raw.reset.minute).map_err(ConfigError::Invalid)?;
        let timezone: Tz = raw
            .timezone
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown timezone {}", raw.timezone)))?;
        // au-delà d'une minute, la minute cible peut être manquée
        if raw.poll_interval_secs == 0 || raw.poll_interval_secs > 60 {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_secs must be within 1..=60, got {}",
                raw.poll_interval_secs
            )));
        }
        Ok(Self {
            token: raw.token,
            target_channel,
            reset,
            timezone,
            poll_interval: Duration::from_secs(raw.poll_interval_secs),
            help_image: raw.help_image,
            help_link: raw.help_link.filter(|l| !l.trim().is_empty()),
            show_unavailable: raw.show_unavailable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = Config::from_json(r#"{"token":"abc","target_channel_id":1234567890}"#).unwrap();
        assert_eq!(cfg.target_channel.as_str(), "1234567890");
        assert_eq!(cfg.reset, ResetTime::default());
        assert_eq!(cfg.timezone, chrono_tz::Asia::Seoul);
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.help_image, Some(PathBuf::from("menu.png")));
        assert!(cfg.show_unavailable);
    }

    #[test]
    fn string_channel_and_overrides() {
        let cfg = Config::from_json(
            r#"{
                "token": "abc",
                "target_channel_id": "orders",
                "reset": {"hour": 11, "minute": 5},
                "timezone": "Europe/Paris",
                "poll_interval_secs": 30,
                "help_image": null,
                "help_link": "https://example.org"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.target_channel.as_str(), "orders");
        assert_eq!(cfg.reset, ResetTime::new(11, 5).unwrap());
        assert_eq!(cfg.timezone, chrono_tz::Europe::Paris);
        assert_eq!(cfg.help_image, None);
        assert_eq!(cfg.help_link.as_deref(), Some("https://example.org"));
    }

    #[test]
    fn missing_token_is_a_parse_error() {
        let err = Config::from_json(r#"{"target_channel_id":1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn malformed_values_are_rejected() {
        for json in [
            r#"{"token":" ","target_channel_id":1}"#,
            r#"{"token":"t","target_channel_id":""}"#,
            r#"{"token":"t","target_channel_id":1,"reset":{"hour":25,"minute":0}}"#,
            r#"{"token":"t","target_channel_id":1,"timezone":"Mars/Olympus"}"#,
            r#"{"token":"t","target_channel_id":1,"poll_interval_secs":0}"#,
            r#"{"token":"t","target_channel_id":1,"poll_interval_secs":300}"#,
        ] {
            let err = Config::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}: {err}");
        }
    }
}
