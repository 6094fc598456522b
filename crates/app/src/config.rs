//! Application configuration: environment knobs + reference data.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use finansiki_auth::LatencyConfig;
use finansiki_core::DomainError;
use finansiki_ledger::{Amount, Friend, FriendDirectory};
use finansiki_observability::LogFormat;
use finansiki_quiz::{Question, QuestionBank};

pub const ENV_SEED_BALANCE: &str = "FINANSIKI_SEED_BALANCE";
pub const ENV_SEND_CODE_DELAY_MS: &str = "FINANSIKI_SEND_CODE_DELAY_MS";
pub const ENV_VERIFY_CODE_DELAY_MS: &str = "FINANSIKI_VERIFY_CODE_DELAY_MS";
pub const ENV_LOG_FORMAT: &str = "FINANSIKI_LOG_FORMAT";
pub const ENV_REFERENCE_DATA: &str = "FINANSIKI_REFERENCE_DATA";

const DEFAULT_SEED_BALANCE: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed reference data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid reference data: {0}")]
    ReferenceData(#[from] DomainError),
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub seed_balance: Amount,
    pub latency: LatencyConfig,
    pub log_format: LogFormat,
    pub reference_data: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed_balance: const { Amount::from_literal(DEFAULT_SEED_BALANCE) },
            latency: LatencyConfig::default(),
            log_format: LogFormat::default(),
            reference_data: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_SEED_BALANCE) {
            config.seed_balance = raw.trim().parse::<Amount>().map_err(|e| {
                ConfigError::InvalidValue {
                    key: ENV_SEED_BALANCE,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(raw) = lookup(ENV_SEND_CODE_DELAY_MS) {
            config.latency.send_code = parse_millis(ENV_SEND_CODE_DELAY_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_VERIFY_CODE_DELAY_MS) {
            config.latency.verify_code = parse_millis(ENV_VERIFY_CODE_DELAY_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.log_format = raw.parse().map_err(|reason| ConfigError::InvalidValue {
                key: ENV_LOG_FORMAT,
                value: raw.clone(),
                reason,
            })?;
        }
        if let Some(raw) = lookup(ENV_REFERENCE_DATA) {
            if !raw.trim().is_empty() {
                config.reference_data = Some(PathBuf::from(raw.trim()));
            }
        }

        Ok(config)
    }

    /// Built-in reference data, or the JSON file named by `reference_data`.
    pub fn load_reference_data(&self) -> Result<ReferenceData, ConfigError> {
        match &self.reference_data {
            Some(path) => ReferenceData::from_file(path),
            None => Ok(ReferenceData::default()),
        }
    }
}

fn parse_millis(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// The card shown on the main tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInfo {
    pub number: String,
    pub holder: String,
}

impl Default for CardInfo {
    fn default() -> Self {
        Self {
            number: "1234567890123456".to_string(),
            holder: "Юный Финансист".to_string(),
        }
    }
}

/// Read-only data the session is built from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceData {
    pub card: CardInfo,
    pub friends: FriendDirectory,
    pub questions: QuestionBank,
}

/// On-disk shape; every section is optional and falls back to the defaults.
#[derive(Debug, Deserialize)]
struct ReferenceDataFile {
    #[serde(default)]
    card: Option<CardInfo>,
    #[serde(default)]
    friends: Option<Vec<Friend>>,
    #[serde(default)]
    questions: Option<Vec<Question>>,
}

impl ReferenceData {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: ReferenceDataFile = serde_json::from_str(json)?;

        let friends = match file.friends {
            Some(friends) => FriendDirectory::new(friends)?,
            None => FriendDirectory::default(),
        };
        let questions = match file.questions {
            Some(questions) => QuestionBank::new(questions)?,
            None => QuestionBank::default(),
        };

        Ok(Self {
            card: file.card.unwrap_or_default(),
            friends,
            questions,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.seed_balance.get(), 1000);
        assert_eq!(config.latency.send_code, Duration::from_millis(2000));
        assert_eq!(config.latency.verify_code, Duration::from_millis(1500));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn values_are_overridden() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_SEED_BALANCE, "250"),
            (ENV_SEND_CODE_DELAY_MS, "0"),
            (ENV_VERIFY_CODE_DELAY_MS, " 10 "),
            (ENV_LOG_FORMAT, "json"),
            (ENV_REFERENCE_DATA, "/tmp/data.json"),
        ]))
        .unwrap();

        assert_eq!(config.seed_balance.get(), 250);
        assert_eq!(config.latency.send_code, Duration::ZERO);
        assert_eq!(config.latency.verify_code, Duration::from_millis(10));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.reference_data, Some(PathBuf::from("/tmp/data.json")));
    }

    #[test]
    fn bad_values_name_their_key() {
        for (key, value) in [
            (ENV_SEED_BALANCE, "0"),
            (ENV_SEED_BALANCE, "lots"),
            (ENV_SEND_CODE_DELAY_MS, "-1"),
            (ENV_LOG_FORMAT, "yaml"),
        ] {
            let err = AppConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { key: k, .. } if *k == key),
                "{key}={value} gave {err}"
            );
        }
    }

    #[test]
    fn reference_json_overrides_sections() {
        let data = ReferenceData::from_json(
            r#"{
                "friends": [
                    { "id": "a", "name": "Оля", "card_number": "1111222233334444" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(data.friends.len(), 1);
        assert_eq!(data.questions, QuestionBank::default());
        assert_eq!(data.card, CardInfo::default());
    }

    #[test]
    fn reference_json_is_validated() {
        let err = ReferenceData::from_json(r#"{ "questions": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ReferenceData(_)));

        let err = ReferenceData::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ReferenceData::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
