//! Per-ledger `kakeibo.toml` and the per-user config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ErrorCode;

/// Name of the per-ledger config file.
pub const LEDGER_CONFIG_FILE: &str = "kakeibo.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::StorageUnavailable,
            Self::Parse { .. } => ErrorCode::ConfigParseError,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub participants: ParticipantsConfig,
    #[serde(default)]
    pub categories: CategoriesConfig,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_journal_file")]
    pub file: String,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub durable: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            file: default_journal_file(),
            lock_timeout_ms: default_lock_timeout_ms(),
            durable: default_true(),
        }
    }
}

impl JournalConfig {
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Display names of the two amount columns and their salary payer labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantsConfig {
    #[serde(default = "default_participant_a")]
    pub a: String,
    #[serde(default = "default_participant_b")]
    pub b: String,
    /// Salary payer label used when column A carries the amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_b: Option<String>,
}

impl Default for ParticipantsConfig {
    fn default() -> Self {
        Self {
            a: default_participant_a(),
            b: default_participant_b(),
            salary_a: None,
            salary_b: None,
        }
    }
}

impl ParticipantsConfig {
    /// Salary payer label for column A, falling back to its display name.
    #[must_use]
    pub fn salary_label_a(&self) -> &str {
        self.salary_a.as_deref().unwrap_or(&self.a)
    }

    #[must_use]
    pub fn salary_label_b(&self) -> &str {
        self.salary_b.as_deref().unwrap_or(&self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoriesConfig {
    #[serde(default = "default_salary_category")]
    pub salary: String,
    #[serde(default = "default_bill_category")]
    pub bill: String,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            salary: default_salary_category(),
            bill: default_bill_category(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    #[serde(default = "default_max_gap_days")]
    pub max_gap_days: i64,
    #[serde(default = "default_min_gap_days")]
    pub min_gap_days: i64,
    #[serde(default = "default_count_tolerance")]
    pub count_tolerance: i64,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            max_gap_days: default_max_gap_days(),
            min_gap_days: default_min_gap_days(),
            count_tolerance: default_count_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Default author recorded on appended rows.
    #[serde(default)]
    pub author: Option<String>,
    /// Preferred output mode: `pretty`, `text` or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

/// Load `kakeibo.toml` from the ledger directory, defaulting when absent.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_ledger_config(ledger_root: &Path) -> Result<LedgerConfig, ConfigError> {
    let path = ledger_root.join(LEDGER_CONFIG_FILE);
    if !path.exists() {
        return Ok(LedgerConfig::default());
    }
    parse_file(&path)
}

/// Load the user-level config from the platform config directory.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("kakeibo/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }
    parse_file(&path)
}

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<T>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

const fn default_true() -> bool {
    true
}

fn default_journal_file() -> String {
    "log.tsv".to_string()
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_participant_a() -> String {
    "リク".to_string()
}

fn default_participant_b() -> String {
    "あん".to_string()
}

fn default_salary_category() -> String {
    "給料".to_string()
}

fn default_bill_category() -> String {
    "月額".to_string()
}

const fn default_max_gap_days() -> i64 {
    45
}

const fn default_min_gap_days() -> i64 {
    15
}

const fn default_count_tolerance() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_ledger_config(dir.path()).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.journal.file, "log.tsv");
        assert_eq!(config.recurrence.max_gap_days, 45);
        assert_eq!(config.categories.bill, "月額");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(LEDGER_CONFIG_FILE),
            "[participants]\nsalary_a = \"Fred\"\n\n[recurrence]\nmax_gap_days = 40\n",
        )
        .unwrap();

        let config = load_ledger_config(dir.path()).unwrap();
        assert_eq!(config.participants.salary_label_a(), "Fred");
        assert_eq!(config.participants.salary_label_b(), "あん");
        assert_eq!(config.recurrence.max_gap_days, 40);
        assert_eq!(config.recurrence.min_gap_days, 15);
        assert!(config.journal.durable);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(LEDGER_CONFIG_FILE), "[journal\nfile = 3").unwrap();
        let err = load_ledger_config(dir.path()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigParseError);
    }

    #[test]
    fn lock_timeout_is_milliseconds() {
        let journal = JournalConfig {
            lock_timeout_ms: 250,
            ..JournalConfig::default()
        };
        assert_eq!(journal.lock_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn user_config_fields_are_optional() {
        let user: UserConfig = toml::from_str("author = \"riku\"\n").unwrap();
        assert_eq!(user.author.as_deref(), Some("riku"));
        assert!(user.output.is_none());
    }
}
