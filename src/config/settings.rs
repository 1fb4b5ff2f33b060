//! Settings file and environment resolution.
//!
//! Settings live in `<home>/config.json`. Every value can be overridden
//! by the environment, and the CLI can override the environment:
//! flag > `OPERATOR_*` variable > config file > default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::DEFAULT_DEBOUNCE;

pub const ENV_BACKEND_URL: &str = "OPERATOR_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "OPERATOR_ANON_KEY";
pub const ENV_ADMIN_EMAILS: &str = "OPERATOR_ADMIN_EMAILS";
pub const ENV_DEBOUNCE_MS: &str = "OPERATOR_DEBOUNCE_MS";

/// Default `op watch` polling interval.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_MORNING_TIME: &str = "06:00";
pub const DEFAULT_EVENING_TIME: &str = "20:00";

/// Contents of `config.json`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub admin_emails: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_interval_secs: Option<u64>,
    /// Wake reminder time, "HH:MM"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morning_time: Option<String>,
    /// Review reminder time, "HH:MM"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evening_time: Option<String>,
}

/// Get the config file path.
#[must_use]
pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.json")
}

/// Load settings; a missing file yields defaults.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_settings(home: &Path) -> Result<Settings> {
    let path = config_path(home);

    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Save settings, creating the home directory if needed.
///
/// # Errors
///
/// Returns `Error::Config` if the file cannot be written.
pub fn save_settings(home: &Path, settings: &Settings) -> Result<()> {
    fs::create_dir_all(home)
        .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    fs::write(config_path(home), content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub home: PathBuf,
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    /// Lowercased
    pub admin_emails: Vec<String>,
    pub debounce: Duration,
    pub watch_interval: Duration,
    pub morning_time: String,
    pub evening_time: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_emails(list: &str) -> Vec<String> {
    list.split([',', ' ', ';'])
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

impl RuntimeConfig {
    /// Resolve from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is unreadable.
    pub fn load(home: &Path, overrides: &Overrides) -> Result<Self> {
        let settings = load_settings(home)?;
        Ok(Self::resolve(home, &settings, overrides, |key| std::env::var(key).ok()))
    }

    /// Resolve with an explicit environment lookup.
    #[must_use]
    pub fn resolve<F>(home: &Path, settings: &Settings, overrides: &Overrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |flag: &Option<String>, key: &str, file: &Option<String>| {
            non_empty(flag.clone())
                .or_else(|| non_empty(env(key)))
                .or_else(|| non_empty(file.clone()))
        };

        let admin_emails = non_empty(env(ENV_ADMIN_EMAILS)).map_or_else(
            || settings.admin_emails.iter().map(|e| e.trim().to_lowercase()).collect(),
            |list| parse_emails(&list),
        );

        let debounce = non_empty(env(ENV_DEBOUNCE_MS))
            .and_then(|v| v.parse::<u64>().ok())
            .or(settings.debounce_ms)
            .map_or(DEFAULT_DEBOUNCE, Duration::from_millis);

        Self {
            home: home.to_path_buf(),
            backend_url: pick(&overrides.backend_url, ENV_BACKEND_URL, &settings.backend_url),
            anon_key: pick(&overrides.anon_key, ENV_ANON_KEY, &settings.anon_key),
            admin_emails,
            debounce,
            watch_interval: settings
                .watch_interval_secs
                .filter(|s| *s > 0)
                .map_or(DEFAULT_WATCH_INTERVAL, Duration::from_secs),
            morning_time: settings
                .morning_time
                .clone()
                .unwrap_or_else(|| DEFAULT_MORNING_TIME.to_string()),
            evening_time: settings
                .evening_time
                .clone()
                .unwrap_or_else(|| DEFAULT_EVENING_TIME.to_string()),
        }
    }

    /// Whether `email` is on the admin allowlist.
    #[must_use]
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}
