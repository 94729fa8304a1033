//! Console configuration.
//! Reads `config.toml` from the data directory; `BANKOPS_API_URL` and
//! `BANKOPS_LOG` override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::store::Reconcile;
use crate::platform::{NativePlatform, Platform};

pub const API_URL_ENV: &str = "BANKOPS_API_URL";
pub const LOG_ENV: &str = "BANKOPS_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Opt-in per-request timeout; requests wait indefinitely when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub reconcile: Reconcile,
    /// Owner used for task listing when `--user` is not given.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_user_role")]
    pub user_role: String,
    #[serde(default)]
    pub co_code_ld: Option<String>,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_user_role() -> String {
    "admin".to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: None,
            log_level: default_log_level(),
            reconcile: Reconcile::default(),
            user_id: None,
            user_role: default_user_role(),
            co_code_ld: None,
        }
    }
}

impl ConsoleConfig {
    pub fn default_path() -> PathBuf {
        NativePlatform::data_dir().join("config.toml")
    }

    pub fn log_file() -> PathBuf {
        NativePlatform::data_dir().join("logs").join("bankops.log")
    }

    /// Loads the file at `path` (defaults when it does not exist), then
    /// applies environment overrides and validates the result.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// File contents only, without environment overrides.
    pub fn read_file(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str::<ConsoleConfig>(&raw)
                .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConsoleConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(level) = lookup(LOG_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let parsed = url::Url::parse(&self.api_url)
            .map_err(|e| anyhow::anyhow!("invalid api_url '{}': {}", self.api_url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("api_url must be http(s), got '{}'", parsed.scheme());
        }
        if self.request_timeout_secs == Some(0) {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Sets one field from its string form, as typed on the command line.
    pub fn set_field(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "api_url" | "api-url" => self.api_url = value.trim().to_string(),
            "request_timeout_secs" | "timeout" => {
                self.request_timeout_secs = if value.trim().is_empty() || value == "none" {
                    None
                } else {
                    Some(value.trim().parse().map_err(|_| {
                        anyhow::anyhow!("timeout must be a whole number of seconds")
                    })?)
                }
            }
            "log_level" | "log-level" => self.log_level = value.trim().to_string(),
            "reconcile" => {
                self.reconcile = Reconcile::from_name(value)
                    .ok_or_else(|| anyhow::anyhow!("reconcile must be 'local' or 'refetch'"))?
            }
            "user_id" | "user" => self.user_id = Some(value.trim().to_string()),
            "user_role" | "role" => self.user_role = value.trim().to_string(),
            "co_code_ld" => self.co_code_ld = Some(value.trim().to_string()),
            _ => anyhow::bail!("unknown config key '{}'", key),
        }
        self.validate()
    }
}
