//! Server configuration.
//!
//! The configuration is read once at startup from a JSON file (or YAML, when
//! the file ends in `.yaml`/`.yml`) and is immutable afterwards. Every
//! required field must be present and non-empty/non-zero; anything else is a
//! startup-fatal error.

use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable consulted when no config path is given on the command line.
pub const CONFIG_ENV: &str = "WARDEN_CONFIG";

/// Config file used when neither a CLI argument nor `WARDEN_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub admin_port: u16,
    pub document_root: PathBuf,
    pub max_threads: usize,
    pub log_file: PathBuf,

    #[serde(default = "default_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub write_timeout_secs: u64,
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,

    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Value of the `Server` response header.
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_stats_interval_secs() -> u64 {
    60
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "adminpass".to_string()
}

fn default_server_name() -> String {
    concat!("warden/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Config {
    /// Reads, parses and validates the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("configuration file {} not readable", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        let cfg = if is_yaml {
            Self::from_yaml(&raw)
        } else {
            Self::from_json(&raw)
        };

        cfg.with_context(|| format!("invalid configuration in {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_json::from_str(raw).context("error parsing config JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw).context("error parsing config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolves the config path from the first CLI argument, then
    /// `WARDEN_CONFIG`, then [`DEFAULT_CONFIG_PATH`].
    pub fn path_from_args(mut args: impl Iterator<Item = String>) -> PathBuf {
        args.next()
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
            .into()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.trim().is_empty() {
            bail!("host is required in config");
        }
        if self.port == 0 {
            bail!("port is required and must be non-zero");
        }
        if self.admin_port == 0 {
            bail!("admin_port is required and must be non-zero");
        }
        if self.document_root.as_os_str().is_empty() {
            bail!("document_root is required");
        }
        if self.max_threads == 0 {
            bail!("max_threads is required and must be non-zero");
        }
        if self.log_file.as_os_str().is_empty() {
            bail!("log_file is required");
        }
        if self.read_timeout_secs == 0 || self.write_timeout_secs == 0 {
            bail!("read_timeout_secs and write_timeout_secs must be non-zero");
        }
        if self.stats_interval_secs == 0 {
            bail!("stats_interval_secs must be non-zero");
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn admin_address(&self) -> String {
        format!("{}:{}", self.host, self.admin_port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}
