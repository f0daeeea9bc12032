//! 应用配置
//!
//! Loaded from a TOML file (`PROXYIP_CONFIG`, default `config.toml`); every key
//! is optional. `PROXYIP_HOST` and `PROXYIP_PORT` override the listen address.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use proxyip_checker::{CheckerSettings, DEFAULT_DOH_ENDPOINT, DEFAULT_USER_AGENT};
use serde::Deserialize;

const CONFIG_PATH_ENV: &str = "PROXYIP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub checker: CheckerConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Worker threads; defaults to the number of logical CPUs.
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

impl ServerConfig {
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub doh_endpoint: String,
    pub user_agent: String,
    /// Per-request timeout of the HTTPS client, in seconds. `0` disables it.
    pub request_timeout_secs: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            doh_endpoint: DEFAULT_DOH_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl CheckerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn settings(&self) -> CheckerSettings {
        CheckerSettings {
            doh_endpoint: self.doh_endpoint.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Send `Access-Control-Allow-Origin: *` on every response.
    pub allow_any_origin: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from the file named by `PROXYIP_CONFIG`, or from
    /// `config.toml` when present, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut config = match &explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("PROXYIP_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PROXYIP_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid PROXYIP_PORT: {port}"))?;
        }
        Ok(())
    }
}
