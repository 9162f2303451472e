//! Configuration for the zone settings module

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment overrides, `__` separates nesting levels
pub const ENV_PREFIX: &str = "ZONE_SETTINGS_";

/// Zone settings configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Remote API access
    #[serde(default)]
    pub api: ApiConfig,

    /// Directory holding one state document per managed zone
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            state_dir: default_state_dir(),
        }
    }
}

impl Config {
    /// Load defaults, then the optional YAML file, then environment overrides
    ///
    /// `CLOUDFLARE_API_TOKEN` is honoured as a fallback for `api.api_token`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::raw().only(&["CLOUDFLARE_API_TOKEN"]).map(|_| "api.api_token".into()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to load zone settings configuration")
    }
}

/// Remote API client settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// API root, including the version path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token
    #[serde(default)]
    pub api_token: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Retries for throttled, failed-server and transport errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, grows linearly
    #[serde(default = "default_retry_backoff", with = "humantime_serde")]
    pub retry_backoff: Duration,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
            user_agent: default_user_agent(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &if self.api_token.is_empty() { "" } else { "<redacted>" })
            .field("request_timeout", &self.request_timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".zone-settings")
}

fn default_base_url() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff() -> Duration {
    Duration::from_millis(500)
}

fn default_user_agent() -> String {
    format!("zone-settings/{}", env!("CARGO_PKG_VERSION"))
}
