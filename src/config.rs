//! Run configuration.
//!
//! Settings come from an optional TOML file with `[service]`, `[run]` and
//! `[discovery]` tables, every key defaulted. The API credential is resolved
//! through an injected lookup so library code never touches the process
//! environment.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::discovery::DiscoveryOptions;
use crate::error::ConfigError;
use crate::orchestrator::RunOptions;
use crate::routing::MAX_DESTINATIONS;

/// Environment variable holding the Maps API key.
pub const API_KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceSettings,
    pub run: RunSettings,
    pub discovery: DiscoverySettings,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::InputNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Root of the Maps web service endpoints.
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            user_agent: concat!("accessmap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Nearest candidates tried per sample.
    pub k: usize,
    /// Samples resolved concurrently.
    pub concurrency: usize,
    /// Global budget for routing calls across all workers.
    pub requests_per_second: f64,
    /// Attempts per sample before it is recorded as errored.
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Consecutive errored samples that abort the run.
    pub max_consecutive_failures: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            k: 10,
            concurrency: 4,
            requests_per_second: 10.0,
            max_attempts: 2,
            retry_delay_ms: 2000,
            max_consecutive_failures: 10,
        }
    }
}

impl RunSettings {
    pub fn to_options(&self) -> Result<RunOptions, ConfigError> {
        if self.k == 0 || self.k > MAX_DESTINATIONS {
            return Err(ConfigError::InvalidK {
                k: self.k,
                max: MAX_DESTINATIONS,
            });
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }
        if !(self.requests_per_second.is_finite() && self.requests_per_second > 0.0) {
            return Err(invalid("requests_per_second", "must be positive"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        if self.max_consecutive_failures == 0 {
            return Err(invalid("max_consecutive_failures", "must be at least 1"));
        }

        Ok(RunOptions {
            k: self.k,
            concurrency: self.concurrency,
            min_request_interval: Duration::from_secs_f64(1.0 / self.requests_per_second),
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_consecutive_failures: self.max_consecutive_failures,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Place type to search for.
    pub category: String,
    /// Wait before a continuation token may be used.
    pub page_delay_ms: u64,
    pub max_pages: usize,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            category: "hospital".to_string(),
            page_delay_ms: 2000,
            max_pages: 3,
        }
    }
}

impl DiscoverySettings {
    pub fn to_options(&self) -> Result<DiscoveryOptions, ConfigError> {
        if self.max_pages == 0 {
            return Err(invalid("max_pages", "must be at least 1"));
        }
        if self.category.trim().is_empty() {
            return Err(invalid("category", "must not be empty"));
        }
        Ok(DiscoveryOptions {
            category: self.category.clone(),
            page_delay: Duration::from_millis(self.page_delay_ms),
            max_pages: self.max_pages,
        })
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidOption {
        name,
        reason: reason.to_string(),
    }
}

/// API credential. Never printed.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Everything a service client needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: ApiKey,
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ServiceConfig {
    /// Resolve settings and the credential. `lookup` stands in for the
    /// process environment.
    pub fn from_lookup<F>(settings: &ServiceSettings, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential(API_KEY_VAR.to_string()))?;

        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| invalid("base_url", &e.to_string()))?;

        Ok(Self {
            api_key: ApiKey::new(api_key),
            base_url,
            timeout: Duration::from_secs(settings.timeout_secs),
            user_agent: settings.user_agent.clone(),
        })
    }
}
