use crate::error::{Result, SalesReportError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub const ENV_CACHE_TTL_SECS: &str = "SALES_REPORT_CACHE_TTL_SECS";
pub const ENV_MAX_UPLOAD_BYTES: &str = "SALES_REPORT_MAX_UPLOAD_BYTES";
pub const ENV_ALLOWED_EXTENSIONS: &str = "SALES_REPORT_ALLOWED_EXTENSIONS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a cached report stays downloadable.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl_secs: ttl.as_secs(),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub cache: CacheConfig,
    pub max_upload_bytes: usize,
    /// Lower-case extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec!["csv".to_string()],
        }
    }
}

impl ReportConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by any `SALES_REPORT_*` environment variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            config.cache.ttl_secs = raw.trim().parse().map_err(|_| {
                SalesReportError::InvalidConfig(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_CACHE_TTL_SECS, raw
                ))
            })?;
        }

        if let Some(raw) = lookup(ENV_MAX_UPLOAD_BYTES) {
            config.max_upload_bytes = raw.trim().parse().map_err(|_| {
                SalesReportError::InvalidConfig(format!(
                    "{} must be a byte count, got '{}'",
                    ENV_MAX_UPLOAD_BYTES, raw
                ))
            })?;
        }

        if let Some(raw) = lookup(ENV_ALLOWED_EXTENSIONS) {
            config.allowed_extensions = raw
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(SalesReportError::InvalidConfig(
                "cache TTL must be greater than zero".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(SalesReportError::InvalidConfig(
                "max upload size must be greater than zero".to_string(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(SalesReportError::InvalidConfig(
                "at least one upload extension must be allowed".to_string(),
            ));
        }
        Ok(())
    }
}
