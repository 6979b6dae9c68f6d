// src/config/mod.rs
//! Proxy configuration: upstream sources, SEC client settings and pacing.
//!
//! Resolution order:
//! 1) $PROXY_CONFIG_PATH (must exist)
//! 2) config/proxy.toml
//! 3) built-in defaults
//!
//! Environment overrides are applied last.

pub mod sources;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

pub use sources::{FieldMap, SignalKind, SourceConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config/proxy.toml";
pub const ENV_CONFIG_PATH: &str = "PROXY_CONFIG_PATH";
pub const ENV_BACKOFF_MS: &str = "PROXY_BACKOFF_MS";
pub const ENV_TIMEOUT_MS: &str = "PROXY_TIMEOUT_MS";
pub const ENV_SEC_USER_AGENT: &str = "SEC_USER_AGENT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecConfig {
    /// EDGAR requires "<name> <contact email>".
    pub user_agent: String,
    pub submissions_base: String,
    pub archives_base: String,
    pub timeout_ms: u64,
}

impl Default for SecConfig {
    fn default() -> Self {
        Self {
            user_agent: "market-news-proxy admin@example.com".into(),
            submissions_base: "https://data.sec.gov".into(),
            archives_base: "https://www.sec.gov".into(),
            timeout_ms: 10_000,
        }
    }
}

impl SecConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Pause between endpoint attempts of one chain.
    pub backoff_ms: u64,
    /// Cap on each returned news list.
    pub max_items: usize,
    /// Offset used to render record times, minutes east of UTC.
    pub display_utc_offset_minutes: i32,
    pub sec: SecConfig,
    pub sources: Vec<SourceConfig>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            backoff_ms: 500,
            max_items: 10,
            display_utc_offset_minutes: 8 * 60,
            sec: SecConfig::default(),
            sources: sources::default_sources(),
        }
    }
}

impl ProxyConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: ProxyConfig = toml::from_str(s).context("parsing proxy config toml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading proxy config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks, then apply environment overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var(ENV_BACKOFF_MS) {
            self.backoff_ms = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_BACKOFF_MS} must be milliseconds"))?;
        }
        if let Ok(v) = std::env::var(ENV_TIMEOUT_MS) {
            let ms: u64 = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_MS} must be milliseconds"))?;
            for s in &mut self.sources {
                s.timeout_ms = ms;
            }
            self.sec.timeout_ms = ms;
        }
        if let Ok(v) = std::env::var(ENV_SEC_USER_AGENT) {
            self.sec.user_agent = v.trim().to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            bail!("max_items must be positive");
        }
        if FixedOffset::east_opt(self.display_utc_offset_minutes * 60).is_none() {
            bail!("display_utc_offset_minutes out of range");
        }
        for s in &self.sources {
            if s.platform.trim().is_empty() || s.tag.trim().is_empty() {
                bail!("source '{}' needs a platform and a tag", s.name);
            }
            if s.latest.is_empty() || s.hottest.is_empty() {
                bail!("source '{}' needs latest and hottest endpoints", s.platform);
            }
        }
        Ok(())
    }

    /// Case-insensitive lookup by platform name.
    pub fn source(&self, platform: &str) -> Option<&SourceConfig> {
        self.sources
            .iter()
            .find(|s| s.platform.eq_ignore_ascii_case(platform.trim()))
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }
}
