//! Configuration for cover extraction

use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Default cap on bytes read from a single archive entry (32 MiB)
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 32 * 1024 * 1024;

/// Default number of fuzzy-search candidates decoded before giving up
pub const DEFAULT_FUZZY_CANDIDATES: usize = 5;

/// Directory the legacy resolution rule prefixes to bare hrefs
pub const DEFAULT_LEGACY_CONTENT_DIR: &str = "OEBPS";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub href_resolution: HrefResolution,
    pub legacy_content_dir: String,
    pub max_entry_bytes: u64,
    pub fuzzy_candidates: usize,
}

/// How a bare manifest href is turned into an archive path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HrefResolution {
    /// Relative to the package document's own directory
    #[default]
    Package,
    /// Prefixed with a fixed content directory, wherever the package lives
    Legacy,
}

impl FromStr for HrefResolution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "package" | "package-relative" => Ok(HrefResolution::Package),
            "legacy" => Ok(HrefResolution::Legacy),
            _ => Err(ConfigError::InvalidValue {
                key: "COVER_HREF_RESOLUTION",
                value: s.to_string(),
            }),
        }
    }
}

impl Default for CoverConfig {
    fn default() -> Self {
        CoverConfig {
            href_resolution: HrefResolution::default(),
            legacy_content_dir: DEFAULT_LEGACY_CONTENT_DIR.to_string(),
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
            fuzzy_candidates: DEFAULT_FUZZY_CANDIDATES,
        }
    }
}

impl CoverConfig {
    /// Load from `COVER_*` environment variables, defaulting absent ones
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = CoverConfig::default();

        Ok(CoverConfig {
            href_resolution: match env::var("COVER_HREF_RESOLUTION") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.href_resolution,
            },
            legacy_content_dir: env::var("COVER_LEGACY_CONTENT_DIR")
                .map(|v| v.trim_matches('/').to_string())
                .unwrap_or(defaults.legacy_content_dir),
            max_entry_bytes: parse_var("COVER_MAX_ENTRY_BYTES")?.unwrap_or(defaults.max_entry_bytes),
            fuzzy_candidates: parse_var("COVER_FUZZY_CANDIDATES")?
                .unwrap_or(defaults.fuzzy_candidates),
        })
    }

    pub fn with_href_resolution(mut self, rule: HrefResolution) -> Self {
        self.href_resolution = rule;
        self
    }

    pub fn with_fuzzy_candidates(mut self, count: usize) -> Self {
        self.fuzzy_candidates = count;
        self
    }
}

fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(None),
    }
}
