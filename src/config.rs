//! Runtime configuration.
//!
//! Loaded from `~/.mailtrace/config.json` when present. Every field has a
//! default, and a missing file simply means defaults — the only hard
//! requirement for useful outbound detection is `selfAddresses`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Bulk/marketing sender domains excluded from search queries by default.
pub const DEFAULT_NOISE_DOMAINS: &[&str] = &[
    "mailchimp.com",
    "sendgrid.net",
    "mandrillapp.com",
    "hubspot.com",
    "marketo.com",
    "intercom.io",
    "customer.io",
    "mailgun.org",
    "amazonses.com",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// The account owner's primary address plus known aliases. Used only
    /// for outbound detection.
    pub self_addresses: Vec<String>,
    /// Domains excluded from header and body search queries.
    pub noise_domains: Vec<String>,
    /// Header/body search recency window, in days.
    pub search_window_days: i64,
    /// Minimum spacing between outbound search calls, in milliseconds.
    pub min_query_interval_ms: u64,
    /// Maximum threads consumed per phase query.
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            self_addresses: Vec::new(),
            noise_domains: DEFAULT_NOISE_DOMAINS.iter().map(|d| d.to_string()).collect(),
            search_window_days: 1095,
            min_query_interval_ms: 1_100,
            page_size: 25,
        }
    }
}

impl Config {
    /// Default config file path: `~/.mailtrace/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".mailtrace")
            .join("config.json")
    }

    /// Load config from `path` (or the default path). A missing file yields
    /// defaults; an unreadable or malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Owner addresses, lowercased, for outbound detection.
    pub fn self_address_set(&self) -> HashSet<String> {
        self.self_addresses
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.search_window_days, 1095);
        assert_eq!(config.page_size, 25);
        assert!(config.noise_domains.contains(&"mailchimp.com".to_string()));
        assert!(config.self_addresses.is_empty());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.min_query_interval_ms, 1_100);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"selfAddresses": ["Me@MyCo.com", "me-alias@myco.com"], "searchWindowDays": 730}"#,
        )
        .unwrap();
        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.search_window_days, 730);
        assert_eq!(config.page_size, 25);
        let owners = config.self_address_set();
        assert!(owners.contains("me@myco.com"));
        assert!(owners.contains("me-alias@myco.com"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Config::load(Some(path.as_path())),
            Err(ConfigError::Parse { .. })
        ));
    }
}
