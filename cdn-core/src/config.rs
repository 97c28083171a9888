//! # Configuration
//!
//! cdn-rs configuration is a plain string key/value store, layered from
//! the process environment (and an optional `.env` file), then frozen into
//! a [`ConfigSnapshot`] and parsed into a typed [`CdnConfig`].
//!
//! ## Environment overrides
//!
//! Keys are derived from environment variables carrying a prefix:
//!
//! ```bash
//! export CDN__SPACES__NAME=my-bucket     # -> spaces.name
//! export CDN__CDN_ENDPOINT=https://x.io  # -> cdn_endpoint
//! ```
//!
//! ```rust
//! use cdn_core::config::ConfigMap;
//!
//! let mut config = ConfigMap::new();
//! config.set("cdn_endpoint", "https://cdn.example.com");
//! config.set("spaces.url", "https://bucket.example.com");
//! config.set("spaces.name", "bucket");
//!
//! let cdn = cdn_core::CdnConfig::from_snapshot(&config.snapshot()).unwrap();
//! assert_eq!(cdn.id_length, 8);
//! ```

use std::collections::HashMap;

use tracing::{debug, info};

use crate::errors::{CdnError, CdnResult};

/// Default environment prefix.
pub const ENV_PREFIX: &str = "CDN__";

#[derive(Debug, Default)]
pub struct ConfigMap {
    values: HashMap<String, String>,
}

impl ConfigMap {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Import every `prefix`-ed variable from an iterator of env pairs.
    ///
    /// `CDN__SPACES__ACCESS_KEY` becomes `spaces.access_key`.
    pub fn merge_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                debug!("config key {} loaded from environment", normalized);
                self.values.insert(normalized, value);
            }
        }
    }

    /// Load `.env` (if present) and then the process environment.
    pub fn load_env(&mut self, prefix: &str) {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment file {}", path.display());
        }
        self.merge_vars(prefix, std::env::vars());
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    fn require(&self, key: &str) -> CdnResult<String> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.trim_end_matches('/').to_string())
            .ok_or_else(|| CdnError::validation(format!("Missing configuration value {}", key)))
    }
}

/// Object storage (Spaces / S3) settings.
#[derive(Debug, Clone, Default)]
pub struct SpacesConfig {
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: Option<String>,
    /// Public base URL of the bucket, e.g. `https://bucket.region.digitaloceanspaces.com`
    pub url: String,
    /// Provider CDN base URL in front of the bucket
    pub cdn_url: String,
    /// Bucket name
    pub name: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct CdnConfig {
    /// Base of the short, stable file URLs served by this backend
    pub cdn_endpoint: String,
    pub spaces: SpacesConfig,
    /// Length of generated file and folder ids
    pub id_length: usize,
    /// How many ids to try before giving up on a collision
    pub id_attempts: usize,
    pub files_collection: String,
    pub folders_collection: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            cdn_endpoint: String::new(),
            spaces: SpacesConfig::default(),
            id_length: 8,
            id_attempts: 3,
            files_collection: "files".to_string(),
            folders_collection: "folders".to_string(),
        }
    }
}

impl CdnConfig {
    /// Build from the environment using [`ENV_PREFIX`].
    pub fn from_env() -> CdnResult<Self> {
        let mut map = ConfigMap::new();
        map.load_env(ENV_PREFIX);
        Self::from_snapshot(&map.snapshot())
    }

    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> CdnResult<Self> {
        let defaults = Self::default();

        let spaces_url = snapshot.require("spaces.url")?;
        let spaces = SpacesConfig {
            access_key: snapshot.get_string("spaces.access_key").unwrap_or_default(),
            secret_key: snapshot.get_string("spaces.secret_key").unwrap_or_default(),
            endpoint: snapshot.get_string("spaces.endpoint").filter(|v| !v.is_empty()),
            cdn_url: snapshot
                .get("spaces.cdn_url")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| spaces_url.clone()),
            url: spaces_url,
            name: snapshot.require("spaces.name")?,
            region: snapshot
                .get_string("spaces.region")
                .unwrap_or_else(|| "us-east-1".to_string()),
        };

        let id_length = snapshot.get_usize("id_length").unwrap_or(defaults.id_length);
        if id_length == 0 {
            return Err(CdnError::validation("id_length must be at least 1"));
        }

        Ok(Self {
            cdn_endpoint: snapshot.require("cdn_endpoint")?,
            spaces,
            id_length,
            id_attempts: snapshot
                .get_usize("id_attempts")
                .unwrap_or(defaults.id_attempts)
                .max(1),
            files_collection: snapshot
                .get_string("collections.files")
                .unwrap_or(defaults.files_collection),
            folders_collection: snapshot
                .get_string("collections.folders")
                .unwrap_or(defaults.folders_collection),
        })
    }

    /// Minimal config for tests and local runs.
    pub fn local(cdn_endpoint: impl Into<String>, spaces_url: impl Into<String>) -> Self {
        let spaces_url = spaces_url.into();
        Self {
            cdn_endpoint: cdn_endpoint.into(),
            spaces: SpacesConfig {
                cdn_url: spaces_url.clone(),
                url: spaces_url,
                name: "local".to_string(),
                region: "us-east-1".to_string(),
                ..SpacesConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_keys_are_normalized() {
        let mut map = ConfigMap::new();
        map.merge_vars(
            ENV_PREFIX,
            vars(&[
                ("CDN__SPACES__ACCESS_KEY", "abc"),
                ("CDN__CDN_ENDPOINT", "https://cdn.example.com"),
                ("UNRELATED", "x"),
            ]),
        );

        assert_eq!(map.get("spaces.access_key"), Some("abc"));
        assert_eq!(map.get("cdn_endpoint"), Some("https://cdn.example.com"));
        assert!(!map.has("unrelated"));
    }

    #[test]
    fn typed_config_applies_defaults() {
        let mut map = ConfigMap::new();
        map.merge_vars(
            ENV_PREFIX,
            vars(&[
                ("CDN__CDN_ENDPOINT", "https://cdn.example.com/"),
                ("CDN__SPACES__URL", "https://bucket.example.com"),
                ("CDN__SPACES__NAME", "bucket"),
            ]),
        );

        let config = CdnConfig::from_snapshot(&map.snapshot()).unwrap();
        assert_eq!(config.cdn_endpoint, "https://cdn.example.com");
        assert_eq!(config.spaces.cdn_url, "https://bucket.example.com");
        assert_eq!(config.id_length, 8);
        assert_eq!(config.id_attempts, 3);
        assert_eq!(config.files_collection, "files");
    }

    #[test]
    fn missing_required_values_fail() {
        let mut map = ConfigMap::new();
        map.set("spaces.url", "https://bucket.example.com");
        let err = CdnConfig::from_snapshot(&map.snapshot()).unwrap_err();
        assert_eq!(err.code(), 400);
        assert!(err.message.contains("spaces.name"));
    }
}
