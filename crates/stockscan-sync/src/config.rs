//! # Store-Ops Configuration
//!
//! Configuration for the scanner: which store, which backend, which
//! endpoints take a bearer, where the reachability probe points and where
//! the offline queue lives.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKSCAN_LOCATION_ID=1042                                         │
//! │     STOCKSCAN_BEARER_TOKEN=...                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/store-ops/stockscan.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockscan.store-ops/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost backend, 14-day eviction                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # stockscan.toml
//! [store]
//! location_id = "1042"
//!
//! [api]
//! base_url = "https://retail.example.com/store-ops/v1"
//! proxy_base_url = "https://scanner.example.com"
//! timeout_secs = 15
//!
//! [auth]
//! stock = true
//! price_integrity = false
//!
//! [sync]
//! probe_url = "https://retail.example.com/store-ops/v1/health"
//! eviction_days = 14
//!
//! [database]
//! path = "/var/lib/stockscan/queue.db"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stockscan_client::{AuthPreferences, ClientSettings};
use stockscan_core::validation::validate_location_id;
use stockscan_core::EVICTION_DAYS;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Store
// =============================================================================

/// The store this device scans in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend location id, used in every endpoint path.
    #[serde(default)]
    pub location_id: String,
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Reachability probe and eviction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Health URL probed before a flush.
    /// Defaults to the API base URL when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_url: Option<String>,

    /// Captures older than this are evicted on mount.
    #[serde(default = "default_eviction_days")]
    pub eviction_days: u32,

    /// Probe timeout (seconds).
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_eviction_days() -> u32 {
    EVICTION_DAYS
}

fn default_probe_timeout() -> u64 {
    5
}

/// Upper bound on `eviction_days`: ten years.
pub const MAX_EVICTION_DAYS: u32 = 3650;

impl SyncSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            probe_url: None,
            eviction_days: default_eviction_days(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Queue database file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete scanner configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOpsConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub api: ClientSettings,

    #[serde(default)]
    pub auth: AuthPreferences,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl StoreOpsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stockscan.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file. The bearer token is never written.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.store.location_id.trim().is_empty() {
            return Err(SyncError::MissingLocationId);
        }
        validate_location_id(&self.store.location_id)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        self.api.validate()?;

        let probe = self.probe_url()?;
        if !matches!(probe.scheme(), "http" | "https") {
            return Err(SyncError::InvalidUrl(format!(
                "Probe URL must be http:// or https://, got: {probe}"
            )));
        }

        if self.sync.eviction_days == 0 || self.sync.eviction_days > MAX_EVICTION_DAYS {
            return Err(SyncError::InvalidConfig(format!(
                "eviction_days must be between 1 and {MAX_EVICTION_DAYS}"
            )));
        }

        if self.sync.probe_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "probe_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `STOCKSCAN_*` overrides read through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("STOCKSCAN_LOCATION_ID") {
            debug!(location_id = %id, "Overriding location id from environment");
            self.store.location_id = id;
        }

        if let Some(url) = var("STOCKSCAN_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(url) = var("STOCKSCAN_PROXY_URL") {
            debug!(url = %url, "Overriding proxy URL from environment");
            self.api.proxy_base_url = url;
        }

        if let Some(url) = var("STOCKSCAN_PROBE_URL") {
            self.sync.probe_url = Some(url);
        }

        if let Some(token) = var("STOCKSCAN_BEARER_TOKEN") {
            debug!("Bearer token supplied from environment");
            self.auth.bearer_token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(flag) = var("STOCKSCAN_DEBUG") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.api.debug = true,
                "0" | "false" | "no" | "off" | "" => self.api.debug = false,
                _ => warn!(value = %flag, "Unknown STOCKSCAN_DEBUG value"),
            }
        }

        if let Some(path) = var("STOCKSCAN_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "stockscan", "store-ops")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("stockscan.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn location_id(&self) -> &str {
        self.store.location_id.trim()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.auth.bearer_token.as_deref()
    }

    /// The probe URL, falling back to the API base URL.
    pub fn probe_url(&self) -> SyncResult<Url> {
        let raw = self.sync.probe_url.as_deref().unwrap_or(&self.api.base_url);
        Ok(Url::parse(raw)?)
    }

    /// The queue database file.
    pub fn database_path(&self) -> PathBuf {
        self.database.path.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().join("stockscan.db"))
                .unwrap_or_else(|| PathBuf::from("stockscan.db"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn configured() -> StoreOpsConfig {
        let mut config = StoreOpsConfig::default();
        config.store.location_id = "1042".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = StoreOpsConfig::default();
        assert_eq!(config.sync.eviction_days, 14);
        assert!(config.auth.stock);
        assert!(!config.auth.price_integrity);
        assert!(config.bearer_token().is_none());
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            StoreOpsConfig::default().validate(),
            Err(SyncError::MissingLocationId)
        ));

        let mut config = configured();
        assert!(config.validate().is_ok());

        config.sync.probe_url = Some("ws://localhost/health".to_string());
        assert!(config.validate().unwrap_err().is_config_error());

        config.sync.probe_url = None;
        config.sync.eviction_days = 0;
        assert!(config.validate().is_err());

        config.sync.eviction_days = 100_000_000;
        assert!(config.validate().unwrap_err().is_config_error());

        config.sync.eviction_days = MAX_EVICTION_DAYS;
        assert!(config.validate().is_ok());

        let mut config = configured();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_probe_url_falls_back_to_api() {
        let mut config = configured();
        assert_eq!(config.probe_url().unwrap().as_str(), "http://localhost:8080/store-ops/v1");

        config.sync.probe_url = Some("https://api.example.com/health".to_string());
        assert_eq!(config.probe_url().unwrap().as_str(), "https://api.example.com/health");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STOCKSCAN_LOCATION_ID", "2001"),
            ("STOCKSCAN_API_URL", "https://api.example.com/v1"),
            ("STOCKSCAN_BEARER_TOKEN", "tok"),
            ("STOCKSCAN_DEBUG", "true"),
            ("STOCKSCAN_DB_PATH", "/tmp/queue.db"),
        ]
        .into_iter()
        .collect();

        let mut config = StoreOpsConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.location_id(), "2001");
        assert_eq!(config.api.base_url, "https://api.example.com/v1");
        assert_eq!(config.bearer_token(), Some("tok"));
        assert!(config.api.debug);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/queue.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing() {
        let config: StoreOpsConfig = toml::from_str(
            r#"
            [store]
            location_id = "1042"

            [auth]
            price_integrity = true

            [sync]
            probe_url = "https://api.example.com/health"
            "#,
        )
        .unwrap();

        assert_eq!(config.location_id(), "1042");
        assert!(config.auth.price_integrity);
        assert!(config.auth.stock);
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.sync.eviction_days, 14);
    }

    #[test]
    fn test_toml_serialization_omits_bearer() {
        let mut config = configured();
        config.auth.bearer_token = Some("secret".to_string());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[api]"));
        assert!(!toml_str.contains("secret"));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "stockscan-config-{}.toml",
            std::process::id()
        ));

        let mut config = configured();
        config.sync.eviction_days = 7;
        config.save(Some(path.clone())).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let loaded: StoreOpsConfig = toml::from_str(&raw).unwrap();
        assert_eq!(loaded.sync.eviction_days, 7);
        assert_eq!(loaded.location_id(), "1042");

        std::fs::remove_file(&path).ok();
    }
}
