//! # Client Settings
//!
//! The `[api]` and `[auth]` sections of `stockscan.toml`.
//!
//! ```toml
//! [api]
//! base_url = "https://retail.example.com/store-ops/v1"
//! proxy_base_url = "https://scanner.example.com"
//! timeout_secs = 15
//! debug = false
//!
//! [auth]
//! stock = true           # try the bearer first
//! price_integrity = false
//! stock_history = true
//! order_info = true
//! ```
//!
//! The bearer token itself is never written back to the file; it comes from
//! `STOCKSCAN_BEARER_TOKEN` or the session at runtime.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregator::ProductAggregator;
use crate::endpoints::Endpoints;
use crate::error::{ClientError, ClientResult};
use crate::http::{HttpTransport, ReqwestTransport};
use crate::orchestrator::RequestOrchestrator;

// =============================================================================
// API Settings
// =============================================================================

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base URL of the Stock / PriceIntegrity / StockHistory / OrderInfo API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the same-origin product-detail proxy.
    #[serde(default = "default_proxy_base_url")]
    pub proxy_base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Debug mode: include response bodies in errors and rethrow the first
    /// per-item failure of a batch.
    #[serde(default)]
    pub debug: bool,
}

fn default_base_url() -> String {
    "http://localhost:8080/store-ops/v1".to_string()
}

fn default_proxy_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    15
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            base_url: default_base_url(),
            proxy_base_url: default_proxy_base_url(),
            timeout_secs: default_timeout(),
            debug: false,
        }
    }
}

impl ClientSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoints(&self) -> ClientResult<Endpoints> {
        Endpoints::new(&self.base_url, &self.proxy_base_url)
    }

    pub fn validate(&self) -> ClientResult<()> {
        self.endpoints()?;
        if self.timeout_secs == 0 {
            return Err(ClientError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Builds the reqwest transport for these settings.
    pub fn transport(&self) -> ClientResult<Arc<dyn HttpTransport>> {
        Ok(Arc::new(ReqwestTransport::new(self.timeout())?))
    }

    /// Builds an aggregator over `transport`.
    pub fn aggregator(
        &self,
        transport: Arc<dyn HttpTransport>,
        auth: &AuthPreferences,
    ) -> ClientResult<ProductAggregator> {
        Ok(ProductAggregator::new(
            RequestOrchestrator::new(transport),
            self.endpoints()?,
            auth.clone(),
        ))
    }
}

// =============================================================================
// Auth Preferences
// =============================================================================

/// Which endpoints are tried with the bearer token first.
///
/// Backends disagree about bearer tokens: some reject requests without one,
/// some reject requests with one. An endpoint set to `true` is tried with the
/// bearer first and without it on 401/403; `false` is the reverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPreferences {
    #[serde(default = "default_true")]
    pub stock: bool,

    #[serde(default)]
    pub price_integrity: bool,

    #[serde(default = "default_true")]
    pub stock_history: bool,

    #[serde(default = "default_true")]
    pub order_info: bool,

    /// Session bearer token. Never serialized.
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for AuthPreferences {
    fn default() -> Self {
        AuthPreferences {
            stock: true,
            price_integrity: false,
            stock_history: true,
            order_info: true,
            bearer_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = ClientSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_invalid_settings() {
        let settings = ClientSettings {
            base_url: "nope".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().unwrap_err().is_config_error());

        let settings = ClientSettings {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_auth_defaults() {
        let auth: AuthPreferences = serde_json::from_str("{}").unwrap();
        assert!(auth.stock);
        assert!(!auth.price_integrity);
        assert!(auth.stock_history);
        assert!(auth.order_info);
    }

    #[test]
    fn test_bearer_token_not_serialized() {
        let auth = AuthPreferences {
            bearer_token: Some("secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&auth).unwrap();
        assert!(!json.contains("secret"));
    }
}
