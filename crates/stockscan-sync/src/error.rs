//! # Sync Error Types
//!
//! Error types for connectivity tracking, queue reconciliation and
//! configuration loading.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Reachability  │  │     Lower layers        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  ProbeFailed    │  │  Database (DbError)     │ │
//! │  │  MissingLocation│  │  Cancelled      │  │  Client (ClientError)   │ │
//! │  │  InvalidUrl     │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `ProbeFailed` from `flush` means nothing was touched: every capture is
//! still queued.

use stockscan_client::ClientError;
use stockscan_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Store location id not configured. Set [store].location_id or STOCKSCAN_LOCATION_ID.")]
    MissingLocationId,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Reachability Errors
    // =========================================================================
    /// The reachability probe did not get a 2xx.
    #[error("Sync probe failed for {url}: {reason}")]
    ProbeFailed { url: String, reason: String },

    /// The caller cancelled the flush.
    #[error("Sync cancelled")]
    Cancelled,

    // =========================================================================
    // Lower Layers
    // =========================================================================
    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if a later flush may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ProbeFailed { .. } => true,
            SyncError::Database(e) => e.is_retryable(),
            SyncError::Client(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        match self {
            SyncError::InvalidConfig(_)
            | SyncError::MissingLocationId
            | SyncError::InvalidUrl(_)
            | SyncError::ConfigLoadFailed(_)
            | SyncError::ConfigSaveFailed(_) => true,
            SyncError::Client(e) => e.is_config_error(),
            _ => false,
        }
    }

    /// Returns true if the probe failed, i.e. the queue was left untouched.
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, SyncError::ProbeFailed { .. })
    }
}
