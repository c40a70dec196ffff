//! # Error Types
//!
//! Domain-specific error types for stockscan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockscan-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockscan-db errors      └── DbError      - Queue storage failures    │
//! │  stockscan-client errors  └── ClientError  - Backend request failures  │
//! │  stockscan-sync errors    └── SyncError    - Flush / config failures   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError / ClientError → SyncError │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Collection name does not match any offline queue collection.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// A queued payload was stored in the wrong collection.
    ///
    /// ## When This Occurs
    /// - A product fetch payload handed to the availability collection
    /// - A hand-edited database row
    #[error("Payload of kind {kind} does not belong in collection {collection}")]
    PayloadMismatch { kind: String, collection: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any request is made or any record is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., whitespace inside a barcode).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
