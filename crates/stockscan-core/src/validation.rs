//! # Validation Module
//!
//! Input validation for the identifiers that flow into backend requests and
//! queued captures.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Barcode / OCR decoder (external)                             │
//! │  └── Produces an opaque scanned-code string                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Trim, reject empty / oversized / whitespace-split codes           │
//! │  └── Runs before a URL is built or a row is written                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── PRIMARY KEY / NOT NULL constraints                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockscan_core::validation::{validate_location_id, validate_scanned_code};
//!
//! assert_eq!(validate_scanned_code(" 5000112637922 ").unwrap(), "5000112637922");
//! assert!(validate_location_id("").is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_SCANNED_CODE_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a scanned code and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_SCANNED_CODE_LEN`] characters
/// - No interior whitespace or control characters (OCR noise)
///
/// ## Example
/// ```rust
/// use stockscan_core::validation::validate_scanned_code;
///
/// assert!(validate_scanned_code("000000000123").is_ok());
/// assert!(validate_scanned_code("").is_err());
/// assert!(validate_scanned_code("12 34").is_err());
/// ```
pub fn validate_scanned_code(code: &str) -> ValidationResult<&str> {
    validate_code("scanned code", code)
}

/// Validates an internal SKU (the key of a product-fetch capture).
///
/// Same rules as a scanned code: offline lookups queue the scanned code
/// itself under this key, and backend SKUs may carry dots or brackets.
pub fn validate_sku(sku: &str) -> ValidationResult<&str> {
    validate_code("sku", sku)
}

fn validate_code<'a>(field: &str, value: &'a str) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_SCANNED_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_SCANNED_CODE_LEN,
        });
    }

    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain whitespace or control characters".to_string(),
        });
    }

    Ok(value)
}

/// Validates a store location id.
pub fn validate_location_id(location_id: &str) -> ValidationResult<&str> {
    let location_id = location_id.trim();

    if location_id.is_empty() {
        return Err(ValidationError::Required {
            field: "location id".to_string(),
        });
    }

    if location_id.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "location id".to_string(),
            max: 32,
        });
    }

    Ok(location_id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_scanned_code() {
        assert_eq!(validate_scanned_code("  9300633601234\n").unwrap(), "9300633601234");
        assert!(validate_scanned_code("ABC-123").is_ok());

        assert!(validate_scanned_code("").is_err());
        assert!(validate_scanned_code("   ").is_err());
        assert!(validate_scanned_code("93006 33601234").is_err());
        assert!(validate_scanned_code(&"9".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("123456").is_ok());
        assert!(validate_sku("ITEM_1-A").is_ok());
        assert_eq!(validate_sku(" SKU.12 ").unwrap(), "SKU.12");
        assert!(validate_sku("(01)09300633601234").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_location_id() {
        assert_eq!(validate_location_id(" 1042 ").unwrap(), "1042");
        assert!(validate_location_id("").is_err());
        assert!(validate_location_id(&"1".repeat(40)).is_err());
    }
}
