//! # stockscan-core: Pure Domain Logic
//!
//! This crate holds everything about the product-data access layer that can
//! be expressed without I/O: the canonical product record, the backend wire
//! shapes, the merge rules that turn one into the other, the shelf-location
//! formatter, and the offline capture payloads.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        stockscan Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    PWA Frontend                                 │   │
//! │  │    Scan ──► Product card ──► Availability capture               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │       stockscan-client          │        stockscan-sync         │   │
//! │  │  orchestrator + aggregator      │   coordinator + probe         │   │
//! │  └─────────────────────────────┬───────────────────┬───────────────┘   │
//! │                                │                   │                    │
//! │  ┌─────────────────────────────▼───────┐  ┌────────▼───────────────┐   │
//! │  │     ★ stockscan-core (THIS CRATE) ★ │  │     stockscan-db       │   │
//! │  │  types • wire • merge • location    │  │  offline queue (SQLite)│   │
//! │  │  NO I/O • PURE FUNCTIONS            │  └────────────────────────┘   │
//! │  └─────────────────────────────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Canonical product record and offline capture types
//! - [`wire`] - Response shapes of the four backend endpoints and the proxy
//! - [`merge`] - Rules that fold endpoint responses into a [`CanonicalProduct`]
//! - [`location`] - Shelf-location formatting and parsing
//! - [`validation`] - Input validation for scanned codes and identifiers
//! - [`error`] - Domain error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod location;
pub mod merge;
pub mod types;
pub mod validation;
pub mod wire;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use location::{BaySide, ParsedLocation, RawLocation};
pub use merge::{merge_product, AggregationSources};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Age after which queued captures are evicted, in days.
pub const EVICTION_DAYS: u32 = 14;

/// Longest scanned code accepted from the barcode/OCR layer.
pub const MAX_SCANNED_CODE_LEN: usize = 64;
