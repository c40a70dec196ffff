//! # Domain Types
//!
//! Types handed to the PWA frontend and stored in the offline queue.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐   ┌─────────────────┐   │
//! │  │  CanonicalProduct   │   │  PendingCapture │   │  CapturePayload │   │
//! │  │  ─────────────────  │   │  ─────────────  │   │  ─────────────  │   │
//! │  │  sku (internal)     │   │  id             │   │  Availability-  │   │
//! │  │  scanned_sku        │   │  ts             │   │    Capture      │   │
//! │  │  price / location   │   │  payload ───────┼──►│  ProductFetch   │   │
//! │  │  delivery_info      │   │  synced         │   │                 │   │
//! │  └─────────────────────┘   └─────────────────┘   └─────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────┐                                                │
//! │  │  Collection         │   availability-captures | product-fetches     │
//! │  └─────────────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity
//! A product has two identifiers:
//! - `scanned_sku`: whatever the barcode/OCR layer produced (EAN, PLU, ...)
//! - `sku`: the internal SKU the stock and order systems are keyed by

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::wire::{Order, StockHistory};

// =============================================================================
// Canonical Product
// =============================================================================

/// One product, merged from every backend source that answered.
///
/// Constructed fresh per lookup and never persisted by this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalProduct {
    /// Internal SKU.
    pub sku: String,

    /// The code as scanned.
    pub scanned_sku: String,

    /// Display description.
    pub name: String,

    pub price: ProductPrice,

    /// On-hand quantity. Zero when the stock system has no position.
    pub stock_quantity: f64,

    pub stock_unit: String,

    pub location: ProductLocation,

    pub temperature: String,

    pub weight: String,

    pub status: String,

    pub image_url: String,

    pub walk_sequence: String,

    pub delivery_info: Option<DeliveryInfo>,

    pub all_orders: Option<Vec<Order>>,

    pub last_stock_change: Option<StockHistory>,

    /// Full attribute bag of whichever source supplied the product record.
    #[ts(type = "Record<string, unknown>")]
    pub product_details: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductPrice {
    pub regular: Option<f64>,

    /// Offer text of the first active promotion (e.g. "2 for $5").
    pub promotional: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductLocation {
    pub standard: String,
    pub secondary: String,
    pub promotional: String,
}

// =============================================================================
// Delivery Info
// =============================================================================

/// Which replenishment order delivery info was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderPosition {
    Next,
    Last,
}

impl OrderPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPosition::Next => "next",
            OrderPosition::Last => "last",
        }
    }
}

/// Expected delivery of the next (or, failing that, last) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    pub expected_date: String,

    /// Ordered quantity in order units (usually cases).
    pub quantity: f64,

    /// `quantity × pack size`.
    pub total_units: f64,

    pub quantity_type: String,

    pub order_position: OrderPosition,
}

// =============================================================================
// Offline Capture Payloads
// =============================================================================

/// Shelf availability observed by a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Low,
    Unavailable,
}

/// A gap/availability check captured on the shop floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCapture {
    pub sku: String,
    pub location_id: String,
    pub status: AvailabilityStatus,
    pub quantity: Option<f64>,
    pub note: Option<String>,
}

/// A product lookup requested while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductFetch {
    pub sku: String,
    pub location_id: String,
    pub scanned_code: Option<String>,
}

/// Payload of a queued capture.
///
/// Serialized adjacently tagged: `{ "type": "ProductFetch", "payload": {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "payload")]
pub enum CapturePayload {
    AvailabilityCapture(AvailabilityCapture),
    ProductFetch(ProductFetch),
}

impl CapturePayload {
    /// Collection this payload is stored in.
    pub fn collection(&self) -> Collection {
        match self {
            CapturePayload::AvailabilityCapture(_) => Collection::AvailabilityCaptures,
            CapturePayload::ProductFetch(_) => Collection::ProductFetches,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CapturePayload::AvailabilityCapture(_) => "AvailabilityCapture",
            CapturePayload::ProductFetch(_) => "ProductFetch",
        }
    }

    pub fn sku(&self) -> &str {
        match self {
            CapturePayload::AvailabilityCapture(c) => &c.sku,
            CapturePayload::ProductFetch(f) => &f.sku,
        }
    }

    /// Fails if the payload does not belong in `collection`.
    pub fn ensure_collection(&self, collection: Collection) -> Result<(), CoreError> {
        if self.collection() == collection {
            Ok(())
        } else {
            Err(CoreError::PayloadMismatch {
                kind: self.kind().to_string(),
                collection: collection.to_string(),
            })
        }
    }
}

/// A user action waiting for connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PendingCapture {
    /// Fresh UUID for availability captures, the SKU for product fetches.
    pub id: String,

    #[ts(as = "String")]
    pub ts: DateTime<Utc>,

    pub payload: CapturePayload,

    /// Flips false → true once; never reverts.
    pub synced: bool,
}

// =============================================================================
// Collections
// =============================================================================

/// Named collections of the offline queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    AvailabilityCaptures,
    ProductFetches,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::AvailabilityCaptures, Collection::ProductFetches];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::AvailabilityCaptures => "availability-captures",
            Collection::ProductFetches => "product-fetches",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Collection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "availability-captures" => Ok(Collection::AvailabilityCaptures),
            "product-fetches" => Ok(Collection::ProductFetches),
            other => Err(CoreError::UnknownCollection(other.to_string())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
