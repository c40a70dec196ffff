//! # Backend Wire Shapes
//!
//! Response bodies of the four backend endpoints and the product-detail
//! proxy, as far as the aggregator reads them.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Endpoint             Body                                              │
//! │  ──────────────────   ───────────────────────────────────────────────   │
//! │  Stock                StockResponse        { stockPosition: [...] }     │
//! │  PriceIntegrity       PriceIntegrityResponse { product?, prices?,       │
//! │                                              promotions?, space? }      │
//! │  StockHistory         StockHistory         { lastCountDateTime, ... }   │
//! │  OrderInfo            OrderInfoResponse    { orders: [...] }            │
//! │  ProductDetailProxy   ProductRecord        { sku, description, ... }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Backends are inconsistent about types: numbers arrive as strings, strings
//! as numbers, and arrays as `null`. Every field is optional and goes through
//! the [`lenient`] deserializers so one odd field never fails a whole body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::location::RawLocation;

// =============================================================================
// Product Record (proxy + PI-embedded)
// =============================================================================

/// A product record from the detail proxy or embedded in a price integrity
/// response.
///
/// Known fields are typed; everything else is kept in `attributes` so the
/// record can be handed on as the canonical product's attribute bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Internal SKU.
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sku: Option<String>,

    /// Older backends send the SKU as `itemNumber`, some alongside `sku`.
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_number: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub temperature: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub weight: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub walk_sequence: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub pack_definition: Vec<PackDefinition>,

    /// Every attribute not modelled above.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ProductRecord {
    /// The internal SKU, if the record carries a non-blank one. `sku` wins
    /// over `itemNumber`.
    pub fn internal_sku(&self) -> Option<&str> {
        fn non_blank(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        non_blank(&self.sku).or_else(|| non_blank(&self.item_number))
    }

    /// Pack size of the first pack definition, if positive.
    pub fn default_pack_size(&self) -> Option<f64> {
        self.pack_definition
            .first()
            .and_then(|p| p.pack_size)
            .filter(|size| *size > 0.0)
    }

    /// The whole record as a JSON object.
    pub fn to_details(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackDefinition {
    #[serde(default, deserialize_with = "lenient::number")]
    pub pack_size: Option<f64>,
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub stock_position: Vec<StockPosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPosition {
    #[serde(default, deserialize_with = "lenient::number")]
    pub qty: Option<f64>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub unit_of_measure: Option<String>,
}

// =============================================================================
// Price Integrity
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceIntegrityResponse {
    #[serde(default)]
    pub product: Option<ProductRecord>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub prices: Vec<PriceEntry>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub promotions: Vec<Promotion>,

    #[serde(default)]
    pub space: Option<Space>,
}

impl PriceIntegrityResponse {
    /// Standard-space locations, in backend order.
    pub fn standard_locations(&self) -> &[RawLocation] {
        self.space
            .as_ref()
            .and_then(|s| s.standard_space.as_ref())
            .map(|block| block.locations.as_slice())
            .unwrap_or(&[])
    }

    /// Promotional-space locations, in backend order.
    pub fn promotional_locations(&self) -> &[RawLocation] {
        self.space
            .as_ref()
            .and_then(|s| s.promotional_space.as_ref())
            .map(|block| block.locations.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    #[serde(default, deserialize_with = "lenient::number")]
    pub regular_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    #[serde(default)]
    pub marketing_attributes: Option<MarketingAttributes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingAttributes {
    #[serde(default, deserialize_with = "lenient::string")]
    pub offer_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    #[serde(default)]
    pub standard_space: Option<SpaceBlock>,

    #[serde(default)]
    pub promotional_space: Option<SpaceBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceBlock {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub locations: Vec<RawLocation>,
}

// =============================================================================
// Stock History
// =============================================================================

/// The last recorded stock movement for an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockHistory {
    #[serde(default, deserialize_with = "lenient::string")]
    pub last_count_date_time: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub inventory_action: Option<String>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub qty: Option<f64>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub created_by: Option<String>,
}

// =============================================================================
// Order Info
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfoResponse {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub orders: Vec<Order>,
}

/// One replenishment order (last, next or current) for an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, deserialize_with = "lenient::string")]
    pub order_id: Option<String>,

    /// `"last"`, `"next"` or `"current"`.
    #[serde(default, deserialize_with = "lenient::string")]
    pub order_position: Option<String>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub pack_size: Option<f64>,

    #[serde(default)]
    pub delivery: Option<Delivery>,

    #[serde(default)]
    pub lines: Option<OrderLines>,
}

impl Order {
    /// First ordered line, if any.
    pub fn first_ordered(&self) -> Option<&OrderedQuantity> {
        self.lines
            .as_ref()
            .and_then(|lines| lines.status.iter().find_map(|line| line.ordered.as_ref()))
    }

    pub fn is_position(&self, position: &str) -> bool {
        self.order_position
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(position))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    #[serde(default, deserialize_with = "lenient::string")]
    pub date_delivery_expected: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLines {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub status: Vec<OrderLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    #[serde(default)]
    pub ordered: Option<OrderedQuantity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderedQuantity {
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: Option<f64>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub pack_size: Option<f64>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub quantity_type: Option<String>,
}

// =============================================================================
// Lenient Deserializers
// =============================================================================

/// Deserializers that coerce instead of failing.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings, numbers and booleans become text; blank text and anything
    /// else become `None`.
    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Numbers and numeric strings become `f64`; anything else `None`.
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
    }

    /// `null` becomes an empty list.
    pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_record_keeps_unknown_attributes() {
        let record: ProductRecord = serde_json::from_value(json!({
            "itemNumber": 123456,
            "description": "Full Cream Milk 2L",
            "brand": "Dairy Farmers",
            "packDefinition": [{"packSize": "6"}]
        }))
        .unwrap();

        assert_eq!(record.internal_sku(), Some("123456"));
        assert_eq!(record.description.as_deref(), Some("Full Cream Milk 2L"));
        assert_eq!(record.default_pack_size(), Some(6.0));
        assert_eq!(record.attributes.get("brand"), Some(&json!("Dairy Farmers")));

        let details = record.to_details();
        assert_eq!(details["brand"], json!("Dairy Farmers"));
        assert_eq!(details["itemNumber"], json!("123456"));
    }

    #[test]
    fn test_record_with_sku_and_item_number() {
        let record: ProductRecord = serde_json::from_value(json!({
            "sku": "123456",
            "itemNumber": "654321",
            "description": "Full Cream Milk 2L"
        }))
        .unwrap();

        assert_eq!(record.internal_sku(), Some("123456"));
        assert_eq!(record.item_number.as_deref(), Some("654321"));

        let record: ProductRecord =
            serde_json::from_value(json!({"sku": " ", "itemNumber": 777})).unwrap();
        assert_eq!(record.internal_sku(), Some("777"));
    }

    #[test]
    fn test_blank_sku_is_not_a_sku() {
        let record: ProductRecord = serde_json::from_value(json!({"sku": "  "})).unwrap();
        assert_eq!(record.internal_sku(), None);
    }

    #[test]
    fn test_null_arrays_are_empty() {
        let pi: PriceIntegrityResponse =
            serde_json::from_value(json!({"prices": null, "promotions": null})).unwrap();
        assert!(pi.prices.is_empty());
        assert!(pi.promotions.is_empty());
        assert!(pi.standard_locations().is_empty());
    }

    #[test]
    fn test_stock_quantities_accept_strings() {
        let stock: StockResponse = serde_json::from_value(json!({
            "stockPosition": [{"qty": "42", "unitOfMeasure": "ea"}]
        }))
        .unwrap();
        assert_eq!(stock.stock_position[0].qty, Some(42.0));
    }

    #[test]
    fn test_order_first_ordered_line() {
        let order: Order = serde_json::from_value(json!({
            "orderPosition": "NEXT",
            "lines": {"status": [{}, {"ordered": {"quantity": 2, "packSize": 6}}]}
        }))
        .unwrap();
        assert!(order.is_position("next"));
        assert_eq!(order.first_ordered().and_then(|o| o.quantity), Some(2.0));
    }
}
