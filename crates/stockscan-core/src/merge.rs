//! # Product Merge
//!
//! Folds the responses of the product-detail proxy and the four backend
//! endpoints into one [`CanonicalProduct`].
//!
//! ## Source Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field              Sources (first non-empty wins)                      │
//! │  ─────────────────  ──────────────────────────────────────────────────  │
//! │  name / text attrs  proxy product ──► PI product ──► ""                 │
//! │  price              PI prices[0] / PI promotions[0]                     │
//! │  stockQuantity      stockPosition[0].qty ──► 0                          │
//! │  location           PI space, formatted                                 │
//! │  deliveryInfo       "next" order ──► "last" order                       │
//! │  packSize           line ──► order ──► packDefinition[0] ──► 1          │
//! │  productDetails     proxy record ──► PI record ──► {}                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every source is optional. A missing source is either a 404 or a fan-out
//! call that failed and was tolerated by the caller.

use serde_json::{Map, Value};

use crate::location;
use crate::types::{CanonicalProduct, DeliveryInfo, OrderPosition, ProductLocation, ProductPrice};
use crate::wire::{
    Order, OrderInfoResponse, PriceIntegrityResponse, ProductRecord, StockHistory, StockResponse,
};

/// Everything the aggregator managed to fetch for one SKU.
#[derive(Debug, Clone, Default)]
pub struct AggregationSources {
    pub proxy_product: Option<ProductRecord>,
    pub price_integrity: Option<PriceIntegrityResponse>,
    pub stock: Option<StockResponse>,
    pub stock_history: Option<StockHistory>,
    pub order_info: Option<OrderInfoResponse>,
}

impl AggregationSources {
    fn pi_product(&self) -> Option<&ProductRecord> {
        self.price_integrity.as_ref().and_then(|pi| pi.product.as_ref())
    }

    /// Product records in precedence order.
    fn products(&self) -> impl Iterator<Item = &ProductRecord> {
        self.proxy_product.iter().chain(self.pi_product())
    }

    /// First non-blank value of a text attribute across product records.
    fn text(&self, field: impl Fn(&ProductRecord) -> Option<&String>) -> String {
        self.products()
            .filter_map(|p| field(p))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// Builds the canonical record for `sku`.
pub fn merge_product(scanned_code: &str, sku: &str, sources: AggregationSources) -> CanonicalProduct {
    let price = merge_price(sources.price_integrity.as_ref());
    let location = merge_location(sources.price_integrity.as_ref());

    let first_position = sources
        .stock
        .as_ref()
        .and_then(|stock| stock.stock_position.first());
    let stock_quantity = first_position.and_then(|p| p.qty).unwrap_or(0.0);
    let stock_unit = first_position
        .and_then(|p| p.unit_of_measure.clone())
        .unwrap_or_default();

    let default_pack_size = sources.products().find_map(ProductRecord::default_pack_size);
    let orders = sources.order_info.as_ref().map(|info| info.orders.as_slice());
    let delivery_info = orders.and_then(|orders| select_delivery(orders, default_pack_size));

    let product_details = sources
        .products()
        .next()
        .map(ProductRecord::to_details)
        .unwrap_or_else(|| Value::Object(Map::new()));

    CanonicalProduct {
        sku: sku.to_string(),
        scanned_sku: scanned_code.to_string(),
        name: sources.text(|p| p.description.as_ref()),
        price,
        stock_quantity,
        stock_unit,
        location,
        temperature: sources.text(|p| p.temperature.as_ref()),
        weight: sources.text(|p| p.weight.as_ref()),
        status: sources.text(|p| p.status.as_ref()),
        image_url: sources.text(|p| p.image_url.as_ref()),
        walk_sequence: sources.text(|p| p.walk_sequence.as_ref()),
        delivery_info,
        all_orders: orders.map(<[Order]>::to_vec),
        last_stock_change: sources.stock_history,
        product_details,
    }
}

fn merge_price(pi: Option<&PriceIntegrityResponse>) -> ProductPrice {
    let Some(pi) = pi else {
        return ProductPrice::default();
    };

    ProductPrice {
        regular: pi.prices.first().and_then(|p| p.regular_price),
        promotional: pi
            .promotions
            .first()
            .and_then(|p| p.marketing_attributes.as_ref())
            .and_then(|m| m.offer_value.clone()),
    }
}

fn merge_location(pi: Option<&PriceIntegrityResponse>) -> ProductLocation {
    let Some(pi) = pi else {
        return ProductLocation::default();
    };

    let standard = pi.standard_locations();
    let formatted = |loc: Option<&location::RawLocation>| loc.map(location::format).unwrap_or_default();

    ProductLocation {
        standard: formatted(standard.first()),
        secondary: formatted(standard.get(1)),
        promotional: formatted(pi.promotional_locations().first()),
    }
}

// =============================================================================
// Delivery Selection
// =============================================================================

/// Picks the "next" order, else the "last" one, and computes delivered units.
///
/// Returns `None` when neither order exists.
pub fn select_delivery(orders: &[Order], default_pack_size: Option<f64>) -> Option<DeliveryInfo> {
    let (order, position) = orders
        .iter()
        .find(|o| o.is_position("next"))
        .map(|o| (o, OrderPosition::Next))
        .or_else(|| {
            orders
                .iter()
                .find(|o| o.is_position("last"))
                .map(|o| (o, OrderPosition::Last))
        })?;

    let ordered = order.first_ordered();
    let quantity = ordered.and_then(|line| line.quantity).unwrap_or(0.0);
    let pack_size = resolve_pack_size(
        ordered.and_then(|line| line.pack_size),
        order.pack_size,
        default_pack_size,
    );

    Some(DeliveryInfo {
        expected_date: order
            .delivery
            .as_ref()
            .and_then(|d| d.date_delivery_expected.clone())
            .unwrap_or_default(),
        quantity,
        total_units: quantity * pack_size,
        quantity_type: ordered
            .and_then(|line| line.quantity_type.clone())
            .unwrap_or_default(),
        order_position: position,
    })
}

/// First positive pack size of line, order and product default; else 1.
pub fn resolve_pack_size(line: Option<f64>, order: Option<f64>, product: Option<f64>) -> f64 {
    [line, order, product]
        .into_iter()
        .flatten()
        .find(|size| *size > 0.0)
        .unwrap_or(1.0)
}

// =============================================================================
// Unit Tests
// =============================================================================
