//! # Product Aggregator
//!
//! Resolves scanned codes into [`CanonicalProduct`]s.
//!
//! ## Per-Item Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  scanned code                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Resolve internal SKU                                                │
//! │     ├── DetailProxy(code)        no bearer, any failure ──┐            │
//! │     └── PriceIntegrity(code)  ◄───────────────────────────┘            │
//! │           │  no SKU anywhere ──► Ok(None)                               │
//! │           ▼                                                             │
//! │  2. Fan-out (concurrent, all settle before merge)                       │
//! │     ├── Stock(sku)                                                      │
//! │     ├── PriceIntegrity(sku)   reused when step 1 used it                │
//! │     ├── StockHistory(sku)                                               │
//! │     └── OrderInfo(sku)                                                  │
//! │           │  a failed source is logged and merged as absent             │
//! │           ▼                                                             │
//! │  3. merge_product ──► CanonicalProduct                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Batches
//! Every code in a batch resolves independently and concurrently. Failed and
//! unresolvable items are dropped; the output keeps input order. With
//! `debug` set, the first failing item (in input order) fails the batch.

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use stockscan_core::validation::validate_scanned_code;
use stockscan_core::wire::{OrderInfoResponse, PriceIntegrityResponse, ProductRecord, StockHistory, StockResponse};
use stockscan_core::{merge_product, AggregationSources, CanonicalProduct};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::endpoints::Endpoints;
use crate::error::{ClientError, ClientResult};
use crate::orchestrator::{FetchOptions, RequestOrchestrator};
use crate::settings::AuthPreferences;

/// Who is asking, for which store, and how loudly failures should surface.
#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    pub location_id: String,
    pub bearer: Option<String>,
    pub debug: bool,
}

impl LookupContext {
    pub fn new(location_id: impl Into<String>) -> Self {
        LookupContext {
            location_id: location_id.into(),
            ..Default::default()
        }
    }

    pub fn with_bearer(mut self, bearer: Option<String>) -> Self {
        self.bearer = bearer;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Resolves scanned codes through the proxy and the four backend endpoints.
///
/// Holds no mutable state; one instance serves any number of concurrent
/// lookups.
#[derive(Debug, Clone)]
pub struct ProductAggregator {
    orchestrator: RequestOrchestrator,
    endpoints: Endpoints,
    auth: AuthPreferences,
}

impl ProductAggregator {
    pub fn new(orchestrator: RequestOrchestrator, endpoints: Endpoints, auth: AuthPreferences) -> Self {
        ProductAggregator {
            orchestrator,
            endpoints,
            auth,
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &Url,
        prefer_bearer: bool,
        ctx: &LookupContext,
    ) -> ClientResult<Option<T>> {
        let options = FetchOptions {
            bearer: ctx.bearer.as_deref(),
            prefer_bearer,
            debug: ctx.debug,
        };
        self.orchestrator.fetch_json(url, options).await
    }

    // =========================================================================
    // SKU Resolution
    // =========================================================================

    async fn lookup_proxy(&self, code: &str, ctx: &LookupContext) -> Option<ProductRecord> {
        let url = match self.endpoints.product_detail(code) {
            Ok(url) => url,
            Err(e) => {
                debug!(code = %code, error = %e, "Proxy URL rejected, falling back");
                return None;
            }
        };

        // The proxy is same-origin: never forward the bearer.
        let options = FetchOptions {
            bearer: None,
            prefer_bearer: false,
            debug: ctx.debug,
        };

        match self.orchestrator.fetch_json::<ProductRecord>(&url, options).await {
            Ok(Some(record)) if record.internal_sku().is_some() => Some(record),
            Ok(_) => {
                debug!(code = %code, "Proxy has no SKU for code, falling back");
                None
            }
            Err(e) => {
                debug!(code = %code, error = %e, "Proxy lookup failed, falling back");
                None
            }
        }
    }

    // =========================================================================
    // Resolve One
    // =========================================================================

    /// Resolves one scanned code.
    ///
    /// ## Returns
    /// * `Ok(Some(product))` - an internal SKU was found
    /// * `Ok(None)` - neither the proxy nor PriceIntegrity knows the code
    /// * `Err(_)` - the PriceIntegrity fallback failed, or (debug only) a
    ///   fan-out source failed
    pub async fn resolve_one(
        &self,
        scanned_code: &str,
        ctx: &LookupContext,
    ) -> ClientResult<Option<CanonicalProduct>> {
        let code = validate_scanned_code(scanned_code)?;
        let location = ctx.location_id.as_str();

        // 1. Internal SKU
        let proxy_product = self.lookup_proxy(code, ctx).await;

        let (sku, resolved_pi) = match proxy_product.as_ref().and_then(ProductRecord::internal_sku) {
            Some(sku) => (sku.to_string(), None),
            None => {
                let url = self.endpoints.price_integrity(location, code)?;
                let pi: Option<PriceIntegrityResponse> =
                    self.fetch(&url, self.auth.price_integrity, ctx).await?;

                let sku = pi
                    .as_ref()
                    .and_then(|pi| pi.product.as_ref())
                    .and_then(ProductRecord::internal_sku)
                    .map(str::to_string);

                match sku {
                    Some(sku) => (sku, pi),
                    None => {
                        debug!(code = %code, "No internal SKU for code");
                        return Ok(None);
                    }
                }
            }
        };

        // 2. Fan-out
        let stock_url = self.endpoints.stock(location, &sku)?;
        let history_url = self.endpoints.stock_history(location, &sku)?;
        let orders_url = self.endpoints.order_info(location, &sku)?;
        let pi_url = self.endpoints.price_integrity(location, &sku)?;

        let price_integrity = async {
            match resolved_pi {
                Some(pi) => Ok(Some(pi)),
                None => self.fetch(&pi_url, self.auth.price_integrity, ctx).await,
            }
        };

        let (stock, price_integrity, stock_history, order_info) = tokio::join!(
            self.fetch::<StockResponse>(&stock_url, self.auth.stock, ctx),
            price_integrity,
            self.fetch::<StockHistory>(&history_url, self.auth.stock_history, ctx),
            self.fetch::<OrderInfoResponse>(&orders_url, self.auth.order_info, ctx),
        );

        // 3. Merge
        let sources = AggregationSources {
            proxy_product,
            price_integrity: tolerate(&sku, "price-integrity", price_integrity, ctx.debug)?,
            stock: tolerate(&sku, "stock", stock, ctx.debug)?,
            stock_history: tolerate(&sku, "stock-history", stock_history, ctx.debug)?,
            order_info: tolerate(&sku, "order-info", order_info, ctx.debug)?,
        };

        Ok(Some(merge_product(code, &sku, sources)))
    }

    // =========================================================================
    // Resolve Batch
    // =========================================================================

    /// Resolves every code concurrently.
    ///
    /// Cancelling `cancel` drops all in-flight requests and returns
    /// [`ClientError::Cancelled`].
    pub async fn resolve_batch(
        &self,
        codes: &[String],
        ctx: &LookupContext,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<CanonicalProduct>> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let lookups = join_all(codes.iter().map(|code| self.resolve_one(code, ctx)));

        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(count = codes.len(), "Batch cancelled");
                return Err(ClientError::Cancelled);
            }
            results = lookups => results,
        };

        let mut products = Vec::with_capacity(results.len());
        for (code, result) in codes.iter().zip(results) {
            match result {
                Ok(Some(product)) => products.push(product),
                Ok(None) => debug!(code = %code, "Dropping unresolvable code"),
                Err(e) if ctx.debug => return Err(e),
                Err(e) => warn!(code = %code, error = %e, "Dropping failed lookup"),
            }
        }

        debug!(requested = codes.len(), resolved = products.len(), "Batch resolved");
        Ok(products)
    }
}

/// A failed fan-out source is merged as absent unless in debug mode.
fn tolerate<T>(
    sku: &str,
    source: &'static str,
    result: ClientResult<Option<T>>,
    debug: bool,
) -> ClientResult<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if debug => Err(e),
        Err(e) => {
            warn!(sku = %sku, source, error = %e, "Partial aggregation, source ignored");
            Ok(None)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::stub::StubTransport;
    use std::sync::Arc;
    use std::time::Duration;

    const API: &str = "https://api.example.com/v1";
    const PROXY: &str = "https://app.example.com";

    fn api(path: &str) -> String {
        format!("{API}/{path}")
    }

    fn proxy(sku: &str) -> String {
        format!("{PROXY}/api/products/{sku}")
    }

    fn aggregator(stub: StubTransport) -> (ProductAggregator, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        let aggregator = ProductAggregator::new(
            RequestOrchestrator::new(stub.clone()),
            Endpoints::new(API, PROXY).unwrap(),
            AuthPreferences::default(),
        );
        (aggregator, stub)
    }

    fn ctx() -> LookupContext {
        LookupContext::new("1042").with_bearer(Some("tok".to_string()))
    }

    /// Proxy resolves 9300633601234 to SKU 123456 with full backend data.
    fn happy_stub() -> StubTransport {
        StubTransport::new()
            .on(
                &proxy("9300633601234"),
                200,
                r#"{"sku": "123456", "description": "Full Cream Milk 2L"}"#,
            )
            .on(
                &api("stock/1042/123456"),
                200,
                r#"{"stockPosition": [{"qty": 42, "unitOfMeasure": "ea"}]}"#,
            )
            .on(
                &api("price-integrity/1042/123456"),
                200,
                r#"{"prices": [{"regularPrice": 1.45}],
                    "space": {"standardSpace": {"locations": [
                        {"aisle": "10", "bayNumber": "L3", "shelfNumber": "2"}]}}}"#,
            )
            .on(
                &api("orders/1042/123456?orders=last,next,current"),
                200,
                r#"{"orders": [{"orderPosition": "next",
                    "delivery": {"dateDeliveryExpected": "2024-05-01"},
                    "lines": {"status": [{"ordered": {"quantity": 2, "packSize": 6}}]}}]}"#,
            )
    }

    #[tokio::test]
    async fn test_resolve_one_merges_all_sources() {
        let (agg, _stub) = aggregator(happy_stub());

        let product = agg.resolve_one("9300633601234", &ctx()).await.unwrap().unwrap();
        assert_eq!(product.sku, "123456");
        assert_eq!(product.scanned_sku, "9300633601234");
        assert_eq!(product.name, "Full Cream Milk 2L");
        assert_eq!(product.stock_quantity, 42.0);
        assert_eq!(product.location.standard, "Aisle 10, Left bay 3, shelf 2");
        assert_eq!(product.price.regular, Some(1.45));

        let delivery = product.delivery_info.unwrap();
        assert_eq!(delivery.total_units, 12.0);
        assert_eq!(delivery.order_position, stockscan_core::OrderPosition::Next);

        // StockHistory answered 404
        assert!(product.last_stock_change.is_none());
    }

    #[tokio::test]
    async fn test_proxy_never_receives_bearer() {
        let (agg, stub) = aggregator(happy_stub());

        agg.resolve_one("9300633601234", &ctx()).await.unwrap();
        let proxy_calls = stub.calls_to(&proxy("9300633601234"));
        assert_eq!(proxy_calls.len(), 1);
        assert!(!proxy_calls[0].bearer);
    }

    #[tokio::test]
    async fn test_unresolvable_code_yields_none() {
        let (agg, _stub) = aggregator(StubTransport::new());

        assert!(agg.resolve_one("000000", &ctx()).await.unwrap().is_none());

        let batch = agg
            .resolve_batch(&["000000".to_string()], &ctx(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_price_integrity_fallback_is_reused() {
        let (agg, stub) = aggregator(
            StubTransport::new()
                .fail(&proxy("5000112637922"))
                .on(
                    &api("price-integrity/1042/5000112637922"),
                    200,
                    r#"{"product": {"itemNumber": "777", "description": "COLA 1.25L"},
                        "prices": [{"regularPrice": "2.10"}]}"#,
                ),
        );

        let product = agg.resolve_one("5000112637922", &ctx()).await.unwrap().unwrap();
        assert_eq!(product.sku, "777");
        assert_eq!(product.name, "COLA 1.25L");
        assert_eq!(product.price.regular, Some(2.10));
        assert_eq!(product.stock_quantity, 0.0);
        assert!(stub.calls_to(&api("price-integrity/1042/777")).is_empty());
    }

    #[tokio::test]
    async fn test_price_integrity_lookup_error_fails_item() {
        let (agg, _stub) = aggregator(
            StubTransport::new().on(&api("price-integrity/1042/111"), 500, "down"),
        );

        let err = agg.resolve_one("111", &ctx()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_failed_source_is_tolerated() {
        let (agg, _stub) = aggregator(happy_stub().on(&api("stock/1042/123456"), 503, ""));

        let product = agg.resolve_one("9300633601234", &ctx()).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 0.0);
        assert_eq!(product.price.regular, Some(1.45));
    }

    #[tokio::test]
    async fn test_failed_source_propagates_in_debug() {
        let (agg, _stub) = aggregator(happy_stub().on(&api("stock/1042/123456"), 503, ""));

        let err = agg
            .resolve_one("9300633601234", &ctx().with_debug(true))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_drops_failures() {
        let stub = happy_stub()
            .on(&proxy("222"), 200, r#"{"sku": "222"}"#)
            .on(&api("price-integrity/1042/333"), 500, "");
        let (agg, _stub) = aggregator(stub);

        let codes: Vec<String> = ["222", "333", "unknown", "9300633601234"]
            .iter()
            .map(|c| c.to_string())
            .collect();

        let products = agg
            .resolve_batch(&codes, &ctx(), &CancellationToken::new())
            .await
            .unwrap();
        let skus: Vec<&str> = products.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["222", "123456"]);
    }

    #[tokio::test]
    async fn test_batch_rethrows_in_debug() {
        let (agg, _stub) =
            aggregator(StubTransport::new().on(&api("price-integrity/1042/333"), 500, ""));

        let codes = vec!["unknown".to_string(), "333".to_string()];
        let err = agg
            .resolve_batch(&codes, &ctx().with_debug(true), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_batch_cancellation() {
        let (agg, _stub) = aggregator(
            StubTransport::new().hang(&api("price-integrity/1042/444")),
        );
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = agg
            .resolve_batch(&["444".to_string()], &ctx(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }

    #[tokio::test]
    async fn test_invalid_code_is_rejected() {
        let (agg, stub) = aggregator(StubTransport::new());

        let err = agg.resolve_one("  ", &ctx()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(stub.calls().is_empty());
    }
}
