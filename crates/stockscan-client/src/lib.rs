//! # stockscan-client: Backend Request Orchestration
//!
//! Turns scanned barcodes into [`CanonicalProduct`](stockscan_core::CanonicalProduct)s
//! by talking to the product-detail proxy and the four retail endpoints.
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductAggregator      resolve_one / resolve_batch                     │
//! │        │                SKU resolution, fan-out, merge                  │
//! │        ▼                                                                │
//! │  RequestOrchestrator    fetch_json                                      │
//! │        │                bearer / no-bearer fallback, 404 → None         │
//! │        ▼                                                                │
//! │  dyn HttpTransport      one GET, status + body                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```ignore
//! let settings = ClientSettings::default();
//! let aggregator = settings.aggregator(settings.transport()?, &AuthPreferences::default())?;
//!
//! let ctx = LookupContext::new("1042").with_bearer(token);
//! let product = aggregator.resolve_one("9300633601234", &ctx).await?;
//! ```

pub mod aggregator;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod settings;

pub use aggregator::{LookupContext, ProductAggregator};
pub use endpoints::Endpoints;
pub use error::{ClientError, ClientResult, RedactedHeaders};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use orchestrator::{AuthMode, FetchOptions, RequestOrchestrator};
pub use settings::{AuthPreferences, ClientSettings};
