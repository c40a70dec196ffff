//! # stockscan Scanner
//!
//! Application root: owns the database handle, the HTTP transport, the
//! product aggregator and the sync coordinator, and wires them together.
//!
//! ## Module Organization
//! ```text
//! stockscan_scanner/
//! ├── lib.rs     ◄─── App wiring, tracing, command dispatch
//! ├── cli.rs     ◄─── clap arguments
//! └── error.rs   ◄─── AppError + exit codes
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing          EnvFilter, RUST_LOG overrides                 │
//! │  2. StoreOpsConfig::load  defaults → stockscan.toml → STOCKSCAN_*       │
//! │  3. Database::new         SQLite (WAL) + migrations                     │
//! │  4. transport             reqwest, shared by aggregator and probe       │
//! │  5. coordinator.mount     evict stale captures, flush if online         │
//! │  6. command               lookup / capture / sync / status              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

pub mod cli;
pub mod error;

use std::sync::Arc;

use serde::Serialize;
use stockscan_client::{HttpTransport, LookupContext, ProductAggregator};
use stockscan_core::{AvailabilityCapture, CanonicalProduct, Collection, PendingCapture, ProductFetch};
use stockscan_db::{Database, DbConfig};
use stockscan_sync::{
    FlushReport, HttpProbe, ReachabilityProbe, StoreOpsConfig, SyncCoordinator, SyncError,
    SyncStatus,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use error::AppResult;

/// Initializes the tracing subscriber.
///
/// Default filter: `info,stockscan=debug,sqlx=warn`; `RUST_LOG` overrides.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockscan=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// App
// =============================================================================

/// Result of a lookup: resolved products, or the fetches queued instead.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", content = "items", rename_all = "camelCase")]
pub enum LookupOutcome {
    Resolved(Vec<CanonicalProduct>),
    Queued(Vec<PendingCapture>),
}

pub struct App {
    config: StoreOpsConfig,
    db: Database,
    aggregator: ProductAggregator,
    probe: Arc<dyn ReachabilityProbe>,
    coordinator: Arc<SyncCoordinator>,
}

impl App {
    /// Opens the queue database and builds the reqwest transport.
    pub async fn open(config: StoreOpsConfig) -> AppResult<Self> {
        let path = config.database_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::new(DbConfig::new(path)).await?;
        let transport = config.api.transport()?;
        Self::with_parts(config, db, transport)
    }

    /// Wires an app over an existing database and transport.
    pub fn with_parts(
        config: StoreOpsConfig,
        db: Database,
        transport: Arc<dyn HttpTransport>,
    ) -> AppResult<Self> {
        let aggregator = config.api.aggregator(transport.clone(), &config.auth)?;
        let probe: Arc<dyn ReachabilityProbe> = Arc::new(HttpProbe::new(
            transport,
            config.probe_url()?,
            config.sync.probe_timeout(),
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            db.clone(),
            probe.clone(),
            config.sync.clone(),
        ));

        Ok(App {
            config,
            db,
            aggregator,
            probe,
            coordinator,
        })
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    fn lookup_context(&self) -> LookupContext {
        LookupContext::new(self.config.location_id())
            .with_bearer(self.config.auth.bearer_token.clone())
            .with_debug(self.config.api.debug)
    }

    /// Reads connectivity and mounts the coordinator. Returns whether the
    /// backend is reachable.
    pub async fn start(&self, force_offline: bool, cancel: &CancellationToken) -> AppResult<bool> {
        let online = !force_offline && self.probe.probe().await.is_ok();

        match self.coordinator.mount(online, cancel).await {
            Ok(Some(report)) if report.synced > 0 => {
                info!(synced = report.synced, "Queued captures reconciled")
            }
            Ok(_) => {}
            Err(e) if e.is_probe_failure() => warn!(error = %e, "Backend went away during mount"),
            Err(e) => return Err(e.into()),
        }

        Ok(online)
    }

    /// Resolves `codes` when online; otherwise queues a product fetch for
    /// each.
    pub async fn lookup(
        &self,
        codes: &[String],
        online: bool,
        cancel: &CancellationToken,
    ) -> AppResult<LookupOutcome> {
        if online {
            let products = self
                .aggregator
                .resolve_batch(codes, &self.lookup_context(), cancel)
                .await?;
            return Ok(LookupOutcome::Resolved(products));
        }

        let queue = self.db.offline_queue();
        let mut queued = Vec::with_capacity(codes.len());
        for code in codes {
            let fetch = ProductFetch {
                sku: code.clone(),
                location_id: self.config.location_id().to_string(),
                scanned_code: Some(code.clone()),
            };
            queued.push(queue.enqueue_product_fetch(fetch).await?);
        }

        info!(count = queued.len(), "Offline, product fetches queued");
        Ok(LookupOutcome::Queued(queued))
    }

    /// Queues an availability capture and flushes when online.
    pub async fn capture(
        &self,
        capture: AvailabilityCapture,
        online: bool,
        cancel: &CancellationToken,
    ) -> AppResult<PendingCapture> {
        let queued = self.db.offline_queue().enqueue_availability_capture(capture).await?;

        if online {
            match self.coordinator.flush(cancel).await {
                Ok(_) => {}
                Err(e) if e.is_probe_failure() => warn!(error = %e, "Capture stays queued"),
                Err(e) => return Err(e.into()),
            }
        }

        Ok(self
            .db
            .offline_queue()
            .get(Collection::AvailabilityCaptures, &queued.id)
            .await?
            .unwrap_or(queued))
    }

    /// Mounts the coordinator, which flushes when online.
    pub async fn sync(
        &self,
        force_offline: bool,
        cancel: &CancellationToken,
    ) -> AppResult<Option<FlushReport>> {
        Ok(self.coordinator.mount(!force_offline, cancel).await?)
    }

    pub async fn status(&self) -> AppResult<SyncStatus> {
        Ok(self.coordinator.status().await?)
    }
}

// =============================================================================
// Command Dispatch
// =============================================================================

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs one scanner command. Ctrl+C cancels in-flight lookups and flushes.
pub async fn run(cli: Cli) -> AppResult<()> {
    let config = StoreOpsConfig::load(cli.config.clone())?;
    info!(location_id = %config.location_id(), "Starting stockscan");

    let app = App::open(config).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Command::Lookup { codes } => {
            let online = app.start(cli.offline, &cancel).await?;
            print_json(&app.lookup(&codes, online, &cancel).await?)?;
        }
        Command::Capture {
            sku,
            status,
            quantity,
            note,
        } => {
            let online = app.start(cli.offline, &cancel).await?;
            let capture = AvailabilityCapture {
                sku,
                location_id: app.config.location_id().to_string(),
                status: status.into(),
                quantity,
                note,
            };
            print_json(&app.capture(capture, online, &cancel).await?)?;
        }
        Command::Sync => {
            let report = app.sync(cli.offline, &cancel).await;
            if let Err(error::AppError::Sync(SyncError::ProbeFailed { .. })) = &report {
                print_json(&app.status().await?)?;
            }
            if let Some(report) = report? {
                print_json(&report)?;
            }
        }
        Command::Status => {
            app.start(cli.offline, &cancel).await?;
            print_json(&app.status().await?)?;
        }
    }

    app.db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stockscan_client::{ClientError, ClientResult, HttpResponse};
    use stockscan_core::AvailabilityStatus;
    use url::Url;

    /// Health URL answers 200 when `reachable`; everything else is 404.
    struct FixedBackend {
        reachable: bool,
    }

    #[async_trait]
    impl HttpTransport for FixedBackend {
        async fn get(&self, url: &Url, _bearer: Option<&str>) -> ClientResult<HttpResponse> {
            if !self.reachable {
                return Err(ClientError::Transport {
                    url: url.to_string(),
                    message: "network unreachable".to_string(),
                });
            }
            if url.path().ends_with("/health") {
                Ok(HttpResponse::new(200, "{}"))
            } else {
                Ok(HttpResponse::new(404, ""))
            }
        }
    }

    async fn app(reachable: bool) -> App {
        let mut config = StoreOpsConfig::default();
        config.store.location_id = "1042".to_string();
        config.api.base_url = "https://api.example.com/v1".to_string();
        config.sync.probe_url = Some("https://api.example.com/health".to_string());

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        App::with_parts(config, db, Arc::new(FixedBackend { reachable })).unwrap()
    }

    fn capture() -> AvailabilityCapture {
        AvailabilityCapture {
            sku: "123456".to_string(),
            location_id: "1042".to_string(),
            status: AvailabilityStatus::Unavailable,
            quantity: None,
            note: Some("gap on shelf".to_string()),
        }
    }

    #[tokio::test]
    async fn test_offline_lookup_queues_fetches() {
        let app = app(false).await;
        let cancel = CancellationToken::new();

        let online = app.start(false, &cancel).await.unwrap();
        assert!(!online);

        let codes = vec!["9300633601234".to_string(), "9300633601234".to_string()];
        match app.lookup(&codes, online, &cancel).await.unwrap() {
            LookupOutcome::Queued(queued) => assert_eq!(queued.len(), 2),
            other => panic!("unexpected outcome: {other:?}"),
        }

        // Same SKU twice collapses to one record
        assert_eq!(app.status().await.unwrap().pending_count, 1);
    }

    #[tokio::test]
    async fn test_offline_lookup_queues_gs1_code() {
        let app = app(false).await;
        let cancel = CancellationToken::new();

        let codes = vec!["(01)09300633601234".to_string()];
        match app.lookup(&codes, false, &cancel).await.unwrap() {
            LookupOutcome::Queued(queued) => {
                assert_eq!(queued.len(), 1);
                assert_eq!(queued[0].id, "(01)09300633601234");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_online_lookup_drops_unknown_codes() {
        let app = app(true).await;
        let cancel = CancellationToken::new();

        let online = app.start(false, &cancel).await.unwrap();
        assert!(online);

        match app.lookup(&["000000".to_string()], online, &cancel).await.unwrap() {
            LookupOutcome::Resolved(products) => assert!(products.is_empty()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_capture_flushes_when_online() {
        let app = app(true).await;
        let cancel = CancellationToken::new();

        let stored = app.capture(capture(), true, &cancel).await.unwrap();
        assert!(stored.synced);
        assert!(app.coordinator().last_sync().await.is_some());
    }

    #[tokio::test]
    async fn test_capture_stays_queued_when_offline() {
        let app = app(false).await;
        let cancel = CancellationToken::new();

        let stored = app.capture(capture(), false, &cancel).await.unwrap();
        assert!(!stored.synced);

        let err = app.sync(false, &cancel).await.unwrap_err();
        assert!(matches!(err, error::AppError::Sync(SyncError::ProbeFailed { .. })));
        assert_eq!(app.status().await.unwrap().pending_count, 1);
    }
}
