//! Reachability probe run before every flush.
//!
//! A probe answers one question: can the backend be reached right now? Any
//! 2xx from the health URL counts as yes. The probe goes through the
//! client crate's [`HttpTransport`], so it shares TLS setup with product
//! lookups, but gives up after its own shorter timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stockscan_client::HttpTransport;
use tracing::debug;
use url::Url;

use crate::error::{SyncError, SyncResult};

/// Checks whether the backend is reachable.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// `Ok(())` when reachable, [`SyncError::ProbeFailed`] otherwise.
    async fn probe(&self) -> SyncResult<()>;
}

/// Probes by issuing an unauthenticated GET against a health URL.
pub struct HttpProbe {
    transport: Arc<dyn HttpTransport>,
    url: Url,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(transport: Arc<dyn HttpTransport>, url: Url, timeout: Duration) -> Self {
        HttpProbe {
            transport,
            url,
            timeout,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Debug for HttpProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProbe")
            .field("url", &self.url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn probe(&self) -> SyncResult<()> {
        let failed = |reason: String| SyncError::ProbeFailed {
            url: self.url.to_string(),
            reason,
        };

        let response = tokio::time::timeout(self.timeout, self.transport.get(&self.url, None))
            .await
            .map_err(|_| failed(format!("no answer within {:?}", self.timeout)))?
            .map_err(|e| failed(e.to_string()))?;

        debug!(url = %self.url, status = response.status, "Probe answered");

        if (200..300).contains(&response.status) {
            Ok(())
        } else {
            Err(failed(format!("HTTP {}", response.status)))
        }
    }
}
