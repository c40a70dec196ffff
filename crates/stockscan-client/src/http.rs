//! # HTTP Transport
//!
//! The one seam through which every backend GET goes.
//!
//! ```text
//! RequestOrchestrator ──► dyn HttpTransport ──┬──► ReqwestTransport (production)
//!                                             └──► StubTransport    (tests)
//! ```
//!
//! A transport only moves bytes: it reports whatever status the server gave
//! and never interprets it. Auth fallback and status classification live in
//! the orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// A raw response: status and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }
}

/// Issues a single GET.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `GET url` with `Authorization: Bearer <bearer>` when a bearer is
    /// given and no Authorization header otherwise.
    ///
    /// Errors only when no response was received.
    async fn get(&self, url: &Url, bearer: Option<&str>) -> ClientResult<HttpResponse>;
}

/// Production transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url, bearer: Option<&str>) -> ClientResult<HttpResponse> {
        let mut req = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json");
        if let Some(token) = bearer {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

// =============================================================================
// Test Stub
// =============================================================================

/// Scripted transport for unit tests.
#[cfg(test)]
pub(crate) mod stub {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// What a route does.
    #[derive(Debug, Clone)]
    pub enum Reply {
        Respond(HttpResponse),
        Fail,
        Hang,
    }

    #[derive(Debug, Default, Clone)]
    struct Route {
        any: Option<Reply>,
        with_bearer: Option<Reply>,
        without_bearer: Option<Reply>,
    }

    /// A recorded request: URL and whether a bearer was sent.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Call {
        pub url: String,
        pub bearer: bool,
    }

    /// Answers by exact URL; unknown URLs get a 404.
    #[derive(Debug, Default)]
    pub struct StubTransport {
        routes: Mutex<HashMap<String, Route>>,
        calls: Mutex<Vec<Call>>,
    }

    impl StubTransport {
        pub fn new() -> Self {
            Self::default()
        }

        fn route(&self, url: &str, apply: impl FnOnce(&mut Route)) {
            let mut routes = self.routes.lock().unwrap();
            apply(routes.entry(url.to_string()).or_default());
        }

        /// Same reply regardless of auth mode.
        pub fn on(self, url: &str, status: u16, body: &str) -> Self {
            self.route(url, |r| r.any = Some(Reply::Respond(HttpResponse::new(status, body))));
            self
        }

        /// Reply only when a bearer is (or is not) sent.
        pub fn on_auth(self, url: &str, bearer: bool, status: u16, body: &str) -> Self {
            let reply = Some(Reply::Respond(HttpResponse::new(status, body)));
            self.route(url, |r| {
                if bearer {
                    r.with_bearer = reply;
                } else {
                    r.without_bearer = reply;
                }
            });
            self
        }

        pub fn fail(self, url: &str) -> Self {
            self.route(url, |r| r.any = Some(Reply::Fail));
            self
        }

        pub fn hang(self, url: &str) -> Self {
            self.route(url, |r| r.any = Some(Reply::Hang));
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_to(&self, url: &str) -> Vec<Call> {
            self.calls().into_iter().filter(|c| c.url == url).collect()
        }
    }

    #[async_trait]
    impl HttpTransport for StubTransport {
        async fn get(&self, url: &Url, bearer: Option<&str>) -> ClientResult<HttpResponse> {
            let key = url.to_string();
            self.calls.lock().unwrap().push(Call {
                url: key.clone(),
                bearer: bearer.is_some(),
            });

            let reply = {
                let routes = self.routes.lock().unwrap();
                routes.get(&key).and_then(|route| {
                    let specific = if bearer.is_some() {
                        &route.with_bearer
                    } else {
                        &route.without_bearer
                    };
                    specific.clone().or_else(|| route.any.clone())
                })
            };

            match reply {
                Some(Reply::Respond(response)) => Ok(response),
                Some(Reply::Fail) => Err(ClientError::Transport {
                    url: key,
                    message: "connection refused".to_string(),
                }),
                Some(Reply::Hang) => std::future::pending().await,
                None => Ok(HttpResponse::new(404, "")),
            }
        }
    }
}
