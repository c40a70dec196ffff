//! # Request Orchestrator
//!
//! One JSON GET under uncertain authentication.
//!
//! ## Attempt State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐  401/403   ┌──────────┐  401/403   ┌───────────┐         │
//! │   │ Primary │ ─────────► │ Fallback │ ─────────► │ Exhausted │──► Err  │
//! │   └────┬────┘            └────┬─────┘            └───────────┘         │
//! │        │                      │                                         │
//! │        │ 2xx / 404 / other    │ 2xx / 404 / other                       │
//! │        ▼                      ▼                                         │
//! │   ┌─────────────────────────────────┐                                   │
//! │   │ Settled: Ok(Some) | Ok(None)    │                                   │
//! │   │          | Err(Http)            │                                   │
//! │   └─────────────────────────────────┘                                   │
//! │                                                                         │
//! │  prefer_bearer = true   Primary = with bearer,    Fallback = without    │
//! │  prefer_bearer = false  Primary = without bearer, Fallback = with       │
//! │  no bearer token        Primary = without bearer, no Fallback           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only 401/403 moves to the next attempt. Anything else settles the
//! request: 404 is benign absence, any other non-2xx is a hard error and the
//! alternate auth mode is never tried.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult, RedactedHeaders};
use crate::http::{HttpResponse, HttpTransport};

/// Value reported in place of the bearer token.
pub const REDACTED_BEARER: &str = "Bearer ***";

// =============================================================================
// State Machine
// =============================================================================

/// Whether an attempt carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    WithBearer,
    WithoutBearer,
}

impl AuthMode {
    fn other(self) -> Self {
        match self {
            AuthMode::WithBearer => AuthMode::WithoutBearer,
            AuthMode::WithoutBearer => AuthMode::WithBearer,
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::WithBearer => write!(f, "bearer"),
            AuthMode::WithoutBearer => write!(f, "anonymous"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Primary,
    Fallback,
    Settled,
    Exhausted,
}

/// Classification of one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    NotFound,
    AuthRejected,
    Fatal,
}

impl AttemptOutcome {
    pub fn classify(status: u16) -> Self {
        match status {
            200..=299 => AttemptOutcome::Success,
            404 => AttemptOutcome::NotFound,
            401 | 403 => AttemptOutcome::AuthRejected,
            _ => AttemptOutcome::Fatal,
        }
    }
}

/// The transition table.
pub fn transition(state: AttemptState, outcome: AttemptOutcome) -> AttemptState {
    use AttemptOutcome::*;
    use AttemptState::*;

    match (state, outcome) {
        (Primary, AuthRejected) => Fallback,
        (Fallback, AuthRejected) => Exhausted,
        (Primary | Fallback, Success | NotFound | Fatal) => Settled,
        (terminal @ (Settled | Exhausted), _) => terminal,
    }
}

/// The auth modes to try, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPlan {
    primary: AuthMode,
    fallback: Option<AuthMode>,
}

impl AttemptPlan {
    pub fn new(has_bearer: bool, prefer_bearer: bool) -> Self {
        if !has_bearer {
            // Both attempts would be the same anonymous request.
            return AttemptPlan {
                primary: AuthMode::WithoutBearer,
                fallback: None,
            };
        }

        let primary = if prefer_bearer {
            AuthMode::WithBearer
        } else {
            AuthMode::WithoutBearer
        };
        AttemptPlan {
            primary,
            fallback: Some(primary.other()),
        }
    }

    /// Auth mode for `state`, or `None` when there is nothing left to try.
    pub fn mode(&self, state: AttemptState) -> Option<AuthMode> {
        match state {
            AttemptState::Primary => Some(self.primary),
            AttemptState::Fallback => self.fallback,
            AttemptState::Settled | AttemptState::Exhausted => None,
        }
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Per-request options.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions<'a> {
    pub bearer: Option<&'a str>,
    pub prefer_bearer: bool,
    /// Capture response bodies in errors.
    pub debug: bool,
}

/// Issues JSON GETs with the two-attempt bearer strategy.
#[derive(Clone)]
pub struct RequestOrchestrator {
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for RequestOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOrchestrator").finish_non_exhaustive()
    }
}

impl RequestOrchestrator {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        RequestOrchestrator { transport }
    }

    /// Fetches `url` and decodes the body as `T`.
    ///
    /// ## Returns
    /// * `Ok(Some(T))` - a 2xx response
    /// * `Ok(None)` - a 404 on any attempt
    /// * `Err(ClientError::Http)` - any other non-2xx, or 401/403 once every
    ///   auth mode was rejected (reported with the last response)
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        options: FetchOptions<'_>,
    ) -> ClientResult<Option<T>> {
        let bearer = options.bearer.filter(|b| !b.is_empty());
        let plan = AttemptPlan::new(bearer.is_some(), options.prefer_bearer);

        let mut state = AttemptState::Primary;
        let mut mode = plan.primary;

        loop {
            let token = match mode {
                AuthMode::WithBearer => bearer,
                AuthMode::WithoutBearer => None,
            };
            let response = self.transport.get(url, token).await?;
            let outcome = AttemptOutcome::classify(response.status);

            debug!(url = %url, auth = %mode, status = response.status, ?outcome, "Attempt");

            state = transition(state, outcome);

            match outcome {
                AttemptOutcome::Success => return decode(url, &response).map(Some),
                AttemptOutcome::NotFound => return Ok(None),
                AttemptOutcome::Fatal => {
                    warn!(url = %url, status = response.status, "Request failed");
                    return Err(http_error(url, mode, response, options.debug));
                }
                AttemptOutcome::AuthRejected => match plan.mode(state) {
                    Some(next) => {
                        debug!(url = %url, from = %mode, to = %next, "Auth rejected, falling through");
                        mode = next;
                    }
                    None => {
                        warn!(url = %url, status = response.status, "Every auth mode rejected");
                        return Err(http_error(url, mode, response, options.debug));
                    }
                },
            }
        }
    }
}

fn decode<T: DeserializeOwned>(url: &Url, response: &HttpResponse) -> ClientResult<T> {
    serde_json::from_str(&response.body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Headers the attempt was meant to carry, bearer redacted.
pub fn intended_headers(mode: AuthMode) -> RedactedHeaders {
    let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
    if mode == AuthMode::WithBearer {
        headers.push(("Authorization".to_string(), REDACTED_BEARER.to_string()));
    }
    RedactedHeaders(headers)
}

fn http_error(url: &Url, mode: AuthMode, response: HttpResponse, debug: bool) -> ClientError {
    ClientError::Http {
        status: response.status,
        url: url.to_string(),
        headers: intended_headers(mode),
        body: debug.then_some(response.body),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::stub::{Call, StubTransport};
    use serde_json::Value;

    const URL: &str = "https://api.example.com/stock/1042/123456";

    fn orchestrator(stub: StubTransport) -> (RequestOrchestrator, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        (RequestOrchestrator::new(stub.clone()), stub)
    }

    fn url() -> Url {
        Url::parse(URL).unwrap()
    }

    fn with_bearer(prefer_bearer: bool) -> FetchOptions<'static> {
        FetchOptions {
            bearer: Some("tok-123"),
            prefer_bearer,
            debug: false,
        }
    }

    fn call(bearer: bool) -> Call {
        Call {
            url: URL.to_string(),
            bearer,
        }
    }

    #[test]
    fn test_transition_table() {
        use AttemptOutcome::*;
        use AttemptState::*;

        assert_eq!(transition(Primary, AuthRejected), Fallback);
        assert_eq!(transition(Fallback, AuthRejected), Exhausted);
        for outcome in [Success, NotFound, Fatal] {
            assert_eq!(transition(Primary, outcome), Settled);
            assert_eq!(transition(Fallback, outcome), Settled);
        }
        assert_eq!(transition(Exhausted, Success), Exhausted);
    }

    #[test]
    fn test_plan_order() {
        let plan = AttemptPlan::new(true, true);
        assert_eq!(plan.mode(AttemptState::Primary), Some(AuthMode::WithBearer));
        assert_eq!(plan.mode(AttemptState::Fallback), Some(AuthMode::WithoutBearer));

        let plan = AttemptPlan::new(true, false);
        assert_eq!(plan.mode(AttemptState::Primary), Some(AuthMode::WithoutBearer));
        assert_eq!(plan.mode(AttemptState::Fallback), Some(AuthMode::WithBearer));

        let plan = AttemptPlan::new(false, true);
        assert_eq!(plan.mode(AttemptState::Primary), Some(AuthMode::WithoutBearer));
        assert_eq!(plan.mode(AttemptState::Fallback), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(AttemptOutcome::classify(200), AttemptOutcome::Success);
        assert_eq!(AttemptOutcome::classify(204), AttemptOutcome::Success);
        assert_eq!(AttemptOutcome::classify(404), AttemptOutcome::NotFound);
        assert_eq!(AttemptOutcome::classify(401), AttemptOutcome::AuthRejected);
        assert_eq!(AttemptOutcome::classify(403), AttemptOutcome::AuthRejected);
        assert_eq!(AttemptOutcome::classify(500), AttemptOutcome::Fatal);
        assert_eq!(AttemptOutcome::classify(302), AttemptOutcome::Fatal);
    }

    #[tokio::test]
    async fn test_preferred_bearer_success_never_tries_anonymous() {
        let (orch, stub) = orchestrator(StubTransport::new().on(URL, 200, r#"{"ok": true}"#));

        let value: Option<Value> = orch.fetch_json(&url(), with_bearer(true)).await.unwrap();
        assert_eq!(value.unwrap()["ok"], true);
        assert_eq!(stub.calls(), vec![call(true)]);
    }

    #[tokio::test]
    async fn test_not_found_returns_none_without_retry() {
        let (orch, stub) = orchestrator(StubTransport::new().on(URL, 404, ""));

        let value: Option<Value> = orch.fetch_json(&url(), with_bearer(true)).await.unwrap();
        assert!(value.is_none());
        assert_eq!(stub.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let (orch, stub) = orchestrator(StubTransport::new().on(URL, 500, "boom"));

        let err = orch
            .fetch_json::<Value>(&url(), with_bearer(true))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(stub.calls(), vec![call(true)]);
    }

    #[tokio::test]
    async fn test_auth_rejection_falls_through() {
        let (orch, stub) = orchestrator(
            StubTransport::new()
                .on_auth(URL, true, 401, "")
                .on_auth(URL, false, 200, r#"{"n": 1}"#),
        );

        let value: Option<Value> = orch.fetch_json(&url(), with_bearer(true)).await.unwrap();
        assert_eq!(value.unwrap()["n"], 1);
        assert_eq!(stub.calls(), vec![call(true), call(false)]);
    }

    #[tokio::test]
    async fn test_anonymous_first_when_not_preferred() {
        let (orch, stub) = orchestrator(
            StubTransport::new()
                .on_auth(URL, false, 403, "")
                .on_auth(URL, true, 200, "{}"),
        );

        let value: Option<Value> = orch.fetch_json(&url(), with_bearer(false)).await.unwrap();
        assert!(value.is_some());
        assert_eq!(stub.calls(), vec![call(false), call(true)]);
    }

    #[tokio::test]
    async fn test_exhausted_reports_last_response() {
        let (orch, stub) = orchestrator(
            StubTransport::new()
                .on_auth(URL, true, 401, "")
                .on_auth(URL, false, 403, "forbidden"),
        );

        let err = orch
            .fetch_json::<Value>(&url(), with_bearer(true))
            .await
            .unwrap_err();
        match err {
            ClientError::Http {
                status,
                headers,
                body,
                ..
            } => {
                assert_eq!(status, 403);
                assert_eq!(headers.get("Authorization"), None);
                assert_eq!(body, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stub.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_without_token_single_attempt() {
        let (orch, stub) = orchestrator(StubTransport::new().on(URL, 401, ""));

        let options = FetchOptions {
            bearer: None,
            prefer_bearer: true,
            debug: false,
        };
        assert!(orch.fetch_json::<Value>(&url(), options).await.is_err());
        assert_eq!(stub.calls(), vec![call(false)]);
    }

    #[tokio::test]
    async fn test_error_redacts_bearer_and_includes_body_in_debug() {
        let (orch, _stub) = orchestrator(StubTransport::new().on(URL, 502, "upstream down"));

        let options = FetchOptions {
            debug: true,
            ..with_bearer(true)
        };
        let err = orch.fetch_json::<Value>(&url(), options).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains(REDACTED_BEARER));
        assert!(!message.contains("tok-123"));
        assert!(message.contains("upstream down"));
    }

    #[tokio::test]
    async fn test_decode_error() {
        let (orch, _stub) = orchestrator(StubTransport::new().on(URL, 200, "not json"));

        let err = orch
            .fetch_json::<Value>(&url(), with_bearer(true))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let (orch, stub) = orchestrator(StubTransport::new().fail(URL));

        let err = orch
            .fetch_json::<Value>(&url(), with_bearer(true))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(stub.calls().len(), 1);
    }
}
