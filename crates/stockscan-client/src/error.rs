//! # Client Error Types
//!
//! Errors raised while talking to the backend endpoints.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Condition            Surfaced as                                       │
//! │  ───────────────────  ──────────────────────────────────────────────    │
//! │  404                  Ok(None)            benign absence               │
//! │  401 / 403            (internal)          retry with other auth mode   │
//! │  other non-2xx        ClientError::Http   status, url, headers, body?  │
//! │  connect / timeout    ClientError::Transport                           │
//! │  bad JSON             ClientError::Decode                              │
//! │  no internal SKU      Ok(None)            item-level soft failure      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use stockscan_core::ValidationError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Header name/value pairs as they were intended to be sent, with the
/// bearer token redacted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactedHeaders(pub Vec<(String, String)>);

impl RedactedHeaders {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for RedactedHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
            first = false;
        }
        Ok(())
    }
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref().map(|b| format!(": {b}")).unwrap_or_default()
}

/// Backend request errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx response other than 404, or 401/403 after every auth mode was
    /// tried.
    ///
    /// `body` is only captured in debug mode.
    #[error("HTTP {status} from {url} [{headers}]{}", body_suffix(.body))]
    Http {
        status: u16,
        url: String,
        headers: RedactedHeaders,
        body: Option<String>,
    },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// A 2xx body that did not decode into the expected shape.
    #[error("Could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A base URL or path could not be turned into a request URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Client could not be constructed from its settings.
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// Input rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The caller cancelled the batch.
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// HTTP status for [`ClientError::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the same request could succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { .. } => true,
            ClientError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether the error comes from local configuration rather than the
    /// backend.
    pub fn is_config_error(&self) -> bool {
        matches!(self, ClientError::InvalidUrl(_) | ClientError::Config(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let message = if err.is_timeout() {
            "timed out".to_string()
        } else {
            err.to_string()
        };
        ClientError::Transport { url, message }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_without_body() {
        let err = ClientError::Http {
            status: 500,
            url: "https://api.example.com/stock/1/2".to_string(),
            headers: RedactedHeaders(vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "Bearer ***".to_string()),
            ]),
            body: None,
        };
        assert_eq!(
            err.to_string(),
            "HTTP 500 from https://api.example.com/stock/1/2 [Accept: application/json, Authorization: Bearer ***]"
        );
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_http_error_message_with_body() {
        let err = ClientError::Http {
            status: 400,
            url: "u".to_string(),
            headers: RedactedHeaders::default(),
            body: Some("bad location".to_string()),
        };
        assert_eq!(err.to_string(), "HTTP 400 from u []: bad location");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_categories() {
        assert!(ClientError::InvalidUrl("x".to_string()).is_config_error());
        assert!(!ClientError::Cancelled.is_config_error());
        assert!(ClientError::Transport {
            url: "u".to_string(),
            message: "timed out".to_string()
        }
        .is_retryable());
    }
}
