//! # Scanner Error Type
//!
//! Unified error type for scanner commands.
//!
//! ```text
//! DbError ─────┐
//! ClientError ─┼──► AppError ──► exit code + one-line message
//! SyncError ───┘
//! ```

use std::process::ExitCode;

use stockscan_client::ClientError;
use stockscan_db::DbError;
use stockscan_sync::SyncError;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn is_config_error(&self) -> bool {
        match self {
            AppError::Sync(e) => e.is_config_error(),
            AppError::Client(e) => e.is_config_error(),
            _ => false,
        }
    }

    /// `2` for configuration problems, `1` for everything else.
    pub fn exit_status(&self) -> u8 {
        if self.is_config_error() {
            2
        } else {
            1
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let config = AppError::Sync(SyncError::MissingLocationId);
        assert!(config.is_config_error());
        assert_eq!(config.exit_status(), 2);

        let probe = AppError::Sync(SyncError::ProbeFailed {
            url: "https://api.example.com/health".into(),
            reason: "HTTP 503".into(),
        });
        assert!(!probe.is_config_error());
        assert_eq!(probe.exit_status(), 1);
    }
}
