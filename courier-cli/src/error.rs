//! Error types for the Courier CLI.

use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] courier_config::ConfigError),

    #[error("{0}")]
    Push(#[from] courier_push::PushError),

    #[error("{0}")]
    Safari(#[from] courier_safari::SafariError),

    #[error("Server error: {0}")]
    Server(#[from] courier_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// APNs did not accept the notification.
    #[error("Delivery failed ({code}): {reason}")]
    Delivery { code: String, reason: String },
}
