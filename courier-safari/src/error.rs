//! Safari packaging and web service errors.

use thiserror::Error;

/// Result type for Safari operations.
pub type Result<T> = std::result::Result<T, SafariError>;

/// Errors raised while building packages or serving the web service.
#[derive(Debug, Error)]
pub enum SafariError {
    /// A required icon is missing or unreadable.
    #[error("Icon {name} unavailable: {source}")]
    Icon {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The website descriptor could not be serialized.
    #[error("Descriptor serialization failed: {0}")]
    Descriptor(#[from] serde_json::Error),

    /// Signing certificate or Apple root certificate is unusable.
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// PKCS#7 signing failed.
    #[error("Signing failed: {0}")]
    Signing(#[from] openssl::error::ErrorStack),

    /// Writing the archive failed.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// `webServiceURL` cannot be turned into a route prefix.
    #[error("Invalid web service URL: {0}")]
    InvalidUrl(String),

    /// The registration request carried the wrong credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The device registry callback failed.
    #[error("Device registry error: {0}")]
    Registry(String),

    /// A blocking task was cancelled or panicked.
    #[error("Task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<courier_push::PushError> for SafariError {
    fn from(err: courier_push::PushError) -> Self {
        Self::Certificate(err.to_string())
    }
}

impl From<SafariError> for courier_core::Error {
    fn from(err: SafariError) -> Self {
        match err {
            SafariError::Unauthorized(msg) => courier_core::Error::Unauthorized(msg),
            other => courier_core::Error::Internal(other.to_string()),
        }
    }
}
