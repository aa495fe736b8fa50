//! Credential and configuration errors.
//!
//! Delivery outcomes are not errors; they are reported as
//! [`DeliveryResult`](crate::DeliveryResult) values. This type covers the
//! failures an operator has to fix: unreadable keys, bad certificate bundles,
//! unusable client configuration.

use thiserror::Error;

/// Result type for credential and configuration operations.
pub type Result<T> = std::result::Result<T, PushError>;

/// Push configuration errors.
#[derive(Debug, Error)]
pub enum PushError {
    /// The APNs auth key is not a PEM-wrapped PKCS#8 P-256 key.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    /// The certificate bundle could not be decoded.
    #[error("Invalid certificate bundle: {0}")]
    InvalidCertificate(String),

    /// Token signing failed.
    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Access token exchange with the relay's token endpoint failed.
    #[error("Access token request failed: {0}")]
    AccessToken(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<openssl::error::ErrorStack> for PushError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        Self::InvalidCertificate(err.to_string())
    }
}
