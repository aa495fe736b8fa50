//! Delivery results and APNs response classification.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// What the caller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Accepted by APNs.
    Ok,
    /// Permanent failure for this notification; do not retry.
    FailNow,
    /// Retry immediately (transport failure or a refreshed token).
    RetryNow,
    /// Retry after a delay (throttling or server trouble).
    RetryLater,
    /// The device token or provider setup is wrong; retrying won't help.
    InvalidConfig,
}

impl ResultCode {
    /// Stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::FailNow => "fail_now",
            Self::RetryNow => "retry_now",
            Self::RetryLater => "retry_later",
            Self::InvalidConfig => "invalid_config",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a delivery did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("Payload serialization failed: {0}")]
    Serialization(String),

    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Provider token unavailable: {0}")]
    Token(String),

    #[error("Transport unavailable: {0}")]
    Transport(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Response body read failed: {0}")]
    Body(String),

    /// The `reason` APNs returned for a 4xx.
    #[error("APNs rejected the request: {0}")]
    Rejected(String),

    #[error("Unparseable error response: {0}")]
    MalformedResponse(String),

    #[error("APNs server error ({0})")]
    Server(u16),

    #[error("Unexpected response status {0}")]
    UnexpectedStatus(u16),
}

/// The outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub code: ResultCode,
    pub error: Option<DeliveryError>,
    /// `url: <url>\n<body>`; empty if nothing was sent.
    pub debug_request: String,
    /// `code: <status>\nbody: <body>`; empty if nothing was received.
    pub debug_response: String,
}

impl DeliveryResult {
    /// A result with no debug text.
    pub fn new(code: ResultCode, error: Option<DeliveryError>) -> Self {
        Self {
            code,
            error,
            debug_request: String::new(),
            debug_response: String::new(),
        }
    }

    pub(crate) fn fail(code: ResultCode, error: DeliveryError) -> Self {
        Self::new(code, Some(error))
    }

    /// Whether APNs accepted the notification.
    pub fn is_ok(&self) -> bool {
        self.code == ResultCode::Ok
    }
}

/// A classified APNs response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub code: ResultCode,
    pub error: Option<DeliveryError>,
    /// The cached provider token must be discarded.
    pub reset_token: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    reason: String,
}

/// Map an APNs response to a result code.
pub fn classify(status: u16, body: &[u8]) -> Classification {
    let (code, error, reset_token) = match status {
        200 => (ResultCode::Ok, None, false),
        400..=499 => match serde_json::from_slice::<ErrorBody>(body) {
            Err(e) => (
                ResultCode::RetryLater,
                Some(DeliveryError::MalformedResponse(e.to_string())),
                false,
            ),
            Ok(ErrorBody { reason }) => {
                let (code, reset) = match reason.as_str() {
                    "BadDeviceToken"
                    | "Unregistered"
                    | "TopicDisallowed"
                    | "DeviceTokenNotForTopic"
                    | "InvalidProviderToken" => (ResultCode::InvalidConfig, false),
                    "ExpiredProviderToken" => (ResultCode::RetryNow, true),
                    "TooManyRequests" => (ResultCode::RetryLater, false),
                    "TooManyProviderTokenUpdates" => (ResultCode::RetryLater, true),
                    "MissingProviderToken" => (ResultCode::FailNow, false),
                    _ => (ResultCode::FailNow, false),
                };
                (code, Some(DeliveryError::Rejected(reason)), reset)
            }
        },
        500..=599 => (ResultCode::RetryLater, Some(DeliveryError::Server(status)), false),
        _ => (
            ResultCode::FailNow,
            Some(DeliveryError::UnexpectedStatus(status)),
            false,
        ),
    };

    Classification {
        code,
        error,
        reset_token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(status: u16, reason: &str) -> Classification {
        classify(status, format!(r#"{{"reason":"{}"}}"#, reason).as_bytes())
    }

    #[test]
    fn test_ok() {
        let c = classify(200, b"");
        assert_eq!(c.code, ResultCode::Ok);
        assert!(c.error.is_none());
        assert!(!c.reset_token);
    }

    #[test]
    fn test_invalid_config_reasons() {
        for r in [
            "BadDeviceToken",
            "Unregistered",
            "TopicDisallowed",
            "DeviceTokenNotForTopic",
            "InvalidProviderToken",
        ] {
            let c = reason(400, r);
            assert_eq!(c.code, ResultCode::InvalidConfig, "{r}");
            assert_eq!(c.error, Some(DeliveryError::Rejected(r.to_string())));
            assert!(!c.reset_token);
        }
    }

    #[test]
    fn test_unregistered_410() {
        assert_eq!(reason(410, "Unregistered").code, ResultCode::InvalidConfig);
    }

    #[test]
    fn test_expired_token_resets() {
        let c = reason(403, "ExpiredProviderToken");
        assert_eq!(c.code, ResultCode::RetryNow);
        assert!(c.reset_token);
    }

    #[test]
    fn test_throttling() {
        let c = reason(429, "TooManyRequests");
        assert_eq!(c.code, ResultCode::RetryLater);
        assert!(!c.reset_token);

        let c = reason(429, "TooManyProviderTokenUpdates");
        assert_eq!(c.code, ResultCode::RetryLater);
        assert!(c.reset_token);
    }

    #[test]
    fn test_fail_now_reasons() {
        assert_eq!(reason(403, "MissingProviderToken").code, ResultCode::FailNow);
        assert_eq!(reason(400, "PayloadEmpty").code, ResultCode::FailNow);
        assert_eq!(classify(400, b"{}").code, ResultCode::FailNow);
    }

    #[test]
    fn test_unparseable_4xx_retries_later() {
        let c = classify(400, b"<html>bad gateway</html>");
        assert_eq!(c.code, ResultCode::RetryLater);
        assert!(matches!(c.error, Some(DeliveryError::MalformedResponse(_))));
    }

    #[test]
    fn test_server_errors() {
        for status in [500, 503, 599] {
            let c = classify(status, b"");
            assert_eq!(c.code, ResultCode::RetryLater);
            assert_eq!(c.error, Some(DeliveryError::Server(status)));
        }
    }

    #[test]
    fn test_other_statuses_fail() {
        for status in [201, 204, 301, 600] {
            assert_eq!(classify(status, b"").code, ResultCode::FailNow, "{status}");
        }
    }
}
