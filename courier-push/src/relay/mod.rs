//! Firebase Cloud Messaging relay.
//!
//! Forwards [`Message`]s to the FCM HTTP v1 API and reports the outcome as a
//! [`RelayResult`]. Like APNs delivery, outcomes are data, not errors.

mod message;

pub use message::*;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{PushError, Result};

/// Default FCM host.
pub const FCM_ENDPOINT: &str = "https://fcm.googleapis.com";

const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Supplies OAuth2 bearer tokens for the relay.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// A currently valid access token.
    async fn access_token(&self) -> Result<String>;
}

/// A pre-issued token that never changes.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Google service account key file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    /// RSA private key (PEM).
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccount {
    /// Load a service account JSON file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse service account JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PushError::Config(e.to_string()))
    }
}

struct AccessToken {
    token: String,
    expires_at: Instant,
}

/// Exchanges a signed service account assertion for access tokens.
///
/// Tokens are cached until a minute before they expire.
pub struct ServiceAccountTokenSource {
    account: ServiceAccount,
    client: Client,
    cached: Mutex<Option<AccessToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(account: ServiceAccount) -> Self {
        Self::with_client(account, Client::new())
    }

    pub fn with_client(account: ServiceAccount, client: Client) -> Self {
        Self {
            account,
            client,
            cached: Mutex::new(None),
        }
    }

    async fn refresh_token(&self) -> Result<AccessToken> {
        #[derive(Serialize)]
        struct Claims<'a> {
            iss: &'a str,
            scope: &'a str,
            aud: &'a str,
            iat: u64,
            exp: u64,
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let claims = Claims {
            iss: &self.account.client_email,
            scope: MESSAGING_SCOPE,
            aud: &self.account.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.account.private_key.as_bytes())
            .map_err(|e| PushError::InvalidKey(e.to_string()))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }

        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PushError::AccessToken(e.to_string()))?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PushError::AccessToken(e.to_string()))?;

        info!(expires_in = token.expires_in, "Refreshed FCM access token");

        Ok(AccessToken {
            token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(t) = cached.as_ref()
            && t.expires_at > Instant::now() + Duration::from_secs(60)
        {
            return Ok(t.token.clone());
        }

        let fresh = self.refresh_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

/// What the caller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayCode {
    /// Accepted.
    Ok,
    /// Permanent failure for this message.
    Fatal,
    /// Transient failure; try again.
    Retry,
    /// The project credentials or target registration are unusable.
    InvalidPreset,
}

impl fmt::Display for RelayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::Fatal => "fatal",
            Self::Retry => "retry",
            Self::InvalidPreset => "invalid_preset",
        };
        f.write_str(name)
    }
}

/// Why a relay attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Message serialization failed: {0}")]
    Serialization(String),

    #[error("Access token unavailable: {0}")]
    Token(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Response body read failed: {0}")]
    Body(String),

    #[error("Unparseable response: {0}")]
    MalformedResponse(String),

    #[error("FCM returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// The outcome of one relay attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResult {
    pub code: RelayCode,
    pub error: Option<RelayError>,
    pub debug_request: String,
    pub debug_response: String,
}

impl RelayResult {
    fn fail(code: RelayCode, error: RelayError, debug_request: String) -> Self {
        Self {
            code,
            error: Some(error),
            debug_request,
            debug_response: String::new(),
        }
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a Message,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    validate_only: bool,
}

/// Map an FCM status code to a relay outcome.
pub fn classify_status(status: u16) -> (RelayCode, Option<&'static str>) {
    match status {
        200 => (RelayCode::Ok, None),
        400 => (RelayCode::Fatal, Some("invalid request parameters")),
        401 => (
            RelayCode::InvalidPreset,
            Some("APNs certificate or web push auth key was invalid or missing"),
        ),
        403 => (
            RelayCode::InvalidPreset,
            Some("sender id does not match the registration token"),
        ),
        404 => (RelayCode::InvalidPreset, Some("app instance was unregistered")),
        429 => (RelayCode::Fatal, Some("sending limit exceeded for the target")),
        500 => (RelayCode::Retry, Some("internal error")),
        503 => (RelayCode::Retry, Some("server overloaded")),
        _ => (RelayCode::Fatal, Some("unexpected status")),
    }
}

/// Sends messages to one FCM project.
pub struct RelayClient {
    project_id: String,
    endpoint: String,
    tokens: Arc<dyn AccessTokenSource>,
    client: Client,
}

impl RelayClient {
    pub fn new(project_id: impl Into<String>, tokens: Arc<dyn AccessTokenSource>) -> Self {
        Self {
            project_id: project_id.into(),
            endpoint: FCM_ENDPOINT.to_string(),
            tokens,
            client: Client::new(),
        }
    }

    /// A client authenticated with a service account.
    pub fn from_service_account(account: ServiceAccount) -> Self {
        let project_id = account.project_id.clone();
        Self::new(project_id, Arc::new(ServiceAccountTokenSource::new(account)))
    }

    /// Send to a different host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// The `messages:send` URL of the project.
    pub fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint, self.project_id
        )
    }

    /// Send a message.
    pub async fn send(&self, message: &Message) -> RelayResult {
        self.dispatch(message, false).await
    }

    /// Ask FCM to validate a message without delivering it.
    pub async fn validate(&self, message: &Message) -> RelayResult {
        self.dispatch(message, true).await
    }

    async fn dispatch(&self, message: &Message, validate_only: bool) -> RelayResult {
        let url = self.send_url();

        let body = match serde_json::to_vec(&SendRequest {
            message,
            validate_only,
        }) {
            Ok(body) => body,
            Err(e) => {
                return RelayResult::fail(
                    RelayCode::Fatal,
                    RelayError::Serialization(e.to_string()),
                    String::new(),
                );
            }
        };
        let debug_request = format!("url: {}\nbody: {}", url, String::from_utf8_lossy(&body));

        let token = match self.tokens.access_token().await {
            Ok(token) => token,
            Err(e) => {
                let code = match e {
                    PushError::AccessToken(_) => RelayCode::Retry,
                    _ => RelayCode::InvalidPreset,
                };
                return RelayResult::fail(code, RelayError::Token(e.to_string()), debug_request);
            }
        };

        debug!(url = %url, "Sending FCM message");

        let response = match self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", token))
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return RelayResult::fail(
                    RelayCode::Retry,
                    RelayError::Request(e.to_string()),
                    debug_request,
                );
            }
        };

        let status = response.status().as_u16();
        let response_body = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return RelayResult::fail(
                    RelayCode::Retry,
                    RelayError::Body(e.to_string()),
                    debug_request,
                );
            }
        };
        let debug_response = format!(
            "code: {}\nbody: {}",
            status,
            String::from_utf8_lossy(&response_body)
        );

        if let Err(e) = serde_json::from_slice::<serde_json::Value>(&response_body) {
            return RelayResult {
                code: RelayCode::Fatal,
                error: Some(RelayError::MalformedResponse(e.to_string())),
                debug_request,
                debug_response,
            };
        }

        let (code, message) = classify_status(status);
        debug!(status, code = %code, "FCM responded");

        RelayResult {
            code,
            error: message.map(|m| RelayError::Status {
                status,
                message: m.to_string(),
            }),
            debug_request,
            debug_response,
        }
    }
}

impl fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayClient")
            .field("project_id", &self.project_id)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
