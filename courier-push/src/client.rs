//! APNs delivery client.

use once_cell::sync::OnceCell;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::result::classify;
use crate::token::{Clock, TokenManager};
use crate::{
    CredentialStore, Credentials, DeliveryError, DeliveryResult, Headers, Payload, Push,
    PushError, PushType, Result, ResultCode,
};

/// APNs environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApnsEnvironment {
    /// Development/sandbox environment.
    Development,
    /// Production environment.
    #[default]
    Production,
}

impl ApnsEnvironment {
    /// Base URL of the environment.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Development => "https://api.sandbox.push.apple.com",
            Self::Production => "https://api.push.apple.com",
        }
    }
}

impl std::str::FromStr for ApnsEnvironment {
    type Err = PushError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "sandbox" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(PushError::Config(format!("unknown APNs environment: {}", other))),
        }
    }
}

/// Sends notifications to APNs.
///
/// Holds the credentials, the shared provider token and the default
/// transport. Safe to share across tasks.
pub struct ApnsClient {
    store: Arc<CredentialStore>,
    tokens: TokenManager,
    endpoint: String,
    client: Client,
    safari_client: OnceCell<Client>,
}

impl ApnsClient {
    /// Create a client for the given environment.
    pub fn new(credentials: Credentials, environment: ApnsEnvironment) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| PushError::Config(e.to_string()))?;

        let store = Arc::new(CredentialStore::new(credentials));
        Ok(Self {
            tokens: TokenManager::new(store.clone()),
            store,
            endpoint: environment.endpoint().to_string(),
            client,
            safari_client: OnceCell::new(),
        })
    }

    /// Send to a different APNs host.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| PushError::Config(format!("invalid endpoint {}: {}", endpoint, e)))?;
        self.endpoint = parsed.as_str().trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Use a custom clock for the token lifetime.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.tokens = TokenManager::with_clock(self.store.clone(), clock);
        self
    }

    /// Replace the default transport.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// The provider token cache.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// The credential store.
    pub fn credentials(&self) -> &CredentialStore {
        &self.store
    }

    /// URL of a device token on the configured host.
    pub fn device_url(&self, device_token: &str) -> String {
        format!("{}/3/device/{}", self.endpoint, device_token)
    }

    /// Deliver a notification to its device.
    ///
    /// The push type header always follows the notification kind. Web pushes
    /// go over a client authenticated with the Safari certificate and carry
    /// no extra headers.
    pub async fn push(&self, push: &Push, headers: Option<Headers>) -> DeliveryResult {
        let url = self.device_url(push.device_token());
        let payload = push.payload();

        if let Push::Web(_) = push {
            let transport = match self.safari_client() {
                Ok(client) => client,
                Err(e) => {
                    warn!(error = %e, "Safari TLS client unavailable");
                    return DeliveryResult::fail(
                        ResultCode::FailNow,
                        DeliveryError::Transport(e.to_string()),
                    );
                }
            };
            return self.send(&url, &payload, Headers::new(), Some(transport)).await;
        }

        let mut headers = headers.unwrap_or_default();
        headers.push_type = push.push_type();
        self.send(&url, &payload, headers, None).await
    }

    /// POST a payload to `url`.
    ///
    /// Size is checked before a token is fetched or a connection is made.
    /// `transport` overrides the default client for this request only.
    pub async fn send(
        &self,
        url: &str,
        payload: &Payload,
        mut headers: Headers,
        transport: Option<&Client>,
    ) -> DeliveryResult {
        let body = match payload.to_bytes() {
            Ok(body) => body,
            Err(e) => {
                return DeliveryResult::fail(
                    ResultCode::FailNow,
                    DeliveryError::Serialization(e.to_string()),
                );
            }
        };

        let limit = PushType::max_payload_size(headers.push_type);
        if body.len() > limit {
            debug!(size = body.len(), limit, "Payload exceeds APNs limit");
            return DeliveryResult::fail(
                ResultCode::FailNow,
                DeliveryError::PayloadTooLarge {
                    size: body.len(),
                    limit,
                },
            );
        }

        let token = match self.tokens.get() {
            Ok(token) => token,
            Err(e) => {
                return DeliveryResult::fail(ResultCode::FailNow, DeliveryError::Token(e.to_string()));
            }
        };

        headers.set_topic(&self.store.credentials().bundle_id);

        let client = transport.unwrap_or(&self.client);
        let mut request = client
            .post(url)
            .header("authorization", format!("bearer {}", token))
            .header("content-type", "application/json");
        for (name, value) in headers.wire_headers() {
            request = request.header(name, value);
        }

        debug!(url = %url, push_type = ?headers.push_type, "Sending APNs notification");

        let debug_request = format!("url: {}\n{}", url, String::from_utf8_lossy(&body));

        let response = match request.body(body).send().await {
            Ok(response) => response,
            Err(e) => {
                return DeliveryResult {
                    debug_request,
                    ..DeliveryResult::fail(ResultCode::RetryNow, DeliveryError::Request(e.to_string()))
                };
            }
        };

        let status = response.status().as_u16();
        let response_body = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return DeliveryResult {
                    debug_request,
                    ..DeliveryResult::fail(ResultCode::RetryNow, DeliveryError::Body(e.to_string()))
                };
            }
        };

        let classification = classify(status, &response_body);
        if classification.reset_token {
            self.tokens.reset();
        }

        debug!(status, code = %classification.code, "APNs responded");

        DeliveryResult {
            code: classification.code,
            error: classification.error,
            debug_request,
            debug_response: format!(
                "code: {}\nbody: {}",
                status,
                String::from_utf8_lossy(&response_body)
            ),
        }
    }

    fn safari_client(&self) -> Result<&Client> {
        self.safari_client.get_or_try_init(|| {
            let identity = self.store.safari_bundle()?.tls_identity()?;
            Client::builder()
                .use_rustls_tls()
                .identity(identity)
                .build()
                .map_err(|e| PushError::Config(e.to_string()))
        })
    }
}

impl std::fmt::Debug for ApnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApnsClient")
            .field("endpoint", &self.endpoint)
            .field("credentials", self.store.credentials())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::tests::test_credentials;

    #[test]
    fn test_environment_endpoints() {
        assert_eq!(
            ApnsEnvironment::Production.endpoint(),
            "https://api.push.apple.com"
        );
        assert_eq!(
            ApnsEnvironment::Development.endpoint(),
            "https://api.sandbox.push.apple.com"
        );
        assert_eq!(ApnsEnvironment::default(), ApnsEnvironment::Production);
        assert_eq!(
            "sandbox".parse::<ApnsEnvironment>().unwrap(),
            ApnsEnvironment::Development
        );
    }

    #[test]
    fn test_device_url() {
        let client = ApnsClient::new(test_credentials(), ApnsEnvironment::Development).unwrap();
        assert_eq!(
            client.device_url("abc"),
            "https://api.sandbox.push.apple.com/3/device/abc"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let client = ApnsClient::new(test_credentials(), ApnsEnvironment::Production)
            .unwrap()
            .with_endpoint("http://127.0.0.1:8080/")
            .unwrap();
        assert_eq!(client.device_url("abc"), "http://127.0.0.1:8080/3/device/abc");

        let bad = ApnsClient::new(test_credentials(), ApnsEnvironment::Production)
            .unwrap()
            .with_endpoint("not a url");
        assert!(matches!(bad, Err(PushError::Config(_))));
    }

    #[tokio::test]
    async fn test_oversize_payload_skips_token() {
        let client = ApnsClient::new(test_credentials(), ApnsEnvironment::Production).unwrap();
        let mut payload = Payload::default();
        payload
            .extensions
            .insert("blob".into(), serde_json::Value::String("x".repeat(5000)));

        let result = client
            .send("http://127.0.0.1:9/3/device/abc", &payload, Headers::new(), None)
            .await;

        assert_eq!(result.code, ResultCode::FailNow);
        assert!(matches!(
            result.error,
            Some(DeliveryError::PayloadTooLarge { limit: 4096, .. })
        ));
        assert!(client.tokens().generated_at().is_none());
        assert!(result.debug_request.is_empty());
    }

    #[tokio::test]
    async fn test_web_push_without_safari_cert() {
        let client = ApnsClient::new(test_credentials(), ApnsEnvironment::Production).unwrap();
        let push = Push::Web(crate::WebPush {
            token: "abc".into(),
            ..Default::default()
        });

        let result = client.push(&push, None).await;
        assert_eq!(result.code, ResultCode::FailNow);
        assert!(matches!(result.error, Some(DeliveryError::Transport(_))));
    }
}
