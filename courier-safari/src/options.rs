//! Website configuration for Safari push.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::signer::SigningMaterial;

/// Boxed error returned by device registries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The `website.json` shipped inside every push package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteDescriptor {
    pub website_name: String,
    #[serde(rename = "websitePushID")]
    pub website_push_id: String,
    pub allowed_domains: Vec<String>,
    pub url_format_string: String,
    /// Shared secret Safari presents when registering devices.
    pub authentication_token: String,
    #[serde(rename = "webServiceURL")]
    pub web_service_url: String,
}

/// Receives device deactivations from the web service.
///
/// Storage is the caller's concern; the web service only forwards
/// `(website, device)` pairs.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn deactivate(&self, website: &str, device: &str) -> Result<(), BoxError>;
}

#[async_trait]
impl<F> DeviceRegistry for F
where
    F: Fn(&str, &str) -> Result<(), BoxError> + Send + Sync,
{
    async fn deactivate(&self, website: &str, device: &str) -> Result<(), BoxError> {
        self(website, device)
    }
}

/// A registry that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRegistry;

#[async_trait]
impl DeviceRegistry for LogRegistry {
    async fn deactivate(&self, website: &str, device: &str) -> Result<(), BoxError> {
        info!(website, device, "Device deactivated");
        Ok(())
    }
}

/// Everything needed to build packages and serve the web service.
#[derive(Clone)]
pub struct SafariOptions {
    pub website: WebsiteDescriptor,
    pub signing: Arc<SigningMaterial>,
    /// Directory holding the six `icon_*.png` files.
    pub icons_dir: PathBuf,
    pub registry: Arc<dyn DeviceRegistry>,
}

impl SafariOptions {
    pub fn new(
        website: WebsiteDescriptor,
        signing: SigningMaterial,
        icons_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            website,
            signing: Arc::new(signing),
            icons_dir: icons_dir.into(),
            registry: Arc::new(LogRegistry),
        }
    }

    /// Forward deactivations to `registry`.
    pub fn with_registry(mut self, registry: Arc<dyn DeviceRegistry>) -> Self {
        self.registry = registry;
        self
    }
}

impl fmt::Debug for SafariOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafariOptions")
            .field("website", &self.website)
            .field("icons_dir", &self.icons_dir)
            .finish()
    }
}
