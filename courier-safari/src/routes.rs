//! The website push web service Safari talks to.
//!
//! Safari calls these endpoints under the descriptor's `webServiceURL`:
//!
//! - `POST {base}/v1/pushPackages/:website` download the push package
//! - `POST|DELETE {base}/v1/devices/:device/registrations/:website` registration changes
//! - `POST {base}/v1/log` error reports

use courier_core::{HttpMethod, HttpRequest, HttpResponse, Router};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::signer::build_package;
use crate::{Result, SafariError, SafariOptions};

const DEFAULT_BASE: &str = "/push";
const AUTH_SCHEME: &str = "ApplePushNotifications";

/// Route prefix derived from `webServiceURL`.
///
/// Absolute and relative URLs are both accepted; only the path and query
/// are kept. An empty URL means `/push`.
pub fn base_path(web_service_url: &str) -> Result<String> {
    let raw = if web_service_url.is_empty() {
        DEFAULT_BASE
    } else {
        web_service_url
    };

    let url = Url::parse("http://localhost/")
        .and_then(|root| root.join(raw))
        .map_err(|e| SafariError::InvalidUrl(format!("{}: {}", raw, e)))?;

    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }

    Ok(path.trim_end_matches('/').to_string())
}

/// Check a registration request's `Authorization` header.
///
/// The credential is everything after the first space (the whole value if
/// there is none) and must be `secret` or `ApplePushNotifications secret`.
pub fn authorize(header: Option<&str>, secret: &str) -> Result<()> {
    let value = header.ok_or_else(|| SafariError::Unauthorized("missing authorization".into()))?;
    let credential = value.split_once(' ').map_or(value, |(_, rest)| rest);

    let prefixed = format!("{} {}", AUTH_SCHEME, secret);
    if !secret.is_empty() && (credential == secret || credential == prefixed) {
        Ok(())
    } else {
        Err(SafariError::Unauthorized("invalid authorization".into()))
    }
}

/// Build the web service routes.
pub fn router(options: Arc<SafariOptions>) -> Result<Router> {
    let base = base_path(&options.website.web_service_url)?;
    // Routing only sees the path.
    let base = base.split('?').next().unwrap_or_default().to_string();

    let mut router = Router::new();

    let opts = options.clone();
    router.on(
        HttpMethod::POST,
        format!("{}/v1/pushPackages/:website", base),
        move |req| {
            let opts = opts.clone();
            async move { push_package(opts, req).await.map_err(courier_core::Error::from) }
        },
    );

    let registrations = format!("{}/v1/devices/:device/registrations/:website", base);
    for method in [HttpMethod::POST, HttpMethod::DELETE] {
        let opts = options.clone();
        router.on(method, registrations.clone(), move |req| {
            let opts = opts.clone();
            async move { registration(opts, req).await.map_err(courier_core::Error::from) }
        });
    }

    router.on(HttpMethod::POST, format!("{}/v1/log", base), |req| async move {
        Ok::<_, courier_core::Error>(log(req))
    });

    Ok(router)
}

async fn push_package(options: Arc<SafariOptions>, req: HttpRequest) -> Result<HttpResponse> {
    let package = tokio::task::spawn_blocking(move || build_package(&options))
        .await
        .map_err(|e| SafariError::Task(e.to_string()))??;

    info!(
        method = %req.method,
        path = %req.path,
        website = req.param("website").unwrap_or_default(),
        "Served push package"
    );

    Ok(HttpResponse::ok()
        .with_header("Content-Type", "application/zip")
        .with_header(
            "Content-Disposition",
            "attachment; filename=\"pushPackage.zip\"",
        )
        .with_body(package))
}

async fn registration(options: Arc<SafariOptions>, req: HttpRequest) -> Result<HttpResponse> {
    if let Err(e) = authorize(
        req.header("authorization"),
        &options.website.authentication_token,
    ) {
        warn!(path = %req.path, "Rejected registration request");
        return Err(e);
    }

    let website = req.param("website").unwrap_or_default();
    let device = req.param("device").unwrap_or_default();

    options
        .registry
        .deactivate(website, device)
        .await
        .map_err(|e| SafariError::Registry(e.to_string()))?;

    info!(method = %req.method, path = %req.path, "Registration change");
    Ok(HttpResponse::text("OK"))
}

fn log(req: HttpRequest) -> HttpResponse {
    info!(
        method = %req.method,
        path = %req.path,
        headers = ?req.headers,
        body = %req.body_text(),
        "Safari log"
    );
    HttpResponse::text("OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path() {
        assert_eq!(base_path("").unwrap(), "/push");
        assert_eq!(base_path("/push/").unwrap(), "/push");
        assert_eq!(base_path("https://example.com/api/push").unwrap(), "/api/push");
        assert_eq!(base_path("https://example.com").unwrap(), "");
        assert_eq!(
            base_path("https://example.com/push?tenant=1").unwrap(),
            "/push?tenant=1"
        );
    }

    #[test]
    fn test_authorize_accepts_both_forms() {
        assert!(authorize(Some("ApplePushNotifications secret123"), "secret123").is_ok());
        assert!(authorize(Some("secret123"), "secret123").is_ok());
        assert!(
            authorize(
                Some("Bearer ApplePushNotifications secret123"),
                "secret123"
            )
            .is_ok()
        );
    }

    #[test]
    fn test_authorize_rejects() {
        for header in [
            "ApplePushNotifications wrong",
            "wrong",
            "secret123 extra",
            "",
        ] {
            assert!(
                matches!(
                    authorize(Some(header), "secret123"),
                    Err(SafariError::Unauthorized(_))
                ),
                "{header}"
            );
        }
        assert!(authorize(None, "secret123").is_err());
        assert!(authorize(Some(""), "").is_err());
    }
}
