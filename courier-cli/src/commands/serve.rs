//! Run the Safari push web service.

use courier_core::Server;
use courier_safari::{SafariOptions, SigningMaterial, router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::CliResult;
use crate::settings::CourierSettings;

/// Overrides for the configured listener.
#[derive(Debug, Clone, Default)]
pub struct ServeArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
}

pub async fn run(settings: &CourierSettings, args: ServeArgs) -> CliResult<()> {
    let safari = settings.safari()?;
    let mut server = settings.server()?;
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }

    let signing = SigningMaterial::from_files(&safari.cert_path, &safari.apple_root_path)?;
    // Fail at startup rather than on the first package request.
    signing.bundle()?;
    signing.apple_root()?;

    let options = SafariOptions::new(safari.website, signing, safari.icons_dir);
    let router = router(Arc::new(options))?;
    for (method, path) in router.paths() {
        info!(method = method.as_str(), path, "Route registered");
    }

    let listener = TcpListener::bind(server.address()).await?;
    info!(address = %listener.local_addr()?, "Safari push service listening");

    Server::new(router).serve(listener).await?;
    Ok(())
}
