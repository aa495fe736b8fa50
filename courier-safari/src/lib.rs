//! # Courier Safari
//!
//! Safari website push: signed push packages and the web service Safari
//! calls to fetch them and to report registration changes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier_safari::{SafariOptions, SigningMaterial, WebsiteDescriptor, router};
//! use courier_core::Server;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! let signing = SigningMaterial::from_files("website_aps.p12", "AppleWWDRCA.cer")?;
//! let options = SafariOptions::new(descriptor, signing, "icons/");
//!
//! let listener = TcpListener::bind("0.0.0.0:8080").await?;
//! Server::new(router(Arc::new(options))?).serve(listener).await?;
//! ```

mod error;
mod manifest;
mod options;
mod routes;
mod signer;

pub use error::{Result, SafariError};
pub use manifest::{Manifest, digest};
pub use options::{BoxError, DeviceRegistry, LogRegistry, SafariOptions, WebsiteDescriptor};
pub use routes::{authorize, base_path, router};
pub use signer::{ICON_NAMES, ICONSET_DIR, SigningMaterial, build_package};
