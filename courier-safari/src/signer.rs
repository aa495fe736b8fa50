//! Push package assembly and signing.
//!
//! A push package is a zip archive holding the website icons, the website
//! descriptor, a manifest of their SHA-1 digests and a detached PKCS#7
//! signature over the manifest.

use courier_push::CertificateBundle;
use once_cell::sync::OnceCell;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::stack::Stack;
use openssl::x509::X509;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::manifest::Manifest;
use crate::{Result, SafariError, SafariOptions};

/// Icon files every package must carry.
pub const ICON_NAMES: [&str; 6] = [
    "icon_16x16.png",
    "icon_16x16@2x.png",
    "icon_32x32.png",
    "icon_32x32@2x.png",
    "icon_128x128.png",
    "icon_128x128@2x.png",
];

/// Archive directory holding the icons.
pub const ICONSET_DIR: &str = "icon.iconset";

/// The website push certificate and the Apple root it chains to.
///
/// Both are decoded on first use and reused for every package afterwards.
pub struct SigningMaterial {
    pkcs12: Vec<u8>,
    apple_root_path: PathBuf,
    bundle: OnceCell<CertificateBundle>,
    apple_root: OnceCell<X509>,
}

impl SigningMaterial {
    /// `pkcs12` is a password-less bundle; `apple_root_path` points to the
    /// Apple root certificate in DER or PEM.
    pub fn new(pkcs12: impl Into<Vec<u8>>, apple_root_path: impl Into<PathBuf>) -> Self {
        Self {
            pkcs12: pkcs12.into(),
            apple_root_path: apple_root_path.into(),
            bundle: OnceCell::new(),
            apple_root: OnceCell::new(),
        }
    }

    /// Read the PKCS#12 bundle from disk.
    pub fn from_files(pkcs12_path: impl AsRef<Path>, apple_root_path: impl Into<PathBuf>) -> Result<Self> {
        let pkcs12 = std::fs::read(pkcs12_path)?;
        Ok(Self::new(pkcs12, apple_root_path))
    }

    pub fn bundle(&self) -> Result<&CertificateBundle> {
        self.bundle
            .get_or_try_init(|| Ok(CertificateBundle::from_pkcs12(&self.pkcs12)?))
    }

    pub fn apple_root(&self) -> Result<&X509> {
        self.apple_root.get_or_try_init(|| {
            let raw = std::fs::read(&self.apple_root_path).map_err(|e| {
                SafariError::Certificate(format!(
                    "cannot read {}: {}",
                    self.apple_root_path.display(),
                    e
                ))
            })?;
            X509::from_der(&raw)
                .or_else(|_| X509::from_pem(&raw))
                .map_err(|e| SafariError::Certificate(format!("invalid Apple root: {}", e)))
        })
    }

    /// Detached, binary PKCS#7 signature over `data` in DER.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let bundle = self.bundle()?;
        let root = self.apple_root()?;

        let mut certs = Stack::new()?;
        for cert in bundle.chain() {
            certs.push(cert.clone())?;
        }
        certs.push(root.clone())?;

        let signature = Pkcs7::sign(
            bundle.certificate(),
            bundle.private_key(),
            &certs,
            data,
            Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY,
        )?;

        Ok(signature.to_der()?)
    }
}

impl std::fmt::Debug for SigningMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningMaterial")
            .field("apple_root_path", &self.apple_root_path)
            .finish()
    }
}

/// Build a signed push package.
///
/// Blocking: reads icons from disk and signs. Fails without producing any
/// bytes if an icon is missing or signing fails.
pub fn build_package(options: &SafariOptions) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut manifest = Manifest::new();

    for name in ICON_NAMES {
        let data = std::fs::read(options.icons_dir.join(name)).map_err(|source| SafariError::Icon {
            name: name.to_string(),
            source,
        })?;
        let path = format!("{}/{}", ICONSET_DIR, name);
        zip.start_file(path.as_str(), file_options)?;
        zip.write_all(&data)?;
        manifest.add(path, &data);
    }

    let website = serde_json::to_vec(&options.website)?;
    zip.start_file("website.json", file_options)?;
    zip.write_all(&website)?;
    manifest.add("website.json", &website);

    let manifest_bytes = manifest.to_json()?;
    zip.start_file("manifest.json", file_options)?;
    zip.write_all(&manifest_bytes)?;

    let signature = options.signing.sign(&manifest_bytes)?;
    zip.start_file("signature", file_options)?;
    zip.write_all(&signature)?;

    let archive = zip.finish()?.into_inner();
    debug!(
        website = %options.website.website_push_id,
        size = archive.len(),
        "Built push package"
    );

    Ok(archive)
}
