//! Provider credentials and the parsed key material derived from them.

use jsonwebtoken::EncodingKey;
use once_cell::sync::OnceCell;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use std::fmt;
use std::path::Path;

use crate::{PushError, Result};

/// Raw APNs provider credentials.
///
/// Nothing is parsed at construction; the key and certificate bytes are
/// decoded on first use by a [`CredentialStore`].
#[derive(Clone)]
pub struct Credentials {
    /// Apple developer team id, used as the token issuer.
    pub team_id: String,
    /// Id of the `.p8` auth key, used as the token `kid`.
    pub key_id: String,
    /// App bundle id; the base of every `apns-topic`.
    pub bundle_id: String,
    /// PEM-wrapped PKCS#8 P-256 private key.
    pub auth_key: Vec<u8>,
    /// Password-less PKCS#12 bundle for Safari web push, if any.
    pub safari_cert: Option<Vec<u8>>,
}

impl Credentials {
    /// Create credentials from an in-memory `.p8` key.
    pub fn new(
        team_id: impl Into<String>,
        key_id: impl Into<String>,
        bundle_id: impl Into<String>,
        auth_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            key_id: key_id.into(),
            bundle_id: bundle_id.into(),
            auth_key: auth_key.into(),
            safari_cert: None,
        }
    }

    /// Load the auth key from a `.p8` file.
    pub fn from_p8_file(
        team_id: impl Into<String>,
        key_id: impl Into<String>,
        bundle_id: impl Into<String>,
        p8_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let auth_key = std::fs::read(p8_path)?;
        Ok(Self::new(team_id, key_id, bundle_id, auth_key))
    }

    /// Attach a Safari PKCS#12 bundle.
    pub fn with_safari_cert(mut self, bundle: impl Into<Vec<u8>>) -> Self {
        self.safari_cert = Some(bundle.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("team_id", &self.team_id)
            .field("key_id", &self.key_id)
            .field("bundle_id", &self.bundle_id)
            .field("auth_key", &"<redacted>")
            .field("safari_cert", &self.safari_cert.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A certificate and private key decoded from a PKCS#12 bundle.
pub struct CertificateBundle {
    certificate: X509,
    private_key: PKey<Private>,
    chain: Vec<X509>,
}

impl CertificateBundle {
    /// Decode a password-less PKCS#12 bundle.
    pub fn from_pkcs12(der: &[u8]) -> Result<Self> {
        let parsed = Pkcs12::from_der(der)?.parse2("")?;

        let certificate = parsed.cert.ok_or_else(|| {
            PushError::InvalidCertificate("bundle has no certificate".to_string())
        })?;
        let private_key = parsed.pkey.ok_or_else(|| {
            PushError::InvalidCertificate("bundle has no private key".to_string())
        })?;
        let chain = parsed
            .ca
            .map(|stack| stack.into_iter().collect())
            .unwrap_or_default();

        Ok(Self {
            certificate,
            private_key,
            chain,
        })
    }

    /// The leaf certificate.
    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    /// The private key matching the leaf certificate.
    pub fn private_key(&self) -> &PKey<Private> {
        &self.private_key
    }

    /// Intermediate certificates shipped in the bundle.
    pub fn chain(&self) -> &[X509] {
        &self.chain
    }

    /// Build a TLS client identity from the bundle.
    pub fn tls_identity(&self) -> Result<reqwest::Identity> {
        let mut pem = self.private_key.private_key_to_pem_pkcs8()?;
        pem.extend(self.certificate.to_pem()?);
        for cert in &self.chain {
            pem.extend(cert.to_pem()?);
        }

        reqwest::Identity::from_pem(&pem)
            .map_err(|e| PushError::InvalidCertificate(e.to_string()))
    }
}

impl fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("subject", &self.certificate.subject_name())
            .field("chain", &self.chain.len())
            .finish()
    }
}

/// Credentials plus their lazily decoded key material.
///
/// Each piece is parsed at most once, even under concurrent first use. A
/// failed parse is not cached, so every caller sees the error.
pub struct CredentialStore {
    credentials: Credentials,
    signing_key: OnceCell<EncodingKey>,
    safari_bundle: OnceCell<CertificateBundle>,
}

impl CredentialStore {
    /// Wrap credentials. Nothing is decoded yet.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            signing_key: OnceCell::new(),
            safari_bundle: OnceCell::new(),
        }
    }

    /// The raw credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The ES256 signing key.
    pub fn signing_key(&self) -> Result<&EncodingKey> {
        self.signing_key
            .get_or_try_init(|| decode_signing_key(&self.credentials.auth_key))
    }

    /// The Safari certificate bundle.
    pub fn safari_bundle(&self) -> Result<&CertificateBundle> {
        self.safari_bundle.get_or_try_init(|| {
            let der = self.credentials.safari_cert.as_deref().ok_or_else(|| {
                PushError::Config("no Safari certificate configured".to_string())
            })?;
            CertificateBundle::from_pkcs12(der)
        })
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("credentials", &self.credentials)
            .field("signing_key", &self.signing_key.get().map(|_| "<redacted>"))
            .field("safari_bundle", &self.safari_bundle.get())
            .finish()
    }
}

/// Decode a PEM-wrapped PKCS#8 key and check it is on P-256.
fn decode_signing_key(pem: &[u8]) -> Result<EncodingKey> {
    let pem = std::str::from_utf8(pem)
        .map_err(|_| PushError::InvalidKey("key is not valid PEM text".to_string()))?;

    let secret = p256::SecretKey::from_pkcs8_pem(pem)
        .map_err(|e| PushError::InvalidKey(format!("not a PKCS#8 P-256 key: {}", e)))?;
    let der = secret
        .to_pkcs8_der()
        .map_err(|e| PushError::InvalidKey(e.to_string()))?;

    Ok(EncodingKey::from_ec_der(der.as_bytes()))
}
