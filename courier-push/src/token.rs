//! Provider token lifecycle.
//!
//! APNs rejects tokens older than an hour and throttles providers that
//! regenerate too often, so one signed token is shared by every send and
//! replaced only when it ages out or the server asks for a new one.

use jsonwebtoken::{Algorithm, Header, encode};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::{CredentialStore, Result};

/// How long a generated token is reused.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(59 * 60);

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    iat: u64,
}

#[derive(Default)]
struct CachedToken {
    value: String,
    generated: Option<SystemTime>,
}

/// Caches the signed provider token.
pub struct TokenManager {
    store: Arc<CredentialStore>,
    clock: Arc<dyn Clock>,
    cached: Mutex<CachedToken>,
}

impl TokenManager {
    /// Create a token manager on the system clock.
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a token manager on a custom clock.
    pub fn with_clock(store: Arc<CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cached: Mutex::new(CachedToken::default()),
        }
    }

    /// Return the cached token, regenerating it if it is missing or stale.
    pub fn get(&self) -> Result<String> {
        let mut cached = self.cached.lock();
        let now = self.clock.now();

        if let Some(generated) = cached.generated {
            // A clock that moved backwards counts as fresh.
            let age = now.duration_since(generated).unwrap_or_default();
            if age < TOKEN_LIFETIME {
                return Ok(cached.value.clone());
            }
        }

        let token = self.sign(now)?;
        cached.value = token.clone();
        cached.generated = Some(now);
        info!("Generated new APNs provider token");

        Ok(token)
    }

    /// Force regeneration on the next [`get`](Self::get).
    pub fn reset(&self) {
        self.cached.lock().generated = None;
        info!("APNs provider token reset");
    }

    /// When the cached token was generated.
    pub fn generated_at(&self) -> Option<SystemTime> {
        self.cached.lock().generated
    }

    fn sign(&self, now: SystemTime) -> Result<String> {
        let credentials = self.store.credentials();
        let key = self.store.signing_key()?;

        let mut header = Header::new(Algorithm::ES256);
        header.typ = None;
        header.kid = Some(credentials.key_id.clone());

        let claims = Claims {
            iss: &credentials.team_id,
            iat: now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs(),
        };

        Ok(encode(&header, &claims, key)?)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("generated_at", &self.generated_at())
            .finish()
    }
}
