//! # Courier Push
//!
//! Apple Push Notification service delivery, plus a Firebase Cloud Messaging
//! relay.
//!
//! ## Features
//!
//! - **Provider tokens**: ES256 tokens cached for 59 minutes and refreshed
//!   when APNs reports them expired
//! - **Pre-flight checks**: oversized payloads never reach the network
//! - **Result taxonomy**: every response maps to one [`ResultCode`]
//! - **Safari web push**: delivered over a client authenticated with the
//!   website push certificate
//! - **FCM relay**: HTTP v1 messages with service account auth
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier_push::{AlertPush, ApnsClient, ApnsEnvironment, Credentials, Push};
//!
//! let credentials = Credentials::from_p8_file("TEAMID", "KEYID", "com.example.app", "AuthKey.p8")?;
//! let client = ApnsClient::new(credentials, ApnsEnvironment::Production)?;
//!
//! let push = Push::Alert(AlertPush {
//!     token: device_token,
//!     title: "Hello".into(),
//!     body: "From courier".into(),
//!     ..Default::default()
//! });
//!
//! let result = client.push(&push, None).await;
//! match result.code {
//!     ResultCode::Ok => {}
//!     ResultCode::RetryNow | ResultCode::RetryLater => requeue(push),
//!     _ => drop_device(result),
//! }
//! ```

mod client;
mod credentials;
mod error;
mod headers;
mod payload;
mod result;
mod token;

#[cfg(feature = "relay")]
pub mod relay;

pub use client::{ApnsClient, ApnsEnvironment};
pub use credentials::{CertificateBundle, CredentialStore, Credentials};
pub use error::{PushError, Result};
pub use headers::{Headers, PushType};
pub use payload::{Alert, AlertPush, Aps, BackgroundPush, Payload, Push, VoipPush, WebPush};
pub use result::{Classification, DeliveryError, DeliveryResult, ResultCode, classify};
pub use token::{Clock, SystemClock, TOKEN_LIFETIME, TokenManager};

/// Prelude for common imports.
///
/// ```
/// use courier_push::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::{ApnsClient, ApnsEnvironment};
    pub use crate::credentials::Credentials;
    pub use crate::error::{PushError, Result};
    pub use crate::headers::{Headers, PushType};
    pub use crate::payload::{AlertPush, BackgroundPush, Push, VoipPush, WebPush};
    pub use crate::result::{DeliveryResult, ResultCode};

    #[cfg(feature = "relay")]
    pub use crate::relay::{RelayClient, RelayCode, RelayResult};
}
