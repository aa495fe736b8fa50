// Courier - Apple push delivery for Rust
//
// APNs delivery with token authentication, Safari website push packages
// and their web service, and an optional FCM relay.

// Re-export core functionality
pub use courier_core::*;

// Re-export the delivery engine
pub use courier_push as push;

// Re-export optional crates
#[cfg(feature = "safari")]
pub use courier_safari as safari;

#[cfg(feature = "config")]
pub use courier_config as config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{Error, HttpMethod, HttpRequest, HttpResponse, Router, Server};

    pub use courier_push::prelude::*;

    #[cfg(feature = "safari")]
    pub use courier_safari::{DeviceRegistry, SafariOptions, SigningMaterial, WebsiteDescriptor};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_exposes_delivery_types() {
        assert_eq!(PushType::Voip.as_str(), "voip");
        assert_eq!(ResultCode::Ok.to_string(), "ok");
    }
}
