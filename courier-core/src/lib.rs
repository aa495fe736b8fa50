// Core HTTP plumbing for Courier web services
// Request/response types, a small path router and the hyper server loop that
// drives it. Push-specific handlers live in the crates that use this one.

pub mod error;
pub mod http;
pub mod routing;
pub mod server;

pub use error::{Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use routing::{HandlerFn, Route, Router};
pub use server::Server;
