//! HTTP surface of the service.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → request.rs (assign / propagate x-request-id)
//!     → observability middleware (log, metrics, span)
//!     → response.rs (panic and handler errors → JSON error response)
//!     → handler (service routes, health, metrics)
//! ```
//!
//! server.rs assembles all of the above into one axum Router.

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::{HandlerError, HttpError};
pub use server::{build_router, RouteError};
