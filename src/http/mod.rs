//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, tracing, timeout, request metrics)
//!     → routes.rs (public API) | admin (bearer-authenticated)
//!     → registry / catalog / comments / library
//!     → error.rs (domain error → status code + JSON body)
//! ```

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ServerError};
pub use server::{build_router, AppState, HttpServer};
