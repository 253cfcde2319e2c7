//! GameVerse service core.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum router, admin auth)
//!                        │
//!                        ├─▶ catalog  ──▶ [GameApi breaker]      ──▶ game catalog API
//!                        ├─▶ comments ──▶ [CommentStore breaker] ──▶ document store
//!                        ├─▶ library  ──▶ [UserStore breaker]    ──▶ document store
//!                        └─▶ registry ──▶ [registry breaker]     ──▶ document store
//!                                ▲
//!     breaker open / close ──────┘  (FlagEffects: flip the category's service flags)
//!
//!     Frontends poll GET /api/admin/services and hide disabled features
//!     (client::ServicePoller + ServiceStatus).
//! ```

// Core
pub mod registry;
pub mod resilience;
pub mod store;

// Features behind breakers
pub mod catalog;
pub mod comments;
pub mod library;

// Surfaces
pub mod admin;
pub mod client;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
