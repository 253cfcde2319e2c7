//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker trips / recovers:
//!     CircuitBreaker → FlagEffects::turn_off / turn_on (service.rs)
//!     → categories.rs (category → flag names)
//!     → set_flag per name → store.rs → document database
//!
//! Consumers:
//!     GET /api/admin/services → get_all_flags → { name: 0|1 }
//!     polled by the frontend (see client::ServicePoller)
//!
//! Background (monitor.rs):
//!     startup baseline read → periodic re-read → log out-of-band changes
//! ```
//!
//! # Design Decisions
//! - The database is the source of truth; no cross-process locking, last write wins
//! - Flags are created out of band (or seeded) and never deleted here
//! - Name lookups are case-insensitive exact matches against the known set

pub mod categories;
pub mod flags;
pub mod monitor;
pub mod names;
pub mod service;
pub mod store;

use thiserror::Error;

use crate::resilience::ResilienceError;
use crate::store::StoreError;

pub use categories::CategoryTable;
pub use flags::{FlagSnapshot, FlagStatus, ServiceFlag};
pub use monitor::RegistryMonitor;
pub use service::ServiceRegistry;
pub use store::{DocumentFlagStore, FlagStore};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("service flag {0:?} not found")]
    FlagNotFound(String),

    #[error("registry store unavailable: {0}")]
    Unavailable(#[from] ResilienceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
