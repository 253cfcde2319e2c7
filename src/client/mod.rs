//! Consumer side of the service flag polling contract.
//!
//! # Data Flow
//! ```text
//! ServicePoller (poller.rs)
//!     every ~10s: GET /api/admin/services → { name: 0|1 }
//!     → ArcSwap<ServiceStatus>
//!
//! ServiceStatus (status.rs)
//!     is_active / is_active_and_loaded / is_active_or_loading
//! ```
//!
//! Propagation is pull-only; flags may be several seconds stale.

pub mod poller;
pub mod status;

pub use poller::{ServicePoller, DEFAULT_POLL_INTERVAL};
pub use status::ServiceStatus;
