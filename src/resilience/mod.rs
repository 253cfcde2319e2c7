//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to an external dependency (catalog API, document store):
//!     → circuit_breaker.rs (fail fast while open, probe after cooldown)
//!     → retries.rs (attempt, back off, attempt again)
//!     → backoff.rs (min(base * 2^n, max) schedule)
//!     → on exhaustion: breaker opens, FlagEffects turn the category OFF
//! ```
//!
//! # Design Decisions
//! - One breaker per failure category, built once by the composition root
//! - Flag side effects are injected (`FlagEffects`), never looked up globally
//! - Errors are never swallowed: success, `RetriesExhausted` or `CircuitOpen`

pub mod backoff;
pub mod circuit_breaker;
pub mod error;
pub mod retries;

pub use backoff::{PolicyError, RetryPolicy};
pub use circuit_breaker::{BreakerSnapshot, BreakerState, CircuitBreaker, FlagEffects, NoFlagEffects};
pub use error::{BoxError, FailureCategory, ResilienceError};
pub use retries::Retrier;
