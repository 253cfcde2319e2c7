//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to the composition root, which builds breakers and stores
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; breaker policies are constructor-time only
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, AppConfig, BreakerConfig, BreakersConfig, CatalogConfig, CategoryConfig,
    ListenerConfig, ObservabilityConfig, RegistryConfig, StoreBackend, StoreConfig,
};
