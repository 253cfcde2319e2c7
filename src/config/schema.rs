//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::registry::names::{ANALYTICS, FEEDBACK, GAME_CATALOG, SEARCH_CATEGORY, USER_LIBRARY};

/// Root configuration for the GameVerse backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry and breaker settings per failure category.
    pub breakers: BreakersConfig,

    /// Service registry (feature flags) settings.
    pub registry: RegistryConfig,

    /// Document store backend.
    pub store: StoreConfig,

    /// Third-party game catalog API.
    pub catalog: CatalogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    ///
    /// Must exceed the longest retry schedule or slow dependencies are cut
    /// off before their breaker can trip.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Retry policy plus cooldown for one breaker.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,

    /// Cap for the exponential delay in milliseconds.
    pub max_delay_ms: u64,

    /// Retries after the first attempt (0 = single attempt).
    pub max_retries: u32,

    /// How long the breaker stays open in milliseconds.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl BreakerConfig {
    pub const fn new(base_delay_ms: u64, max_delay_ms: u64, max_retries: u32) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
            max_retries,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self::new(500, 20_000, 5)
    }
}

const DEFAULT_COOLDOWN_MS: u64 = 10_000;

fn default_cooldown_ms() -> u64 {
    DEFAULT_COOLDOWN_MS
}

/// Breaker settings for each guarded dependency.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakersConfig {
    pub game_api: BreakerConfig,
    pub user_store: BreakerConfig,
    pub comment_store: BreakerConfig,
    /// Guards the registry's own flag lookups; has no flags of its own.
    pub registry_store: BreakerConfig,
}

impl Default for BreakersConfig {
    fn default() -> Self {
        Self {
            game_api: BreakerConfig::new(200, 2500, 5),
            user_store: BreakerConfig::new(300, 3000, 5),
            comment_store: BreakerConfig::new(200, 3000, 5),
            registry_store: BreakerConfig::new(300, 3000, 5),
        }
    }
}

/// Which service flags each failure category flips together.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub game_api: Vec<String>,
    pub user_store: Vec<String>,
    pub comment_store: Vec<String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            game_api: vec![
                SEARCH_CATEGORY.to_string(),
                GAME_CATALOG.to_string(),
                ANALYTICS.to_string(),
            ],
            user_store: vec![USER_LIBRARY.to_string()],
            comment_store: vec![FEEDBACK.to_string()],
        }
    }
}

/// Service registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Known service flag names; lookups outside this set fail.
    pub services: Vec<String>,

    /// Category → flag names table.
    pub categories: CategoryConfig,

    /// Delay before the reconciliation loop starts, in milliseconds.
    pub startup_delay_ms: u64,

    /// Reconciliation poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Random extra delay added to each poll, in milliseconds.
    pub poll_jitter_ms: u64,

    /// Re-apply flag actions when a flag changes out of band.
    pub reconcile: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            services: [SEARCH_CATEGORY, USER_LIBRARY, GAME_CATALOG, ANALYTICS, FEEDBACK]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            categories: CategoryConfig::default(),
            startup_delay_ms: 1000,
            poll_interval_ms: 9000,
            poll_jitter_ms: 2000,
            reconcile: true,
        }
    }
}

/// Document store backend kind.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store, lost on restart.
    Memory,
    /// CouchDB/Cloudant-compatible HTTP API.
    CouchDb,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Base URL of the document service (couchdb backend).
    pub url: String,

    /// Bearer token for the document service; empty disables the header.
    pub api_key: String,

    pub users_db: String,
    pub comments_db: String,
    pub registry_db: String,

    /// Memory backend: create every known service flag with status 1.
    pub seed_registry: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: "http://localhost:5984".to_string(),
            api_key: String::new(),
            users_db: "gameverse-users-db".to_string(),
            comments_db: "gameverse-comments-db".to_string(),
            registry_db: "gameverse-service-registry".to_string(),
            seed_registry: true,
        }
    }
}

/// Game catalog API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,

    /// API key; empty falls back to the `EXTERNAL_API_KEY` environment variable.
    pub api_key: String,

    /// Page size used when a request does not specify one.
    pub default_page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.rawg.io/api".to_string(),
            api_key: String::new(),
            default_page_size: 24,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
