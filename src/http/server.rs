//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the document store, registry, breakers and features (`AppState`)
//! - Create the Axum router with public and admin routes
//! - Wire up middleware (timeout, request ID, tracing, request metrics)
//! - Run the registry monitor next to the server until shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::catalog::GameCatalog;
use crate::comments::CommentStore;
use crate::config::{AppConfig, StoreBackend};
use crate::http::error::ServerError;
use crate::http::routes;
use crate::library::UserLibrary;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::{DocumentFlagStore, FlagStatus, RegistryMonitor, ServiceRegistry};
use crate::resilience::{BreakerSnapshot, CircuitBreaker, FailureCategory, FlagEffects, NoFlagEffects};
use crate::store::{CouchStore, DocumentStore, MemoryDocumentStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
    pub flags: Arc<DocumentFlagStore>,
    pub catalog: Arc<GameCatalog>,
    pub comments: Arc<CommentStore>,
    pub library: Arc<UserLibrary>,
    pub admin_key: Arc<str>,
}

impl AppState {
    /// Build the state over the store selected by `config.store.backend`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, ServerError> {
        let store: Arc<dyn DocumentStore> = match config.store.backend {
            StoreBackend::Memory => Arc::new(MemoryDocumentStore::new()),
            StoreBackend::CouchDb => {
                let key = Some(config.store.api_key.clone()).filter(|k| !k.is_empty());
                Arc::new(CouchStore::new(&config.store.url, key)?)
            }
        };
        Self::with_store(config, store).await
    }

    /// Build the state over an existing document store.
    ///
    /// The three feature breakers report to the registry; the registry's
    /// own store breaker reports nowhere.
    pub async fn with_store(config: &AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, ServerError> {
        let breakers = &config.breakers;
        let registry_breaker =
            CircuitBreaker::from_config(FailureCategory::None, &breakers.registry_store, Arc::new(NoFlagEffects))?;
        let flags = Arc::new(DocumentFlagStore::new(
            store.clone(),
            config.store.registry_db.clone(),
            registry_breaker,
        ));

        if config.store.seed_registry && config.store.backend == StoreBackend::Memory {
            let created = flags.seed(&config.registry.services, FlagStatus::On).await?;
            tracing::info!(created, "Seeded service registry");
        }

        let registry = Arc::new(ServiceRegistry::from_config(flags.clone(), &config.registry));
        let effects: Arc<dyn FlagEffects> = registry.clone();

        let game_api = CircuitBreaker::from_config(FailureCategory::GameApi, &breakers.game_api, effects.clone())?;
        let user_store = CircuitBreaker::from_config(FailureCategory::UserStore, &breakers.user_store, effects.clone())?;
        let comment_store =
            CircuitBreaker::from_config(FailureCategory::CommentStore, &breakers.comment_store, effects)?;

        let catalog = GameCatalog::new(&config.catalog, Arc::new(game_api))?;
        let comments = CommentStore::new(store.clone(), config.store.comments_db.clone(), Arc::new(comment_store));
        let library = UserLibrary::new(store, config.store.users_db.clone(), Arc::new(user_store));

        Ok(Self {
            registry,
            flags,
            catalog: Arc::new(catalog),
            comments: Arc::new(comments),
            library: Arc::new(library),
            admin_key: Arc::from(config.admin.api_key.as_str()),
        })
    }

    /// Snapshot of every breaker, feature breakers first.
    pub fn breakers(&self) -> Vec<BreakerSnapshot> {
        vec![
            self.catalog.breaker().snapshot(),
            self.library.breaker().snapshot(),
            self.comments.breaker().snapshot(),
            self.flags.breaker().snapshot(),
        ]
    }
}

/// HTTP server for the GameVerse API.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub async fn new(config: AppConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config).await?;
        Ok(Self::with_state(config, state))
    }

    pub fn with_state(config: AppConfig, state: AppState) -> Self {
        let router = build_router(state.clone(), Duration::from_secs(config.timeouts.request_secs));
        Self { router, state, config }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        // Flags are read before the first request can trip a breaker.
        self.state.registry.load_baseline().await;

        let monitor = RegistryMonitor::new(self.state.registry.clone(), self.config.registry.clone());
        let monitor = tokio::spawn(monitor.run(shutdown.subscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.signalled())
            .await?;

        if let Err(e) = monitor.await {
            tracing::warn!(error = %e, "Registry monitor task failed");
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(routes::public_router())
        .merge(admin::setup_admin_router(state.clone()))
        .with_state(state)
        .layer(middleware::from_fn(track_requests))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}
