//! Bearer-authenticated admin routes.
//!
//! `GET /api/admin/services` stays public (see `http::routes`) since every
//! frontend polls it; only mutations and diagnostics sit behind the key.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/services/{name}", put(set_service))
        .route("/api/admin/breakers", get(get_breakers))
        .layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
