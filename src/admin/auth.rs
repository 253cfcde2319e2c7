use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

/// Reject requests whose `Authorization` header is not `Bearer <admin key>`.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if !state.admin_key.is_empty() && token == &*state.admin_key => Ok(next.run(request).await),
        _ => {
            tracing::debug!(path = %request.uri().path(), "Rejected admin request");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
