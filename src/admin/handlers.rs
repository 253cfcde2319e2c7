use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::registry::{FlagStatus, ServiceFlag};
use crate::resilience::BreakerSnapshot;

#[derive(Debug, Deserialize)]
pub struct SetFlagRequest {
    pub status: FlagStatus,
}

/// `PUT /api/admin/services/{name}`
pub async fn set_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<SetFlagRequest>,
) -> Result<Json<ServiceFlag>, ApiError> {
    tracing::info!(service = %name, status = %body.status, "Admin flag update");
    Ok(Json(state.registry.set_flag(&name, body.status).await?))
}

/// `GET /api/admin/breakers`
pub async fn get_breakers(State(state): State<AppState>) -> Json<Vec<BreakerSnapshot>> {
    Json(state.breakers())
}
