use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use service_core::error::AppError;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "authapi-service")]
    pub service: String,
    #[schema(example = "1.0.0")]
    pub version: String,
}

/// Liveness plus a store round trip.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store are healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        service: state.config.service_name.clone(),
        version: state.config.service_version.clone(),
    }))
}

/// Prometheus text exposition; 404 when metrics are disabled.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
