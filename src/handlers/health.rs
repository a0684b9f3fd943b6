use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};
use utoipa::ToSchema;

use crate::schemas::{ApiResponse, AppState, HealthResponse};

/// Information about the service and the work it builds on
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreditsResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub acknowledgements: Vec<String>,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 500, description = "Service is unhealthy", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    trace!("Entering health_check function");
    let db_status = match state.db.ping().await {
        Ok(_) => "connected".to_string(),
        Err(e) => {
            warn!("Database ping failed: {}", e);
            "disconnected".to_string()
        }
    };
    debug!("Database status: {}", db_status);

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

/// Credits page
#[utoipa::path(
    get,
    path = "/api/v1/credits",
    tag = "health",
    responses(
        (status = 200, description = "Service credits", body = ApiResponse<CreditsResponse>)
    )
)]
#[instrument]
pub async fn credits() -> (StatusCode, Json<ApiResponse<CreditsResponse>>) {
    trace!("Entering credits function");
    let data = CreditsResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Personal budget tracking with recurring incomes and expenses".to_string(),
        acknowledgements: vec![
            "axum".to_string(),
            "sea-orm".to_string(),
            "utoipa".to_string(),
            "tokio".to_string(),
        ],
    };
    (StatusCode::OK, Json(ApiResponse::ok(data, "Credits retrieved successfully")))
}
