use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::AppState;

pub const SERVICE_NAME: &str = "Customer REST API Service";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIndex {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: u16,
    pub message: String,
}

pub async fn index() -> Json<ServiceIndex> {
    Json(ServiceIndex {
        name: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Checks the database with a trivial query; any failure reports the service unhealthy.
pub async fn healthcheck(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match customers_db::ping(&state.db_pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse { status: StatusCode::OK.as_u16(), message: "Healthy".to_string() }),
        ),
        Err(error) => {
            warn!(
                event_name = "system.health.degraded",
                correlation_id = "healthcheck",
                error = %error,
                "database check failed"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                    message: "Unhealthy".to_string(),
                }),
            )
        }
    }
}
