//! System endpoints: health check and admin triggers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::error::GatewayError;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `POST /api/v1/admin/sheets-sync` — Trigger a full spreadsheet sync.
///
/// # Errors
///
/// Returns [`GatewayError`] from whichever sync step failed.
#[utoipa::path(
    post,
    path = "/api/v1/admin/sheets-sync",
    tag = "System",
    summary = "Run the spreadsheet sync now",
    responses(
        (status = 200, description = "Sync completed", body = serde_json::Value),
        (status = 502, description = "Database or Sheets API failure"),
    )
)]
pub async fn sheets_sync_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let report = state.sheets_sync.run_sync().await?;
    Ok(Json(json!({
        "balance_rows": report.balance_rows,
        "user_rows": report.user_rows,
    })))
}

/// System routes. The health check stays at the root level; the admin
/// trigger lives under the API prefix.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/admin/sheets-sync", post(sheets_sync_handler))
}
