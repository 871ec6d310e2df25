//! News feed handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::api::dto::FeedParams;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /feed/ai-news-webhook` — Ingest an AI-generated news item. The
/// payload is shaped like a chat completion; the first choice's content
/// becomes the entry.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for payloads without content.
#[utoipa::path(
    post,
    path = "/api/v1/feed/ai-news-webhook",
    tag = "Feed",
    summary = "Ingest an AI news completion",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Entry created", body = serde_json::Value),
        (status = 400, description = "Payload carries no content", body = ErrorResponse),
    )
)]
pub async fn ai_news_webhook(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, GatewayError> {
    let entry_id = state.feed.ingest_news(&payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "entry_id": entry_id }))))
}

/// `GET /feed/entries` — List feed entries, optionally in Russian.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/feed/entries",
    tag = "Feed",
    summary = "List feed entries",
    description = "Newest first. language=ru serves cached translations, translating on demand; a failed translation serves the English original.",
    params(FeedParams),
    responses(
        (status = 200, description = "Feed entries", body = serde_json::Value),
    )
)]
pub async fn list_entries(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let entries = state
        .feed
        .list(params.limit, params.language.as_deref())
        .await?;
    Ok(Json(entries))
}

/// Feed routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/feed/ai-news-webhook", post(ai_news_webhook))
        .route("/feed/entries", get(list_entries))
}
