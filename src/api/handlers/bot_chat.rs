//! Bot-builder chat handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{
    ChatResponse, CreateBotRequest, CreateBotResponse, SendMessageRequest, StartSessionRequest,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /ai-bot-chat/start-session` — Open a session with an initial
/// prompt. The first reply never signals `ready_to_create`.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    post,
    path = "/api/v1/ai-bot-chat/start-session",
    tag = "BotChat",
    summary = "Start a bot-builder session",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = ChatResponse),
    )
)]
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let reply = state
        .chat
        .start_session(req.user_id, &req.ai_model, &req.initial_prompt)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ChatResponse {
            session_id: reply.session_id,
            message: reply.message,
            ready_to_create: reply.ready_to_create,
            bot_config: reply.bot_config,
        }),
    ))
}

/// `POST /ai-bot-chat/send-message` — Continue a session.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] for unknown sessions.
#[utoipa::path(
    post,
    path = "/api/v1/ai-bot-chat/send-message",
    tag = "BotChat",
    summary = "Send a message in a session",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let reply = state
        .chat
        .send_message(req.user_id, req.session_id, &req.message_content, &req.ai_model)
        .await?;

    Ok(Json(ChatResponse {
        session_id: reply.session_id,
        message: reply.message,
        ready_to_create: reply.ready_to_create,
        bot_config: reply.bot_config,
    }))
}

/// `POST /ai-bot-chat/create-bot` — Persist the confirmed config.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] for unknown sessions.
#[utoipa::path(
    post,
    path = "/api/v1/ai-bot-chat/create-bot",
    tag = "BotChat",
    summary = "Create the bot from a confirmed config",
    request_body = CreateBotRequest,
    responses(
        (status = 201, description = "Bot created", body = CreateBotResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn create_bot(
    State(state): State<AppState>,
    Json(req): Json<CreateBotRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let bot_id = state
        .chat
        .create_bot(req.user_id, req.session_id, &req.bot_config)
        .await?;

    Ok((StatusCode::CREATED, Json(CreateBotResponse { bot_id })))
}

/// `GET /ai-bots/user/{user_id}` — List a user's bots.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/ai-bots/user/{user_id}",
    tag = "BotChat",
    summary = "List a user's bots",
    params(
        ("user_id" = Uuid, Path, description = "Owning user"),
    ),
    responses(
        (status = 200, description = "Bots, newest first", body = serde_json::Value),
    )
)]
pub async fn list_user_bots(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let bots = state.chat.list_bots(user_id).await?;
    Ok(Json(bots))
}

/// Bot-builder routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ai-bot-chat/start-session", post(start_session))
        .route("/ai-bot-chat/send-message", post(send_message))
        .route("/ai-bot-chat/create-bot", post(create_bot))
        .route("/ai-bots/user/{user_id}", get(list_user_bots))
}
