//! DTOs for the bot-builder chat endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{BotConfig, SessionId};

/// Request body for `POST /ai-bot-chat/start-session`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct StartSessionRequest {
    /// Requesting user.
    pub user_id: Uuid,
    /// Model to attribute the conversation to (e.g. `"grok-2"`).
    pub ai_model: String,
    /// The user's opening message.
    pub initial_prompt: String,
}

/// Request body for `POST /ai-bot-chat/send-message`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    /// Requesting user.
    pub user_id: Uuid,
    /// Session to continue.
    #[schema(value_type = uuid::Uuid)]
    pub session_id: SessionId,
    /// Message text.
    pub message_content: String,
    /// Model to attribute the turn to.
    pub ai_model: String,
}

/// Response body for both chat operations.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChatResponse {
    /// Session the reply belongs to.
    #[schema(value_type = uuid::Uuid)]
    pub session_id: SessionId,
    /// Assistant reply (config block embedded when ready).
    pub message: String,
    /// `true` when `bot_config` is populated.
    pub ready_to_create: bool,
    /// Generated configuration, present only when ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub bot_config: Option<BotConfig>,
}

/// Request body for `POST /ai-bot-chat/create-bot`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateBotRequest {
    /// Requesting user.
    pub user_id: Uuid,
    /// Session that produced the config.
    #[schema(value_type = uuid::Uuid)]
    pub session_id: SessionId,
    /// Confirmed configuration.
    #[schema(value_type = Object)]
    pub bot_config: BotConfig,
}

/// Response body for `POST /ai-bot-chat/create-bot`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreateBotResponse {
    /// ID of the persisted bot.
    pub bot_id: Uuid,
}
