//! Bot-builder chat service.
//!
//! Wraps the pure conversation state machine from [`crate::domain::chat`]
//! with persistence and the AI provider. The stage and draft live on the
//! session row; message history is append-only.

use std::sync::Arc;

use uuid::Uuid;

use crate::clients::AiClient;
use crate::domain::chat::{advance_conversation, BotCreationStage, BotDraft};
use crate::domain::{BotConfig, SessionId};
use crate::error::GatewayError;
use crate::persistence::models::AiBotRow;
use crate::persistence::PgStore;

/// Assistant reply plus creation signal, returned by both session
/// operations.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Session the reply belongs to.
    pub session_id: SessionId,
    /// Assistant message text (config block included when ready).
    pub message: String,
    /// `true` when `bot_config` is populated and the client may call
    /// create-bot.
    pub ready_to_create: bool,
    /// Generated configuration, present only when ready.
    pub bot_config: Option<BotConfig>,
}

/// Orchestrates bot-builder conversations.
#[derive(Debug)]
pub struct ChatService {
    store: Arc<PgStore>,
    ai: Arc<AiClient>,
}

impl ChatService {
    /// Creates a new `ChatService`.
    #[must_use]
    pub fn new(store: Arc<PgStore>, ai: Arc<AiClient>) -> Self {
        Self { store, ai }
    }

    /// Opens a session and processes the initial prompt. The first reply
    /// always has `ready_to_create = false`, whatever the prompt contains.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on persistence failure.
    pub async fn start_session(
        &self,
        user_id: Uuid,
        ai_model: &str,
        initial_prompt: &str,
    ) -> Result<ChatReply, GatewayError> {
        let session_id = SessionId::new();
        let mut draft = BotDraft::default();
        let turn = advance_conversation(&mut draft, initial_prompt, 0);

        let draft_json =
            serde_json::to_value(&draft).map_err(|e| GatewayError::Internal(e.to_string()))?;
        self.store
            .create_session(session_id, user_id, ai_model, turn.stage.as_str(), &draft_json)
            .await?;
        self.store
            .save_message(session_id, "user", initial_prompt, ai_model)
            .await?;
        self.store
            .save_message(session_id, "assistant", &turn.reply, ai_model)
            .await?;

        tracing::info!(%session_id, %user_id, ai_model, "chat session opened");

        Ok(ChatReply {
            session_id,
            message: turn.reply,
            ready_to_create: false,
            bot_config: None,
        })
    }

    /// Processes one user message in an existing session.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::SessionNotFound`] for an unknown session.
    /// - [`GatewayError::InvalidRequest`] when the session belongs to a
    ///   different user.
    /// - [`GatewayError::Database`] on persistence failure.
    pub async fn send_message(
        &self,
        user_id: Uuid,
        session_id: SessionId,
        message_content: &str,
        ai_model: &str,
    ) -> Result<ChatReply, GatewayError> {
        let session = self.store.session(session_id).await?;
        if session.user_id != user_id {
            return Err(GatewayError::InvalidRequest(
                "session belongs to a different user".to_string(),
            ));
        }

        if BotCreationStage::from_str_or_start(&session.stage) == BotCreationStage::Created {
            return Ok(ChatReply {
                session_id,
                message: "This bot has already been created. Start a new session to build \
                          another one."
                    .to_string(),
                ready_to_create: false,
                bot_config: None,
            });
        }

        let mut draft: BotDraft =
            serde_json::from_value(session.draft.clone()).unwrap_or_default();
        let assistant_turns = self.store.assistant_turns(session_id).await?;

        self.store
            .save_message(session_id, "user", message_content, ai_model)
            .await?;

        let turn = advance_conversation(&mut draft, message_content, assistant_turns);

        let (message, bot_config) = if turn.ready_to_create {
            let config = self.resolve_config(ai_model, &draft).await;
            let config_json = serde_json::to_string_pretty(&config)
                .map_err(|e| GatewayError::Internal(e.to_string()))?;
            (
                format!("{}\n\n```json\n{config_json}\n```", turn.reply),
                Some(config),
            )
        } else {
            (turn.reply, None)
        };

        self.store
            .save_message(session_id, "assistant", &message, ai_model)
            .await?;
        let draft_json =
            serde_json::to_value(&draft).map_err(|e| GatewayError::Internal(e.to_string()))?;
        self.store
            .update_session(session_id, turn.stage.as_str(), &draft_json)
            .await?;

        Ok(ChatReply {
            session_id,
            message,
            ready_to_create: turn.ready_to_create,
            bot_config,
        })
    }

    /// Persists a bot from the confirmed config and closes the session.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::SessionNotFound`] for an unknown session.
    /// - [`GatewayError::InvalidRequest`] when the session belongs to a
    ///   different user.
    /// - [`GatewayError::Database`] on persistence failure.
    pub async fn create_bot(
        &self,
        user_id: Uuid,
        session_id: SessionId,
        config: &BotConfig,
    ) -> Result<Uuid, GatewayError> {
        let session = self.store.session(session_id).await?;
        if session.user_id != user_id {
            return Err(GatewayError::InvalidRequest(
                "session belongs to a different user".to_string(),
            ));
        }

        let bot_id = self.store.create_bot(user_id, session_id, config).await?;
        tracing::info!(%bot_id, %session_id, %user_id, "bot created");
        Ok(bot_id)
    }

    /// Lists the user's bots, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on persistence failure.
    pub async fn list_bots(&self, user_id: Uuid) -> Result<Vec<AiBotRow>, GatewayError> {
        self.store.list_bots(user_id).await
    }

    /// Gets the config from the AI provider, falling back to the
    /// deterministic template. A provider config that contradicts the
    /// user's chosen coin is discarded; the draft is authoritative.
    async fn resolve_config(&self, ai_model: &str, draft: &BotDraft) -> BotConfig {
        let fallback = BotConfig::from_draft(draft).unwrap_or_else(|| BotConfig {
            name: "Trading Bot".to_string(),
            base_coin: "BTC".to_string(),
            quote_coin: "USDT".to_string(),
            strategy: "momentum".to_string(),
            leverage: 1,
            risk_profile: crate::domain::RiskProfile::Balanced,
            advanced_settings: crate::domain::bot_config::AdvancedSettings::for_risk(
                crate::domain::RiskProfile::Balanced,
            ),
        });

        match self.ai.generate_bot_config(ai_model, draft).await {
            Ok(Some(config)) if config.base_coin == fallback.base_coin => config,
            Ok(Some(config)) => {
                tracing::warn!(
                    provider_coin = %config.base_coin,
                    chosen_coin = %fallback.base_coin,
                    "provider config contradicts the draft, using template"
                );
                fallback
            }
            Ok(None) => fallback,
            Err(e) => {
                tracing::warn!(error = %e, "provider config generation failed, using template");
                fallback
            }
        }
    }
}
