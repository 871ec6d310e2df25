//! Chat-completion client for OpenAI-compatible providers.
//!
//! The platform talks to two providers through the same wire shape:
//! OpenAI and Grok (x.ai). The provider is resolved from the requested
//! model name. A provider without a configured API key yields a typed
//! error the callers treat as "fall back to the deterministic path".

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::domain::{BotConfig, BotDraft};
use crate::error::GatewayError;

/// One message in a chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// `system`, `user`, or `assistant`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

/// HTTP client for chat-completion providers.
#[derive(Debug)]
pub struct AiClient {
    http: reqwest::Client,
    config: AiConfig,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl AiClient {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AiProvider`] when the HTTP client cannot
    /// be constructed.
    pub fn new(config: AiConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::AiProvider(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Resolves (base URL, API key) from the model name. `grok-*` models
    /// go to x.ai, everything else to the OpenAI endpoint.
    fn provider_for(&self, model: &str) -> Result<(String, String), GatewayError> {
        let (base, key) = if model.starts_with("grok") {
            (&self.config.grok_base_url, &self.config.grok_api_key)
        } else {
            (&self.config.openai_base_url, &self.config.openai_api_key)
        };
        let key = key.clone().ok_or_else(|| {
            GatewayError::AiProvider(format!("no api key configured for model {model}"))
        })?;
        Ok((base.trim_end_matches('/').to_string(), key))
    }

    /// Sends one chat-completion request and returns the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AiProvider`] on missing credentials,
    /// transport failure, non-2xx status, or an empty completion.
    pub async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        let (base, key) = self.provider_for(model)?;
        let response = self
            .http
            .post(format!("{base}/v1/chat/completions"))
            .bearer_auth(key)
            .json(&CompletionRequest { model, messages })
            .send()
            .await
            .map_err(|e| GatewayError::AiProvider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::AiProvider(format!(
                "provider returned {status}: {body}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::AiProvider(format!("unparseable completion: {e}")))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GatewayError::AiProvider("completion has no choices".to_string()))
    }

    /// Asks the provider to turn a draft into a full bot config.
    ///
    /// Returns `Ok(None)` when the reply carries no parseable config;
    /// the caller falls back to the deterministic template.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AiProvider`] on transport-level failure.
    pub async fn generate_bot_config(
        &self,
        model: &str,
        draft: &BotDraft,
    ) -> Result<Option<BotConfig>, GatewayError> {
        let draft_json = serde_json::to_string(draft).unwrap_or_else(|_| "{}".to_string());
        let messages = [
            ChatMessage {
                role: "system",
                content: "You configure crypto trading bots. Answer with a single JSON object \
                          with the fields name, base_coin, quote_coin, strategy, leverage, \
                          risk_profile and advanced_settings {take_profit_pct, stop_loss_pct, \
                          max_open_positions}. No prose."
                    .to_string(),
            },
            ChatMessage {
                role: "user",
                content: format!("Create a bot configuration for this draft: {draft_json}"),
            },
        ];
        let reply = self.chat(model, &messages).await?;
        Ok(extract_json_block(&reply).and_then(|json| serde_json::from_str(json).ok()))
    }

    /// Translates text into the target language, returning the bare
    /// translation.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AiProvider`] on provider failure.
    pub async fn translate(
        &self,
        model: &str,
        text: &str,
        target_language: &str,
    ) -> Result<String, GatewayError> {
        let messages = [
            ChatMessage {
                role: "system",
                content: format!(
                    "Translate the user's text into {target_language}. \
                     Reply with the translation only."
                ),
            },
            ChatMessage {
                role: "user",
                content: text.to_string(),
            },
        ];
        self.chat(model, &messages).await
    }
}

/// Extracts the JSON payload from a completion reply: the body of a
/// ```` ```json ```` fence when present, otherwise the outermost braces.
#[must_use]
pub fn extract_json_block(reply: &str) -> Option<&str> {
    if let Some(start) = reply.find("```json") {
        let rest = reply.get(start + 7..)?;
        let end = rest.find("```")?;
        return rest.get(..end).map(str::trim);
    }
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    reply.get(start..=end)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn config_for(url: &str) -> AiConfig {
        AiConfig {
            openai_base_url: url.to_string(),
            openai_api_key: Some("sk-test".to_string()),
            grok_base_url: url.to_string(),
            grok_api_key: None,
        }
    }

    #[test]
    fn json_fence_is_extracted() {
        let reply = "Here you go:\n```json\n{\"name\":\"Bot\"}\n```\nEnjoy!";
        assert_eq!(extract_json_block(reply), Some("{\"name\":\"Bot\"}"));
    }

    #[test]
    fn bare_braces_are_extracted() {
        let reply = "config: {\"a\": {\"b\": 1}} done";
        assert_eq!(extract_json_block(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn no_json_yields_none() {
        assert_eq!(extract_json_block("no structured data here"), None);
    }

    #[tokio::test]
    async fn missing_api_key_is_a_typed_error() {
        let Ok(client) = AiClient::new(config_for("http://localhost:9")) else {
            panic!("client construction failed");
        };
        let result = client
            .chat("grok-2", &[ChatMessage { role: "user", content: "hi".to_string() }])
            .await;
        let Err(GatewayError::AiProvider(msg)) = result else {
            panic!("expected AiProvider error");
        };
        assert!(msg.contains("grok-2"));
    }

    #[tokio::test]
    async fn chat_returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"pong"}}]}"#)
            .create_async()
            .await;

        let Ok(client) = AiClient::new(config_for(&server.url())) else {
            panic!("client construction failed");
        };
        let result = client
            .chat("gpt-4o", &[ChatMessage { role: "user", content: "ping".to_string() }])
            .await;

        assert_eq!(result.ok().as_deref(), Some("pong"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unparseable_config_reply_falls_back_to_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"cannot help"}}]}"#)
            .create_async()
            .await;

        let Ok(client) = AiClient::new(config_for(&server.url())) else {
            panic!("client construction failed");
        };
        let result = client.generate_bot_config("gpt-4o", &BotDraft::default()).await;
        let Ok(config) = result else {
            panic!("transport should succeed");
        };
        assert!(config.is_none());
    }
}
