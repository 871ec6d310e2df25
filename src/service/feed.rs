//! News feed service: webhook ingestion and listing with cached
//! Russian translation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clients::AiClient;
use crate::error::GatewayError;
use crate::persistence::PgStore;

/// Entries kept after each ingestion-triggered cleanup.
const FEED_KEEP: i64 = 500;

/// Listing limit ceiling.
const MAX_LIST_LIMIT: i64 = 50;

/// Model used for on-demand translation.
const TRANSLATION_MODEL: &str = "gpt-4o-mini";

/// A feed entry in the requested language.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntryView {
    /// Entry ID.
    pub id: i64,
    /// Title in the requested language.
    pub title: String,
    /// Body in the requested language.
    pub content: String,
    /// Language actually served (`en` when a translation failed).
    pub language: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Orchestrates the news feed.
#[derive(Debug)]
pub struct FeedService {
    store: Arc<PgStore>,
    ai: Arc<AiClient>,
}

impl FeedService {
    /// Creates a new `FeedService`.
    #[must_use]
    pub fn new(store: Arc<PgStore>, ai: Arc<AiClient>) -> Self {
        Self { store, ai }
    }

    /// Ingests an AI-news webhook payload shaped like a chat completion
    /// and spawns a detached cleanup that trims the feed to its cap.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] when the payload carries no
    ///   completion content.
    /// - [`GatewayError::Database`] on persistence failure.
    pub async fn ingest_news(&self, payload: &serde_json::Value) -> Result<i64, GatewayError> {
        let content = payload
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::InvalidRequest("payload carries no completion content".to_string())
            })?;

        let (title, body) = split_title(content);
        let id = self.store.insert_feed_entry(&title, body, "ai_news").await?;
        tracing::info!(entry_id = id, "feed entry ingested");

        // Detached trim; its failure only costs disk, never the request.
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match store.trim_feed_entries(FEED_KEEP).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "feed trimmed"),
                Err(e) => tracing::warn!(error = %e, "feed trim failed"),
            }
        });

        Ok(id)
    }

    /// Lists feed entries, newest first. For `language = "ru"` entries
    /// are served from the translation cache, translating and caching on
    /// demand; a failed translation serves the English original instead
    /// of failing the request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on persistence failure.
    pub async fn list(
        &self,
        limit: Option<i64>,
        language: Option<&str>,
    ) -> Result<Vec<FeedEntryView>, GatewayError> {
        let limit = limit.unwrap_or(20).clamp(1, MAX_LIST_LIMIT);
        let rows = self.store.list_feed_entries(limit).await?;
        let want_russian = language.is_some_and(|l| l.eq_ignore_ascii_case("ru"));

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            if !want_russian {
                entries.push(FeedEntryView {
                    id: row.id,
                    title: row.title,
                    content: row.content,
                    language: "en".to_string(),
                    created_at: row.created_at,
                });
                continue;
            }

            if let (Some(title_ru), Some(content_ru)) = (&row.title_ru, &row.content_ru) {
                entries.push(FeedEntryView {
                    id: row.id,
                    title: title_ru.clone(),
                    content: content_ru.clone(),
                    language: "ru".to_string(),
                    created_at: row.created_at,
                });
                continue;
            }

            match self.translate_pair(&row.title, &row.content).await {
                Ok((title_ru, content_ru)) => {
                    self.store
                        .cache_feed_translation(row.id, &title_ru, &content_ru)
                        .await?;
                    entries.push(FeedEntryView {
                        id: row.id,
                        title: title_ru,
                        content: content_ru,
                        language: "ru".to_string(),
                        created_at: row.created_at,
                    });
                }
                Err(e) => {
                    tracing::warn!(entry_id = row.id, error = %e, "translation failed");
                    entries.push(FeedEntryView {
                        id: row.id,
                        title: row.title,
                        content: row.content,
                        language: "en".to_string(),
                        created_at: row.created_at,
                    });
                }
            }
        }
        Ok(entries)
    }

    async fn translate_pair(
        &self,
        title: &str,
        content: &str,
    ) -> Result<(String, String), GatewayError> {
        let title_ru = self.ai.translate(TRANSLATION_MODEL, title, "Russian").await?;
        let content_ru = self.ai.translate(TRANSLATION_MODEL, content, "Russian").await?;
        Ok((title_ru, content_ru))
    }
}

/// Derives a title from the first non-empty line, stripped of markdown
/// heading markers and capped at 120 characters.
fn split_title(content: &str) -> (String, &str) {
    let first_line = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("Market update");
    let title: String = first_line
        .trim_start_matches(['#', ' '])
        .chars()
        .take(120)
        .collect();
    let title = if title.is_empty() {
        "Market update".to_string()
    } else {
        title
    };
    (title, content)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn title_comes_from_first_nonempty_line() {
        let (title, body) = split_title("\n## BTC rallies\nDetails follow.");
        assert_eq!(title, "BTC rallies");
        assert!(body.contains("Details follow."));
    }

    #[test]
    fn long_titles_are_capped() {
        let long = "x".repeat(300);
        let (title, _) = split_title(&long);
        assert_eq!(title.chars().count(), 120);
    }

    #[test]
    fn empty_content_gets_a_default_title() {
        let (title, _) = split_title("   \n  ");
        assert_eq!(title, "Market update");
    }
}
