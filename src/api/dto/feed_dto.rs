//! DTOs for the news feed endpoints.

use serde::Deserialize;

/// Query parameters for `GET /feed/entries`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct FeedParams {
    /// Maximum rows to return; clamped to 50.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Requested language (`en` default, `ru` served from the
    /// translation cache).
    #[serde(default)]
    pub language: Option<String>,
}
