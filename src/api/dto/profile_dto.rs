//! DTOs for slug validation and public profiles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for `POST /validate-slug`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ValidateSlugRequest {
    /// Candidate slug.
    pub slug: String,
    /// When set, a slug already held by this user counts as available.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// Response body for `POST /validate-slug`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ValidateSlugResponse {
    /// `true` when the slug is well formed.
    pub valid: bool,
    /// `true` when no other user holds the slug.
    pub available: bool,
    /// Reason when invalid or unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Public view of a profile.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PublicProfileResponse {
    /// Profile slug.
    pub slug: String,
    /// Display name.
    pub display_name: String,
    /// Free-form bio.
    pub bio: String,
    /// Avatar URL, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}
