//! Slug validation and public profile handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{PublicProfileResponse, ValidateSlugRequest, ValidateSlugResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /validate-slug` — Check slug format and availability.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    post,
    path = "/api/v1/validate-slug",
    tag = "Profiles",
    summary = "Validate a profile slug",
    request_body = ValidateSlugRequest,
    responses(
        (status = 200, description = "Validation outcome", body = ValidateSlugResponse),
    )
)]
pub async fn validate_slug(
    State(state): State<AppState>,
    Json(req): Json<ValidateSlugRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let check = state.profiles.check_slug(&req.slug, req.user_id).await?;
    Ok(Json(ValidateSlugResponse {
        valid: check.valid,
        available: check.available,
        reason: check.reason,
    }))
}

/// `GET /public/profile/{slug}` — Public profile page data. A private
/// profile is indistinguishable from a missing one.
///
/// # Errors
///
/// Returns [`GatewayError::ProfileNotFound`] for unknown or private slugs.
#[utoipa::path(
    get,
    path = "/api/v1/public/profile/{slug}",
    tag = "Profiles",
    summary = "Fetch a public profile",
    params(
        ("slug" = String, Path, description = "Profile slug"),
    ),
    responses(
        (status = 200, description = "Public profile", body = PublicProfileResponse),
        (status = 404, description = "Unknown or private profile", body = ErrorResponse),
    )
)]
pub async fn public_profile(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let profile = state.profiles.public_profile(&slug).await?;
    Ok(Json(PublicProfileResponse {
        slug: profile.slug,
        display_name: profile.display_name,
        bio: profile.bio,
        avatar_url: profile.avatar_url,
    }))
}

/// Profile routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/validate-slug", post(validate_slug))
        .route("/public/profile/{slug}", get(public_profile))
}
