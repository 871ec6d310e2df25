//! Public profile lookups and slug validation.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::slug::validate_slug;
use crate::error::GatewayError;
use crate::persistence::models::UserProfileRow;
use crate::persistence::PgStore;

/// Outcome of a slug check.
#[derive(Debug, Clone)]
pub struct SlugCheck {
    /// `true` when the slug is well formed.
    pub valid: bool,
    /// `true` when no other user holds the slug.
    pub available: bool,
    /// Reason when invalid or unavailable.
    pub reason: Option<String>,
}

/// Orchestrates public profile reads.
#[derive(Debug)]
pub struct ProfileService {
    store: Arc<PgStore>,
}

impl ProfileService {
    /// Creates a new `ProfileService`.
    #[must_use]
    pub fn new(store: Arc<PgStore>) -> Self {
        Self { store }
    }

    /// Checks slug format and availability. A slug held by `user_id`
    /// itself counts as available, so users can re-save their own page.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on persistence failure.
    pub async fn check_slug(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<SlugCheck, GatewayError> {
        if let Err(reason) = validate_slug(slug) {
            return Ok(SlugCheck {
                valid: false,
                available: false,
                reason: Some(reason),
            });
        }

        let holder = self.store.profile_by_slug(slug).await?;
        let available = match holder {
            None => true,
            Some(profile) => user_id == Some(profile.user_id),
        };

        Ok(SlugCheck {
            valid: true,
            available,
            reason: (!available).then(|| "slug already taken".to_string()),
        })
    }

    /// Fetches a public profile by slug. A private profile is
    /// indistinguishable from a missing one.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::ProfileNotFound`] for unknown or private slugs.
    /// - [`GatewayError::Database`] on persistence failure.
    pub async fn public_profile(&self, slug: &str) -> Result<UserProfileRow, GatewayError> {
        self.store
            .profile_by_slug(slug)
            .await?
            .filter(|p| p.is_public)
            .ok_or_else(|| GatewayError::ProfileNotFound(slug.to_string()))
    }
}
