//! REST endpoint handlers organized by resource.

pub mod bot_chat;
pub mod crypto;
pub mod feed;
pub mod profile;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(crypto::routes())
        .merge(bot_chat::routes())
        .merge(feed::routes())
        .merge(profile::routes())
}
