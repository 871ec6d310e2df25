//! Shared application state injected into all Axum handlers.
//!
//! Everything is constructed once in `main` and handed to the router;
//! there are no module-level singletons, so tests can assemble a state
//! from whatever fakes they need.

use std::sync::Arc;

use crate::service::{ChatService, FeedService, LedgerService, ProfileService, SheetsSyncService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Crypto ledger flows.
    pub ledger: Arc<LedgerService>,
    /// Bot-builder chat flows.
    pub chat: Arc<ChatService>,
    /// News feed flows.
    pub feed: Arc<FeedService>,
    /// Public profile reads.
    pub profiles: Arc<ProfileService>,
    /// Spreadsheet reporting sync.
    pub sheets_sync: Arc<SheetsSyncService>,
}
