//! Service layer: business logic orchestration.
//!
//! Each service owns the store plus whichever external clients its flows
//! need; handlers stay thin mappings from DTOs onto these methods.

pub mod chat;
pub mod feed;
pub mod ledger;
pub mod profile;
pub mod sheets_sync;

pub use chat::ChatService;
pub use feed::FeedService;
pub use ledger::LedgerService;
pub use profile::ProfileService;
pub use sheets_sync::SheetsSyncService;
