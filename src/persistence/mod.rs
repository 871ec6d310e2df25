//! Persistence layer: PostgreSQL store for accounts, the crypto ledger,
//! chat sessions, bots, the news feed, and public profiles.
//!
//! The concrete implementation uses `sqlx::PgPool` for async PostgreSQL
//! access. Consistency-critical mutations are wrapped in database
//! transactions here, never stitched together by callers.

pub mod models;
pub mod postgres;

pub use postgres::PgStore;
