//! Database row models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A row from `crypto_transactions`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CryptoTransactionRow {
    /// Transaction ID.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// `deposit` or `withdrawal`.
    pub transaction_type: String,
    /// Currency code.
    pub currency: String,
    /// Settlement network code.
    pub network: String,
    /// Amount; zero for deposits until the webhook reports it.
    pub amount: Decimal,
    /// Lifecycle status.
    pub status: String,
    /// Pool address the user deposits to.
    pub deposit_address: Option<String>,
    /// Destination address for withdrawals.
    pub recipient_address: Option<String>,
    /// Memo reference (deposits) or batch id (withdrawals).
    pub reference: String,
    /// On-chain transaction hash, once known.
    pub transaction_hash: Option<String>,
    /// Observed confirmations.
    pub confirmations: i32,
    /// Platform fee charged.
    pub fee: Decimal,
    /// Linked ledger transaction.
    pub balance_transaction_id: Option<Uuid>,
    /// Batch number assigned by the payment gateway, once submitted.
    pub gateway_batch: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A row from `chat_sessions`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatSessionRow {
    /// Session ID.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Model requested when the session was opened.
    pub ai_model: String,
    /// Stored conversation stage.
    pub stage: String,
    /// Collected draft fields as JSONB.
    pub draft: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A row from `ai_bots`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AiBotRow {
    /// Bot ID.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Traded base coin.
    pub base_coin: String,
    /// Quote currency.
    pub quote_coin: String,
    /// Strategy keyword.
    pub strategy: String,
    /// Leverage multiplier.
    pub leverage: i32,
    /// Risk profile string.
    pub risk_profile: String,
    /// Advanced settings blob.
    pub advanced: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A row from `feed_entries`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedEntryRow {
    /// Entry ID.
    pub id: i64,
    /// English title.
    pub title: String,
    /// English body.
    pub content: String,
    /// Ingestion source tag.
    pub source: String,
    /// Cached Russian title, if translated.
    pub title_ru: Option<String>,
    /// Cached Russian body, if translated.
    pub content_ru: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A row from `user_profiles`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserProfileRow {
    /// Owning user.
    pub user_id: Uuid,
    /// Public URL slug.
    pub slug: String,
    /// Display name.
    pub display_name: String,
    /// Free-form bio.
    pub bio: String,
    /// Avatar URL, if set.
    pub avatar_url: Option<String>,
    /// Whether the profile is publicly visible.
    pub is_public: bool,
}

/// The single row of the `company_balance` view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompanyBalanceRow {
    /// Sum of completed top-ups.
    pub total_deposits: Decimal,
    /// Sum of completed withdrawals (positive number).
    pub total_withdrawals: Decimal,
    /// Sum of platform fees.
    pub total_fees: Decimal,
    /// Net ledger balance.
    pub net_balance: Decimal,
}

/// A row of the `company_balance_monthly` view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MonthlyBalanceRow {
    /// First instant of the month.
    pub month: DateTime<Utc>,
    /// Deposits in that month.
    pub deposits: Decimal,
    /// Withdrawals in that month (positive number).
    pub withdrawals: Decimal,
    /// Fees in that month.
    pub fees: Decimal,
}

/// One line of the user report pushed to the spreadsheet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserReportRow {
    /// User ID.
    pub user_id: Uuid,
    /// Profile slug, when the user has one.
    pub slug: Option<String>,
    /// Display name, when the user has one.
    pub display_name: Option<String>,
    /// Current account balance.
    pub balance: Decimal,
    /// Number of bots the user created.
    pub bot_count: i64,
}

/// Result of a successful deposit credit.
#[derive(Debug, Clone)]
pub struct CreditedDeposit {
    /// User whose balance was credited.
    pub user_id: Uuid,
    /// Credited amount.
    pub amount: Decimal,
    /// Crypto transaction that was confirmed.
    pub crypto_transaction_id: Uuid,
}
