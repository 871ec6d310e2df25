//! PostgreSQL store for all gateway state.
//!
//! Every multi-row mutation (deposit crediting, withdrawal debiting) runs
//! inside a single database transaction so the ledger, the account
//! balance, and the user notification can never drift apart.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    AiBotRow, ChatSessionRow, CompanyBalanceRow, CreditedDeposit, CryptoTransactionRow,
    FeedEntryRow, MonthlyBalanceRow, UserProfileRow, UserReportRow,
};
use crate::domain::{BotConfig, SessionId};
use crate::error::GatewayError;

/// Parameters for recording a new withdrawal.
#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    /// Owning user.
    pub user_id: Uuid,
    /// Batch reference returned to the client.
    pub batch_id: String,
    /// Currency code.
    pub currency: String,
    /// Network code.
    pub network: String,
    /// Withdrawn amount (positive).
    pub amount: Decimal,
    /// Platform fee (positive).
    pub fee: Decimal,
    /// Destination address.
    pub recipient_address: String,
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ── Crypto ledger ───────────────────────────────────────────────────

    /// Current account balance; zero when the account row does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn balance(&self, user_id: Uuid) -> Result<Decimal, GatewayError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT balance FROM user_accounts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    /// Records a freshly issued deposit address as a `pending` transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn insert_pending_deposit(
        &self,
        user_id: Uuid,
        currency: &str,
        network: &str,
        deposit_address: &str,
        reference: &str,
    ) -> Result<Uuid, GatewayError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO crypto_transactions \
             (id, user_id, transaction_type, currency, network, amount, status, deposit_address, reference) \
             VALUES ($1, $2, 'deposit', $3, $4, 0, 'pending', $5, $6)",
        )
        .bind(id)
        .bind(user_id)
        .bind(currency)
        .bind(network)
        .bind(deposit_address)
        .bind(reference)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// Credits a confirmed deposit: one transaction covering the replay
    /// guard, the crypto-transaction update, the ledger entry, the balance
    /// delta, and the notification.
    ///
    /// Returns `Ok(None)` when the (reference, hash) pair was already
    /// processed; a webhook replay credits nothing.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::DepositNotFound`] when no `pending` deposit
    ///   matches the reference.
    /// - [`GatewayError::Database`] on database failure.
    pub async fn confirm_deposit(
        &self,
        reference: &str,
        amount: Decimal,
        transaction_hash: &str,
        source: &str,
    ) -> Result<Option<CreditedDeposit>, GatewayError> {
        let mut tx = self.pool.begin().await?;

        let guard = sqlx::query(
            "INSERT INTO deposit_confirmations (reference, transaction_hash, amount, source) \
             VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
        )
        .bind(reference)
        .bind(transaction_hash)
        .bind(amount)
        .bind(source)
        .execute(&mut *tx)
        .await?;
        if guard.rows_affected() == 0 {
            // Replay: the commit only persists the no-op.
            tx.commit().await?;
            return Ok(None);
        }

        let pending = sqlx::query_as::<_, (Uuid, Uuid, String)>(
            "SELECT id, user_id, currency FROM crypto_transactions \
             WHERE reference = $1 AND transaction_type = 'deposit' AND status = 'pending' \
             FOR UPDATE",
        )
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((crypto_id, user_id, currency)) = pending else {
            return Err(GatewayError::DepositNotFound(reference.to_string()));
        };

        let ledger_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO transactions \
             (id, user_id, transaction_type, amount, platform_fee, net_amount, status, description) \
             VALUES ($1, $2, 'topup', $3, 0, $3, 'completed', $4)",
        )
        .bind(ledger_id)
        .bind(user_id)
        .bind(amount)
        .bind(format!("Crypto deposit {reference}"))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE crypto_transactions \
             SET status = 'confirmed', amount = $2, transaction_hash = $3, confirmations = 1, \
                 balance_transaction_id = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(crypto_id)
        .bind(amount)
        .bind(transaction_hash)
        .bind(ledger_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO user_accounts (user_id, balance) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE \
             SET balance = user_accounts.balance + EXCLUDED.balance, updated_at = now()",
        )
        .bind(user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO notifications (user_id, title, body, category) VALUES ($1, $2, $3, 'deposit')",
        )
        .bind(user_id)
        .bind("Deposit confirmed")
        .bind(format!("Your deposit of {amount} {currency} has been credited."))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(CreditedDeposit {
            user_id,
            amount,
            crypto_transaction_id: crypto_id,
        }))
    }

    /// Records a withdrawal: crypto transaction, negative ledger entry,
    /// balance debit, and notification in one database transaction. The
    /// debit re-checks the balance atomically, so a concurrent withdrawal
    /// cannot overdraw the account.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InsufficientBalance`] when the account no longer
    ///   covers `amount + fee` at commit time.
    /// - [`GatewayError::Database`] on database failure.
    pub async fn submit_withdrawal(&self, w: &NewWithdrawal) -> Result<Uuid, GatewayError> {
        let total = w.amount + w.fee;
        let mut tx = self.pool.begin().await?;

        let debited = sqlx::query(
            "UPDATE user_accounts SET balance = balance - $2, updated_at = now() \
             WHERE user_id = $1 AND balance >= $2",
        )
        .bind(w.user_id)
        .bind(total)
        .execute(&mut *tx)
        .await?;
        if debited.rows_affected() == 0 {
            return Err(GatewayError::InsufficientBalance(format!(
                "withdrawal requires {total} including the {} fee",
                w.fee
            )));
        }

        let ledger_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO transactions \
             (id, user_id, transaction_type, amount, platform_fee, net_amount, status, description) \
             VALUES ($1, $2, 'withdrawal', $3, $4, $5, 'completed', $6)",
        )
        .bind(ledger_id)
        .bind(w.user_id)
        .bind(-w.amount)
        .bind(w.fee)
        .bind(-total)
        .bind(format!("Crypto withdrawal to {}", w.recipient_address))
        .execute(&mut *tx)
        .await?;

        let crypto_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO crypto_transactions \
             (id, user_id, transaction_type, currency, network, amount, status, recipient_address, \
              reference, fee, balance_transaction_id) \
             VALUES ($1, $2, 'withdrawal', $3, $4, $5, 'processing', $6, $7, $8, $9)",
        )
        .bind(crypto_id)
        .bind(w.user_id)
        .bind(&w.currency)
        .bind(&w.network)
        .bind(w.amount)
        .bind(&w.recipient_address)
        .bind(&w.batch_id)
        .bind(w.fee)
        .bind(ledger_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO notifications (user_id, title, body, category) VALUES ($1, $2, $3, 'withdrawal')",
        )
        .bind(w.user_id)
        .bind("Withdrawal submitted")
        .bind(format!(
            "Your withdrawal of {} {} is being processed. Batch: {}",
            w.amount, w.currency, w.batch_id
        ))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(crypto_id)
    }

    /// Stores the batch number the payment gateway assigned to a
    /// submitted withdrawal.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn record_gateway_batch(
        &self,
        crypto_transaction_id: Uuid,
        gateway_batch: &str,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "UPDATE crypto_transactions SET gateway_batch = $2, updated_at = now() WHERE id = $1",
        )
        .bind(crypto_transaction_id)
        .bind(gateway_batch)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Lists a user's crypto transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn list_crypto_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<CryptoTransactionRow>, GatewayError> {
        let rows = sqlx::query_as::<_, CryptoTransactionRow>(
            "SELECT * FROM crypto_transactions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ── Bot-builder chat ────────────────────────────────────────────────

    /// Creates a chat session row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn create_session(
        &self,
        session_id: SessionId,
        user_id: Uuid,
        ai_model: &str,
        stage: &str,
        draft: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, ai_model, stage, draft) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(session_id.as_uuid())
        .bind(user_id)
        .bind(ai_model)
        .bind(stage)
        .bind(draft)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetches a session by ID.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::SessionNotFound`] when the session does not exist.
    /// - [`GatewayError::Database`] on database failure.
    pub async fn session(&self, session_id: SessionId) -> Result<ChatSessionRow, GatewayError> {
        sqlx::query_as::<_, ChatSessionRow>("SELECT * FROM chat_sessions WHERE id = $1")
            .bind(session_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(GatewayError::SessionNotFound(*session_id.as_uuid()))
    }

    /// Persists the stage and draft after a conversation turn.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn update_session(
        &self,
        session_id: SessionId,
        stage: &str,
        draft: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        sqlx::query("UPDATE chat_sessions SET stage = $2, draft = $3, updated_at = now() WHERE id = $1")
            .bind(session_id.as_uuid())
            .bind(stage)
            .bind(draft)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Appends a chat message to the session log.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn save_message(
        &self,
        session_id: SessionId,
        message_type: &str,
        content: &str,
        ai_model: &str,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO chat_messages (session_id, message_type, content, ai_model) VALUES ($1, $2, $3, $4)",
        )
        .bind(session_id.as_uuid())
        .bind(message_type)
        .bind(content)
        .bind(ai_model)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Number of assistant messages already persisted for the session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn assistant_turns(&self, session_id: SessionId) -> Result<u32, GatewayError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM chat_messages WHERE session_id = $1 AND message_type = 'assistant'",
        )
        .bind(session_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Persists a bot and closes its session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn create_bot(
        &self,
        user_id: Uuid,
        session_id: SessionId,
        config: &BotConfig,
    ) -> Result<Uuid, GatewayError> {
        let advanced = serde_json::to_value(&config.advanced_settings)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        let mut tx = self.pool.begin().await?;

        let bot_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO ai_bots \
             (id, user_id, name, base_coin, quote_coin, strategy, leverage, risk_profile, advanced) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(bot_id)
        .bind(user_id)
        .bind(&config.name)
        .bind(&config.base_coin)
        .bind(&config.quote_coin)
        .bind(&config.strategy)
        .bind(i32::try_from(config.leverage).unwrap_or(1))
        .bind(config.risk_profile.as_str())
        .bind(advanced)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE chat_sessions SET stage = 'created', updated_at = now() WHERE id = $1")
            .bind(session_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(bot_id)
    }

    /// Lists a user's bots, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn list_bots(&self, user_id: Uuid) -> Result<Vec<AiBotRow>, GatewayError> {
        let rows = sqlx::query_as::<_, AiBotRow>(
            "SELECT * FROM ai_bots WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ── Feed ────────────────────────────────────────────────────────────

    /// Inserts a feed entry and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn insert_feed_entry(
        &self,
        title: &str,
        content: &str,
        source: &str,
    ) -> Result<i64, GatewayError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO feed_entries (title, content, source) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(title)
        .bind(content)
        .bind(source)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Lists feed entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn list_feed_entries(&self, limit: i64) -> Result<Vec<FeedEntryRow>, GatewayError> {
        let rows = sqlx::query_as::<_, FeedEntryRow>(
            "SELECT * FROM feed_entries ORDER BY id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Caches a Russian translation on a feed entry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn cache_feed_translation(
        &self,
        entry_id: i64,
        title_ru: &str,
        content_ru: &str,
    ) -> Result<(), GatewayError> {
        sqlx::query("UPDATE feed_entries SET title_ru = $2, content_ru = $3 WHERE id = $1")
            .bind(entry_id)
            .bind(title_ru)
            .bind(content_ru)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes all but the newest `keep` feed entries.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn trim_feed_entries(&self, keep: i64) -> Result<u64, GatewayError> {
        let result = sqlx::query(
            "DELETE FROM feed_entries WHERE id NOT IN \
             (SELECT id FROM feed_entries ORDER BY id DESC LIMIT $1)",
        )
        .bind(keep)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // ── Profiles ────────────────────────────────────────────────────────

    /// Fetches a profile by slug, regardless of visibility.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn profile_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<UserProfileRow>, GatewayError> {
        let row = sqlx::query_as::<_, UserProfileRow>(
            "SELECT * FROM user_profiles WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // ── Spreadsheet reports ─────────────────────────────────────────────

    /// The single aggregate row of the `company_balance` view.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn company_balance(&self) -> Result<CompanyBalanceRow, GatewayError> {
        let row = sqlx::query_as::<_, CompanyBalanceRow>(
            "SELECT total_deposits, total_withdrawals, total_fees, net_balance FROM company_balance",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Monthly aggregates, newest month first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn company_balance_monthly(&self) -> Result<Vec<MonthlyBalanceRow>, GatewayError> {
        let rows = sqlx::query_as::<_, MonthlyBalanceRow>(
            "SELECT month, deposits, withdrawals, fees FROM company_balance_monthly",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// User report via one joined query.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure; the caller
    /// falls back to [`Self::user_report_stitched`].
    pub async fn user_report_joined(&self) -> Result<Vec<UserReportRow>, GatewayError> {
        let rows = sqlx::query_as::<_, UserReportRow>(
            "SELECT a.user_id, p.slug, p.display_name, a.balance, COALESCE(b.bot_count, 0) AS bot_count \
             FROM user_accounts a \
             LEFT JOIN user_profiles p ON p.user_id = a.user_id \
             LEFT JOIN (SELECT user_id, COUNT(*) AS bot_count FROM ai_bots GROUP BY user_id) b \
                    ON b.user_id = a.user_id \
             ORDER BY a.balance DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// User report stitched from three separate queries. Fallback path
    /// for when the joined query fails against a drifted schema.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on database failure.
    pub async fn user_report_stitched(&self) -> Result<Vec<UserReportRow>, GatewayError> {
        use std::collections::HashMap;

        let accounts = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT user_id, balance FROM user_accounts ORDER BY balance DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let profiles: HashMap<Uuid, (String, String)> = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT user_id, slug, display_name FROM user_profiles",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(id, slug, name)| (id, (slug, name)))
        .collect();

        let bot_counts: HashMap<Uuid, i64> = sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT user_id, COUNT(*) FROM ai_bots GROUP BY user_id",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .collect();

        Ok(accounts
            .into_iter()
            .map(|(user_id, balance)| {
                let profile = profiles.get(&user_id);
                UserReportRow {
                    user_id,
                    slug: profile.map(|(slug, _)| slug.clone()),
                    display_name: profile.map(|(_, name)| name.clone()),
                    balance,
                    bot_count: bot_counts.get(&user_id).copied().unwrap_or(0),
                }
            })
            .collect())
    }
}
