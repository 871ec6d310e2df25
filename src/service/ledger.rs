//! Crypto ledger service: deposit issuance, deposit confirmation, and
//! withdrawals.
//!
//! Both the gateway webhook and the manual operator path funnel into the
//! single [`LedgerService::confirm_deposit`] entry point, which is
//! idempotent per (reference, transaction hash). Withdrawals record the
//! full atomic debit first, then trigger settlement with the payment
//! gateway best-effort.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::clients::CapitalistClient;
use crate::domain::asset::{self, Currency, Network};
use crate::domain::{deposit, fees};
use crate::error::GatewayError;
use crate::persistence::models::CryptoTransactionRow;
use crate::persistence::postgres::NewWithdrawal;
use crate::persistence::PgStore;

/// Maximum rows returned by the transaction listing.
const MAX_LIST_LIMIT: i64 = 100;

/// Result of issuing a deposit address.
#[derive(Debug, Clone)]
pub struct IssuedDeposit {
    /// Pool wallet address to pay into.
    pub address: String,
    /// Reference the user must put in the payment memo.
    pub deposit_reference: String,
    /// Human instructions for the user.
    pub instructions: String,
}

/// Result of processing a deposit confirmation.
#[derive(Debug, Clone)]
pub struct DepositConfirmation {
    /// `false` when the payload was a replay and nothing was credited.
    pub credited: bool,
    /// Confirmed amount.
    pub amount: Decimal,
    /// Payment reference.
    pub reference: String,
}

/// Result of submitting a withdrawal.
#[derive(Debug, Clone)]
pub struct WithdrawalReceipt {
    /// Batch reference for tracking.
    pub batch_id: String,
    /// Platform fee charged.
    pub fee: Decimal,
    /// Total amount debited from the account.
    pub total_debited: Decimal,
}

/// Orchestrates all crypto ledger operations.
#[derive(Debug)]
pub struct LedgerService {
    store: Arc<PgStore>,
    gateway: Arc<CapitalistClient>,
}

impl LedgerService {
    /// Creates a new `LedgerService`.
    #[must_use]
    pub fn new(store: Arc<PgStore>, gateway: Arc<CapitalistClient>) -> Self {
        Self { store, gateway }
    }

    /// Issues a pooled deposit address and records a `pending`
    /// transaction with a fresh memo reference.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] for unknown currency/network codes.
    /// - [`GatewayError::UnsupportedAsset`] for unsupported combinations
    ///   (USDC is ERC20-only).
    /// - [`GatewayError::Database`] on persistence failure.
    pub async fn issue_deposit_address(
        &self,
        user_id: Uuid,
        currency: &str,
        network: &str,
    ) -> Result<IssuedDeposit, GatewayError> {
        let currency = Currency::parse(currency)?;
        let network = Network::parse(network)?;
        let address = asset::deposit_address(currency, network)?;

        let issued_at_nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| chrono::Utc::now().timestamp_micros());
        let reference = deposit::deposit_reference(user_id, currency, network, issued_at_nanos);

        self.store
            .insert_pending_deposit(user_id, currency.code(), network.code(), address, &reference)
            .await?;

        tracing::info!(%user_id, %currency, %network, %reference, "deposit address issued");

        Ok(IssuedDeposit {
            address: address.to_string(),
            deposit_reference: reference.clone(),
            instructions: format!(
                "Send {currency} over {network} to {address} and include the reference \
                 {reference} in the payment memo. Funds are credited after network \
                 confirmation."
            ),
        })
    }

    /// Confirms a deposit and credits the user's balance, at most once
    /// per (reference, transaction hash) pair. Used by the gateway
    /// webhook and the manual operator fallback alike.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] for a non-positive amount.
    /// - [`GatewayError::DepositNotFound`] when no pending deposit
    ///   matches the reference.
    /// - [`GatewayError::Database`] on persistence failure.
    pub async fn confirm_deposit(
        &self,
        reference: &str,
        amount: Decimal,
        transaction_hash: &str,
        source: &str,
    ) -> Result<DepositConfirmation, GatewayError> {
        if amount <= Decimal::ZERO {
            return Err(GatewayError::InvalidRequest(
                "deposit amount must be positive".to_string(),
            ));
        }

        let outcome = self
            .store
            .confirm_deposit(reference, amount, transaction_hash, source)
            .await?;

        match outcome {
            Some(credit) => {
                tracing::info!(
                    user_id = %credit.user_id,
                    %amount,
                    reference,
                    source,
                    "deposit credited"
                );
                Ok(DepositConfirmation {
                    credited: true,
                    amount,
                    reference: reference.to_string(),
                })
            }
            None => {
                tracing::warn!(reference, transaction_hash, source, "replayed deposit ignored");
                Ok(DepositConfirmation {
                    credited: false,
                    amount,
                    reference: reference.to_string(),
                })
            }
        }
    }

    /// Validates and records a withdrawal, then triggers settlement with
    /// the payment gateway. The debit is committed before the gateway
    /// call; a gateway failure leaves the transaction `processing` for
    /// operator retry and never loses the debit.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] / [`GatewayError::UnsupportedAsset`]
    ///   for bad asset codes.
    /// - [`GatewayError::WithdrawalLimits`] for out-of-bounds amounts or a
    ///   short recipient address.
    /// - [`GatewayError::InsufficientBalance`] when the account does not
    ///   cover amount plus fee.
    /// - [`GatewayError::Database`] on persistence failure.
    pub async fn submit_withdrawal(
        &self,
        user_id: Uuid,
        recipient_address: &str,
        amount: Decimal,
        currency: &str,
        network: &str,
        memo: &str,
    ) -> Result<WithdrawalReceipt, GatewayError> {
        let currency = Currency::parse(currency)?;
        let network = Network::parse(network)?;
        if !asset::is_supported(currency, network) {
            return Err(GatewayError::UnsupportedAsset {
                currency: currency.code().to_string(),
                network: network.code().to_string(),
            });
        }

        fees::validate_limits(amount, recipient_address)?;
        let balance = self.store.balance(user_id).await?;
        let quote = fees::quote_against_balance(amount, balance)?;

        let batch_id = new_batch_id();
        let crypto_id = self
            .store
            .submit_withdrawal(&NewWithdrawal {
                user_id,
                batch_id: batch_id.clone(),
                currency: currency.code().to_string(),
                network: network.code().to_string(),
                amount,
                fee: quote.fee,
                recipient_address: recipient_address.to_string(),
            })
            .await?;

        tracing::info!(%user_id, %amount, %currency, %network, %batch_id, "withdrawal recorded");

        match self
            .gateway
            .submit_withdrawal(&batch_id, recipient_address, amount, currency.code(), memo)
            .await
        {
            Ok(batch) => {
                self.store
                    .record_gateway_batch(crypto_id, &batch.batch_number)
                    .await?;
                tracing::info!(%batch_id, gateway_batch = %batch.batch_number, "settlement submitted");
            }
            Err(e) => {
                // The debit is already committed; the row stays in
                // `processing` until an operator resubmits the batch.
                tracing::warn!(%batch_id, error = %e, "gateway settlement failed, batch left for retry");
            }
        }

        Ok(WithdrawalReceipt {
            batch_id,
            fee: quote.fee,
            total_debited: quote.total,
        })
    }

    /// Lists a user's crypto transactions, newest first. The limit is
    /// clamped to 1..=100.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on persistence failure.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<CryptoTransactionRow>, GatewayError> {
        let limit = limit.unwrap_or(50).clamp(1, MAX_LIST_LIMIT);
        self.store.list_crypto_transactions(user_id, limit).await
    }
}

/// Batch references look like `WD-3F2A9C81D4B7`.
fn new_batch_id() -> String {
    let hex: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(12)
        .collect::<String>()
        .to_uppercase();
    format!("WD-{hex}")
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn batch_ids_are_prefixed_and_unique() {
        let a = new_batch_id();
        let b = new_batch_id();
        assert!(a.starts_with("WD-"));
        assert_eq!(a.len(), 15);
        assert_ne!(a, b);
    }
}
