//! DTOs for the crypto ledger endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for `POST /crypto/deposit/address`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DepositAddressRequest {
    /// Requesting user.
    pub user_id: Uuid,
    /// Currency code (`USDT` or `USDC`).
    pub currency: String,
    /// Network code (`ERC20` or `TRC20`).
    pub network: String,
}

/// Response body for `POST /crypto/deposit/address`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DepositAddressResponse {
    /// Pool wallet address to pay into.
    pub address: String,
    /// Reference for the payment memo.
    pub deposit_reference: String,
    /// Human instructions.
    pub instructions: String,
}

/// Webhook body posted by the payment gateway.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CapitalistWebhook {
    /// Memo reference the sender included.
    pub payment_reference: String,
    /// Observed amount.
    pub amount: Decimal,
    /// On-chain transaction hash.
    pub transaction_hash: String,
    /// Gateway-reported status (`completed` credits, anything else is
    /// acknowledged without crediting).
    pub status: String,
}

/// Request body for the manual confirmation fallback.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ManualConfirmRequest {
    /// Memo reference of the pending deposit.
    pub deposit_reference: String,
    /// Confirmed amount.
    pub amount: Decimal,
    /// On-chain transaction hash.
    pub transaction_hash: String,
}

/// Response body for both confirmation paths.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DepositConfirmResponse {
    /// `false` when the payload was a replay and nothing was credited.
    pub credited: bool,
    /// Confirmed amount.
    pub amount: Decimal,
    /// Payment reference.
    pub reference: String,
}

/// Request body for `POST /crypto/withdrawal`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct WithdrawalRequest {
    /// Requesting user.
    pub user_id: Uuid,
    /// Destination address.
    pub recipient_address: String,
    /// Amount to withdraw.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Network code.
    pub network: String,
    /// Optional memo forwarded to the gateway.
    #[serde(default)]
    pub memo: Option<String>,
}

/// Response body for `POST /crypto/withdrawal`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WithdrawalResponse {
    /// Batch reference for tracking.
    pub batch_id: String,
    /// Platform fee charged.
    pub fee: Decimal,
    /// Total amount debited.
    pub total_debited: Decimal,
}

/// Query parameters for `GET /crypto/transactions`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct TransactionListParams {
    /// Owning user.
    pub user_id: Uuid,
    /// Maximum rows to return; clamped to 100.
    #[serde(default)]
    pub limit: Option<i64>,
}
