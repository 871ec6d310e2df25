//! Crypto ledger handlers: deposit address issuance, deposit
//! confirmation (gateway webhook and manual fallback), withdrawals, and
//! transaction listing.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CapitalistWebhook, DepositAddressRequest, DepositAddressResponse, DepositConfirmResponse,
    ManualConfirmRequest, TransactionListParams, WithdrawalRequest, WithdrawalResponse,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /crypto/deposit/address` — Issue a pooled deposit address.
///
/// # Errors
///
/// Returns [`GatewayError`] for unknown or unsupported assets.
#[utoipa::path(
    post,
    path = "/api/v1/crypto/deposit/address",
    tag = "Crypto",
    summary = "Issue a deposit address",
    description = "Returns a pooled wallet address and a memo reference. USDC is supported on ERC20 only.",
    request_body = DepositAddressRequest,
    responses(
        (status = 200, description = "Address issued", body = DepositAddressResponse),
        (status = 400, description = "Unknown or unsupported asset", body = ErrorResponse),
    )
)]
pub async fn deposit_address(
    State(state): State<AppState>,
    Json(req): Json<DepositAddressRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let issued = state
        .ledger
        .issue_deposit_address(req.user_id, &req.currency, &req.network)
        .await?;

    Ok(Json(DepositAddressResponse {
        address: issued.address,
        deposit_reference: issued.deposit_reference,
        instructions: issued.instructions,
    }))
}

/// `POST /crypto/webhook/capitalist` — Deposit confirmation webhook.
///
/// Replayed payloads are acknowledged without crediting again. Non-final
/// statuses are acknowledged and logged.
///
/// # Errors
///
/// Returns [`GatewayError`] when no pending deposit matches the reference.
#[utoipa::path(
    post,
    path = "/api/v1/crypto/webhook/capitalist",
    tag = "Crypto",
    summary = "Payment gateway deposit webhook",
    request_body = CapitalistWebhook,
    responses(
        (status = 200, description = "Processed (or acknowledged replay)", body = DepositConfirmResponse),
        (status = 404, description = "No pending deposit for reference", body = ErrorResponse),
    )
)]
pub async fn capitalist_webhook(
    State(state): State<AppState>,
    Json(hook): Json<CapitalistWebhook>,
) -> Result<impl IntoResponse, GatewayError> {
    if !matches!(hook.status.as_str(), "completed" | "success") {
        tracing::info!(
            reference = %hook.payment_reference,
            status = %hook.status,
            "non-final webhook acknowledged"
        );
        return Ok(Json(DepositConfirmResponse {
            credited: false,
            amount: hook.amount,
            reference: hook.payment_reference,
        }));
    }

    let outcome = state
        .ledger
        .confirm_deposit(
            &hook.payment_reference,
            hook.amount,
            &hook.transaction_hash,
            "capitalist_webhook",
        )
        .await?;

    Ok(Json(DepositConfirmResponse {
        credited: outcome.credited,
        amount: outcome.amount,
        reference: outcome.reference,
    }))
}

/// `POST /crypto/deposit/manual-confirm` — Operator fallback when the
/// webhook never arrived. Same idempotent path as the webhook.
///
/// # Errors
///
/// Returns [`GatewayError`] when no pending deposit matches the reference.
#[utoipa::path(
    post,
    path = "/api/v1/crypto/deposit/manual-confirm",
    tag = "Crypto",
    summary = "Manually confirm a deposit",
    request_body = ManualConfirmRequest,
    responses(
        (status = 200, description = "Processed (or acknowledged replay)", body = DepositConfirmResponse),
        (status = 404, description = "No pending deposit for reference", body = ErrorResponse),
    )
)]
pub async fn manual_confirm(
    State(state): State<AppState>,
    Json(req): Json<ManualConfirmRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state
        .ledger
        .confirm_deposit(
            &req.deposit_reference,
            req.amount,
            &req.transaction_hash,
            "manual_confirm",
        )
        .await?;

    Ok(Json(DepositConfirmResponse {
        credited: outcome.credited,
        amount: outcome.amount,
        reference: outcome.reference,
    }))
}

/// `POST /crypto/withdrawal` — Submit a withdrawal.
///
/// # Errors
///
/// Returns [`GatewayError`] on limit violations or insufficient balance.
#[utoipa::path(
    post,
    path = "/api/v1/crypto/withdrawal",
    tag = "Crypto",
    summary = "Submit a withdrawal",
    description = "Debits amount plus fee (max(5, 2%)) atomically, then submits the batch to the payment gateway.",
    request_body = WithdrawalRequest,
    responses(
        (status = 200, description = "Withdrawal recorded", body = WithdrawalResponse),
        (status = 422, description = "Limits or balance violated", body = ErrorResponse),
    )
)]
pub async fn submit_withdrawal(
    State(state): State<AppState>,
    Json(req): Json<WithdrawalRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let receipt = state
        .ledger
        .submit_withdrawal(
            req.user_id,
            &req.recipient_address,
            req.amount,
            &req.currency,
            &req.network,
            req.memo.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(Json(WithdrawalResponse {
        batch_id: receipt.batch_id,
        fee: receipt.fee,
        total_debited: receipt.total_debited,
    }))
}

/// `GET /crypto/transactions` — List a user's crypto transactions.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/crypto/transactions",
    tag = "Crypto",
    summary = "List crypto transactions",
    params(TransactionListParams),
    responses(
        (status = 200, description = "Transactions, newest first", body = serde_json::Value),
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let rows = state
        .ledger
        .list_transactions(params.user_id, params.limit)
        .await?;
    Ok((StatusCode::OK, Json(rows)))
}

/// Crypto ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/crypto/deposit/address", post(deposit_address))
        .route("/crypto/deposit/manual-confirm", post(manual_confirm))
        .route("/crypto/webhook/capitalist", post(capitalist_webhook))
        .route("/crypto/withdrawal", post(submit_withdrawal))
        .route("/crypto/transactions", get(list_transactions))
}
