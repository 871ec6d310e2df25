//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "unsupported asset: USDC on TRC20",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                |
/// |-----------|---------------------|----------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request            |
/// | 2000–2999 | Not Found / Conflict| 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / Upstream   | 500 / 502                  |
/// | 4000–4999 | Funds               | 422 Unprocessable Entity   |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Currency/network combination is not supported.
    #[error("unsupported asset: {currency} on {network}")]
    UnsupportedAsset {
        /// Requested currency code.
        currency: String,
        /// Requested settlement network.
        network: String,
    },

    /// Chat session with the given ID was not found.
    #[error("chat session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    /// No pending deposit matches the given payment reference.
    #[error("no pending deposit for reference {0}")]
    DepositNotFound(String),

    /// No public profile exists for the given slug.
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// Requested profile slug is already held by another user.
    #[error("slug already taken: {0}")]
    SlugTaken(String),

    /// Account balance does not cover the requested debit.
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Withdrawal amount is outside the allowed limits.
    #[error("withdrawal rejected: {0}")]
    WithdrawalLimits(String),

    /// Persistence layer failure. Details stay server-side.
    #[error("database error")]
    Database(#[source] sqlx::Error),

    /// Payment gateway call failed.
    #[error("payment gateway error: {0}")]
    PaymentGateway(String),

    /// AI provider call failed or is not configured.
    #[error("ai provider error: {0}")]
    AiProvider(String),

    /// Google Sheets API call failed.
    #[error("sheets api error: {0}")]
    SheetsApi(String),

    /// Internal server error.
    #[error("internal error")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnsupportedAsset { .. } => 1002,
            Self::SessionNotFound(_) => 2001,
            Self::DepositNotFound(_) => 2002,
            Self::ProfileNotFound(_) => 2003,
            Self::SlugTaken(_) => 2101,
            Self::InsufficientBalance(_) => 4001,
            Self::WithdrawalLimits(_) => 4002,
            Self::Database(_) => 3001,
            Self::PaymentGateway(_) => 3002,
            Self::AiProvider(_) => 3003,
            Self::SheetsApi(_) => 3004,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::UnsupportedAsset { .. } => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) | Self::DepositNotFound(_) | Self::ProfileNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::SlugTaken(_) => StatusCode::CONFLICT,
            Self::InsufficientBalance(_) | Self::WithdrawalLimits(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PaymentGateway(_) | Self::AiProvider(_) | Self::SheetsApi(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            // Full detail goes to the log; the client gets the stable
            // category message only.
            tracing::error!(error = ?self, code = self.error_code(), "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_400() {
        let err = GatewayError::UnsupportedAsset {
            currency: "USDC".to_string(),
            network: "TRC20".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1002);
    }

    #[test]
    fn funds_errors_map_to_422() {
        let err = GatewayError::InsufficientBalance("need 105".to_string());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = GatewayError::WithdrawalLimits("amount must be positive".to_string());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn upstream_errors_map_to_502() {
        let err = GatewayError::PaymentGateway("timeout".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), 3002);
    }

    #[test]
    fn database_error_message_does_not_leak_detail() {
        let err = GatewayError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.to_string(), "database error");
    }

    #[test]
    fn slug_conflict_maps_to_409() {
        let err = GatewayError::SlugTaken("satoshi".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2101);
    }
}
