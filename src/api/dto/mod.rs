//! Data Transfer Objects for REST request/response serialization.
//!
//! Money amounts are `rust_decimal::Decimal` end to end and serialize as
//! JSON strings, so clients never see float rounding.

pub mod chat_dto;
pub mod crypto_dto;
pub mod feed_dto;
pub mod profile_dto;

pub use chat_dto::{
    ChatResponse, CreateBotRequest, CreateBotResponse, SendMessageRequest, StartSessionRequest,
};
pub use feed_dto::FeedParams;
pub use crypto_dto::{
    CapitalistWebhook, DepositAddressRequest, DepositAddressResponse, DepositConfirmResponse,
    ManualConfirmRequest, TransactionListParams, WithdrawalRequest, WithdrawalResponse,
};
pub use profile_dto::{PublicProfileResponse, ValidateSlugRequest, ValidateSlugResponse};
