//! Outbound HTTP clients for the external services the gateway
//! orchestrates: the Capitalist payment gateway, OpenAI/Grok-compatible
//! chat-completion providers, and the Google Sheets values API.

pub mod ai;
pub mod capitalist;
pub mod sheets;

pub use ai::AiClient;
pub use capitalist::CapitalistClient;
pub use sheets::SheetsClient;
