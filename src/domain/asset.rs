//! Supported currencies, settlement networks, and the deposit address pool.
//!
//! The platform accepts stablecoin deposits into a fixed pool of company
//! wallets. Addresses are looked up per (currency, network) pair, never
//! provisioned against a live wallet API.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Stablecoin currencies the platform settles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Tether USD.
    Usdt,
    /// USD Coin.
    Usdc,
}

/// Blockchain networks deposits and withdrawals move over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Network {
    /// Ethereum ERC-20.
    Erc20,
    /// Tron TRC-20.
    Trc20,
}

impl Currency {
    /// Parses a currency code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for unknown codes.
    pub fn parse(code: &str) -> Result<Self, GatewayError> {
        match code.to_ascii_uppercase().as_str() {
            "USDT" => Ok(Self::Usdt),
            "USDC" => Ok(Self::Usdc),
            other => Err(GatewayError::InvalidRequest(format!(
                "unknown currency: {other}"
            ))),
        }
    }

    /// Canonical uppercase code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Usdt => "USDT",
            Self::Usdc => "USDC",
        }
    }
}

impl Network {
    /// Parses a network code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for unknown codes.
    pub fn parse(code: &str) -> Result<Self, GatewayError> {
        match code.to_ascii_uppercase().as_str() {
            "ERC20" => Ok(Self::Erc20),
            "TRC20" => Ok(Self::Trc20),
            other => Err(GatewayError::InvalidRequest(format!(
                "unknown network: {other}"
            ))),
        }
    }

    /// Canonical uppercase code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Erc20 => "ERC20",
            Self::Trc20 => "TRC20",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Company deposit wallets keyed by (currency, network).
///
/// USDC is issued on Ethereum only, so there is no (USDC, TRC20) entry.
const DEPOSIT_ADDRESSES: &[(Currency, Network, &str)] = &[
    (
        Currency::Usdt,
        Network::Erc20,
        "0x9f1a77bde8c1f4f92efc5e4b1cbd7d9a4f3cc21e",
    ),
    (
        Currency::Usdt,
        Network::Trc20,
        "TXk3mqYhWbP5ZQF2dGhKp9cTvNwE4s8uJr",
    ),
    (
        Currency::Usdc,
        Network::Erc20,
        "0x4b6e30c8d19a5df2ae07bb1f8e2d943c65a1fd08",
    ),
];

/// Validates a (currency, network) pair and returns the pooled deposit
/// address for it.
///
/// # Errors
///
/// Returns [`GatewayError::UnsupportedAsset`] when the pair has no wallet,
/// which includes the USDC-on-TRC20 case.
pub fn deposit_address(currency: Currency, network: Network) -> Result<&'static str, GatewayError> {
    DEPOSIT_ADDRESSES
        .iter()
        .find(|(c, n, _)| *c == currency && *n == network)
        .map(|(_, _, addr)| *addr)
        .ok_or(GatewayError::UnsupportedAsset {
            currency: currency.code().to_string(),
            network: network.code().to_string(),
        })
}

/// Returns `true` when the pair can be deposited to and withdrawn from.
#[must_use]
pub fn is_supported(currency: Currency, network: Network) -> bool {
    deposit_address(currency, network).is_ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn usdc_on_trc20_is_rejected() {
        let result = deposit_address(Currency::Usdc, Network::Trc20);
        let Err(GatewayError::UnsupportedAsset { currency, network }) = result else {
            panic!("expected UnsupportedAsset");
        };
        assert_eq!(currency, "USDC");
        assert_eq!(network, "TRC20");
    }

    #[test]
    fn supported_pairs_resolve_to_addresses() {
        assert!(deposit_address(Currency::Usdt, Network::Erc20).is_ok());
        assert!(deposit_address(Currency::Usdt, Network::Trc20).is_ok());
        assert!(deposit_address(Currency::Usdc, Network::Erc20).is_ok());
    }

    #[test]
    fn network_dictates_address_format() {
        let Ok(erc) = deposit_address(Currency::Usdt, Network::Erc20) else {
            panic!("erc20 address missing");
        };
        let Ok(trc) = deposit_address(Currency::Usdt, Network::Trc20) else {
            panic!("trc20 address missing");
        };
        assert!(erc.starts_with("0x"));
        assert!(trc.starts_with('T'));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Currency::parse("usdt").ok(), Some(Currency::Usdt));
        assert_eq!(Network::parse("trc20").ok(), Some(Network::Trc20));
        assert!(Currency::parse("DOGE").is_err());
        assert!(Network::parse("BEP20").is_err());
    }
}
