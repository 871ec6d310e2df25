//! Deposit reference generation.
//!
//! Every issued deposit address comes with a reference the user must put
//! in the payment memo. The webhook matches incoming funds back to the
//! pending transaction by this reference, so it must be unique per
//! issuance even for the same user and asset.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::asset::{Currency, Network};

/// Length of the reference embedded in payment memos.
pub const REFERENCE_LEN: usize = 16;

/// Derives a deposit reference for one address issuance.
///
/// SHA-256 over user, asset pair, and the issuance instant in nanoseconds,
/// truncated to [`REFERENCE_LEN`] uppercase hex characters. The timestamp
/// component guarantees repeated requests for the same (user, currency,
/// network) produce distinct references.
#[must_use]
pub fn deposit_reference(
    user_id: Uuid,
    currency: Currency,
    network: Network,
    issued_at_nanos: i64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(currency.code().as_bytes());
    hasher.update(network.code().as_bytes());
    hasher.update(issued_at_nanos.to_le_bytes());
    let digest = hex::encode_upper(hasher.finalize());
    digest.chars().take(REFERENCE_LEN).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_16_uppercase_hex_chars() {
        let r = deposit_reference(Uuid::new_v4(), Currency::Usdt, Network::Erc20, 1);
        assert_eq!(r.len(), REFERENCE_LEN);
        assert!(r.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn same_inputs_different_instants_differ() {
        let user = Uuid::new_v4();
        let a = deposit_reference(user, Currency::Usdt, Network::Trc20, 1_000);
        let b = deposit_reference(user, Currency::Usdt, Network::Trc20, 1_001);
        assert_ne!(a, b);
    }

    #[test]
    fn reference_is_deterministic_for_identical_inputs() {
        let user = Uuid::new_v4();
        let a = deposit_reference(user, Currency::Usdc, Network::Erc20, 42);
        let b = deposit_reference(user, Currency::Usdc, Network::Erc20, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn different_users_differ_at_same_instant() {
        let a = deposit_reference(Uuid::new_v4(), Currency::Usdt, Network::Erc20, 7);
        let b = deposit_reference(Uuid::new_v4(), Currency::Usdt, Network::Erc20, 7);
        assert_ne!(a, b);
    }
}
