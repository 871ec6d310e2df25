//! Withdrawal limits and fee policy.
//!
//! The platform charges 2% of the withdrawn amount with a 5-unit floor.
//! The fee is debited on top of the amount, so the account must cover
//! `amount + fee`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::GatewayError;

/// Maximum single-withdrawal amount.
pub const MAX_WITHDRAWAL: Decimal = dec!(100000);

/// Minimum accepted recipient address length.
pub const MIN_ADDRESS_LEN: usize = 20;

const FEE_RATE: Decimal = dec!(0.02);
const FEE_FLOOR: Decimal = dec!(5);

/// Platform fee for withdrawing `amount`: `max(5, 2% × amount)`.
#[must_use]
pub fn withdrawal_fee(amount: Decimal) -> Decimal {
    (amount * FEE_RATE).max(FEE_FLOOR)
}

/// Validated withdrawal quote: fee and the total that will be debited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalQuote {
    /// Platform fee charged on top of the amount.
    pub fee: Decimal,
    /// Total debit: amount + fee.
    pub total: Decimal,
}

/// Checks the balance-independent limits: amount bounds and recipient
/// address length. Runs before any account lookup.
///
/// # Errors
///
/// Returns [`GatewayError::WithdrawalLimits`] when the amount is outside
/// `(0, 100 000]` or the recipient address is shorter than 20 chars.
pub fn validate_limits(amount: Decimal, recipient_address: &str) -> Result<(), GatewayError> {
    if amount <= Decimal::ZERO {
        return Err(GatewayError::WithdrawalLimits(
            "amount must be positive".to_string(),
        ));
    }
    if amount > MAX_WITHDRAWAL {
        return Err(GatewayError::WithdrawalLimits(format!(
            "amount exceeds the {MAX_WITHDRAWAL} limit"
        )));
    }
    if recipient_address.trim().len() < MIN_ADDRESS_LEN {
        return Err(GatewayError::WithdrawalLimits(format!(
            "recipient address must be at least {MIN_ADDRESS_LEN} characters"
        )));
    }
    Ok(())
}

/// Quotes the fee and checks the balance covers `amount + fee`.
///
/// # Errors
///
/// Returns [`GatewayError::InsufficientBalance`] when
/// `balance < amount + fee`; the message carries the computed required
/// total so the client can show the shortfall.
pub fn quote_against_balance(
    amount: Decimal,
    balance: Decimal,
) -> Result<WithdrawalQuote, GatewayError> {
    let fee = withdrawal_fee(amount);
    let total = amount + fee;
    if balance < total {
        return Err(GatewayError::InsufficientBalance(format!(
            "withdrawal of {amount} plus fee {fee} requires {total}, balance is {balance}"
        )));
    }
    Ok(WithdrawalQuote { fee, total })
}

/// Full validation: limits first, then the balance check.
///
/// # Errors
///
/// See [`validate_limits`] and [`quote_against_balance`].
pub fn validate_withdrawal(
    amount: Decimal,
    recipient_address: &str,
    balance: Decimal,
) -> Result<WithdrawalQuote, GatewayError> {
    validate_limits(amount, recipient_address)?;
    quote_against_balance(amount, balance)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const ADDR: &str = "0x9f1a77bde8c1f4f92efc5e4b1cbd7d9a4f3cc21e";

    #[test]
    fn fee_floor_applies_below_250() {
        assert_eq!(withdrawal_fee(dec!(10)), dec!(5));
        assert_eq!(withdrawal_fee(dec!(249)), dec!(5));
    }

    #[test]
    fn percentage_fee_applies_from_250() {
        // 2% of 250 is exactly the 5-unit floor.
        assert_eq!(withdrawal_fee(dec!(250)), dec!(5));
        assert_eq!(withdrawal_fee(dec!(1000)), dec!(20));
    }

    #[test]
    fn zero_amount_is_rejected() {
        assert!(validate_withdrawal(Decimal::ZERO, ADDR, dec!(1000)).is_err());
    }

    #[test]
    fn amount_above_limit_is_rejected() {
        let result = validate_withdrawal(dec!(100001), ADDR, dec!(999999));
        let Err(GatewayError::WithdrawalLimits(msg)) = result else {
            panic!("expected WithdrawalLimits");
        };
        assert!(msg.contains("100000"));
    }

    #[test]
    fn amount_at_limit_is_accepted() {
        let result = validate_withdrawal(dec!(100000), ADDR, dec!(999999));
        assert!(result.is_ok());
    }

    #[test]
    fn short_address_is_rejected() {
        assert!(validate_withdrawal(dec!(100), "0xshort", dec!(1000)).is_err());
    }

    #[test]
    fn insufficient_balance_message_names_required_total() {
        let result = validate_withdrawal(dec!(100), ADDR, dec!(104));
        let Err(GatewayError::InsufficientBalance(msg)) = result else {
            panic!("expected InsufficientBalance");
        };
        // 100 + max(5, 2) = 105
        assert!(msg.contains("105"));
    }

    #[test]
    fn quote_totals_amount_plus_fee() {
        let Ok(quote) = validate_withdrawal(dec!(1000), ADDR, dec!(2000)) else {
            panic!("expected quote");
        };
        assert_eq!(quote.fee, dec!(20));
        assert_eq!(quote.total, dec!(1020));
    }
}
