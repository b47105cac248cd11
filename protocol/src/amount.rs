//! # Amounts
//!
//! Token amounts are plain `u128`. EVM tokens use 256-bit words, but `u128`
//! already covers `3.4 * 10^38`, which is twenty orders of magnitude past a
//! billion tokens at 18 decimals. Where
//! two amounts get multiplied together (pricing LP tokens against pool
//! reserves) the product can blow past `u128`, so that single operation runs
//! through a 256-bit intermediate.

use thiserror::Error;

/// A token amount in the smallest denomination.
pub type Amount = u128;

/// The "never decrement me" allowance. Approving this much means the spender
/// can move an unlimited amount and the allowance is left untouched.
pub const INFINITE_ALLOWANCE: Amount = u128::MAX;

/// Percentages are expressed as whole numbers over this denominator.
pub const PERCENT_DENOMINATOR: u128 = 100;

#[allow(clippy::all)]
mod wide {
    uint::construct_uint! {
        /// 256-bit unsigned integer, used only as a multiplication scratchpad.
        pub struct U256(4);
    }
}

use wide::U256;

/// Errors from amount arithmetic.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    /// The divisor was zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The result does not fit in a `u128`.
    #[error("amount overflow")]
    Overflow,
}

/// Computes `floor(a * b / d)` without intermediate overflow.
///
/// # Errors
///
/// Returns [`AmountError::DivisionByZero`] if `d == 0` and
/// [`AmountError::Overflow`] if the quotient does not fit in `u128`.
pub fn mul_div_floor(a: Amount, b: Amount, d: Amount) -> Result<Amount, AmountError> {
    if d == 0 {
        return Err(AmountError::DivisionByZero);
    }
    // u128 * u128 always fits in 256 bits.
    let quotient = U256::from(a) * U256::from(b) / U256::from(d);
    if quotient > U256::from(u128::MAX) {
        return Err(AmountError::Overflow);
    }
    Ok(quotient.low_u128())
}

/// Computes `floor(amount * percent / 100)` with checked multiplication.
pub fn percent_of(amount: Amount, percent: u128) -> Result<Amount, AmountError> {
    amount
        .checked_mul(percent)
        .map(|scaled| scaled / PERCENT_DENOMINATOR)
        .ok_or(AmountError::Overflow)
}

/// Scales a human-readable whole-token quantity to the smallest denomination:
/// `units(1000, 18) == 1000 * 10^18`.
pub fn units(whole: u128, decimals: u8) -> Result<Amount, AmountError> {
    10u128
        .checked_pow(u32::from(decimals))
        .and_then(|scale| whole.checked_mul(scale))
        .ok_or(AmountError::Overflow)
}
