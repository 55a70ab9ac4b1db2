//! Money arithmetic.
//!
//! All prices are [`Decimal`] amounts in the storefront's single display
//! currency, rounded to two decimal places with midpoint-away-from-zero
//! rounding at every point a price becomes user-visible.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Errors that can occur during price arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    /// A multiplication or division left the representable decimal range.
    #[error("price arithmetic overflowed")]
    Overflow,
}

/// Round an amount to two decimal places, midpoints away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Total for one cart line: `unit_price * quantity`.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the product is not representable.
pub fn line_total(unit_price: Decimal, quantity: u32) -> Result<Decimal, PriceError> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .map(round_money)
        .ok_or(PriceError::Overflow)
}

/// Apply a percentage discount (0–100) to a subtotal.
///
/// A percent of `0` returns the subtotal unchanged; `100` returns zero.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the intermediate product is not
/// representable.
pub fn percent_off(subtotal: Decimal, percent: Decimal) -> Result<Decimal, PriceError> {
    let fraction = percent
        .checked_div(Decimal::ONE_HUNDRED)
        .ok_or(PriceError::Overflow)?;

    let discount = subtotal
        .checked_mul(fraction)
        .ok_or(PriceError::Overflow)?;

    let total = subtotal.checked_sub(discount).ok_or(PriceError::Overflow)?;

    Ok(round_money(total.max(Decimal::ZERO)))
}

/// Apply a fixed-amount discount to a subtotal, clamping at zero.
#[must_use]
pub fn fixed_off(subtotal: Decimal, amount: Decimal) -> Decimal {
    round_money((subtotal - amount).max(Decimal::ZERO))
}
