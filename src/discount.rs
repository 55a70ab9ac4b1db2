//! Discounts
//!
//! Exactly one discount regime is in force at a time: an automatic site-wide
//! percentage, or a shopper-entered promo code that overrides it entirely.
//! The two never compose.

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    api::coupons::CouponRecord,
    pricing::{self, PriceError},
};

/// Errors specific to discount resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// The entered code matched no active coupon valid today.
    #[error("promo code not found or expired")]
    UnknownOrExpired,

    /// Wrapped price arithmetic error.
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// Whether a discount is a percentage of the subtotal or a fixed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Percentage of the subtotal, 0–100.
    Percent,

    /// Fixed amount off the subtotal, clamped at zero.
    Fixed,
}

/// A validated, applied promo code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCode {
    /// The coupon's canonical code.
    pub code: String,

    /// Percentage or fixed amount.
    pub kind: DiscountKind,

    /// Percent (0–100) or amount, depending on `kind`.
    pub value: Decimal,
}

/// The discount rule currently affecting totals, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountRule {
    /// Automatic site-wide percentage.
    SiteWide(Decimal),

    /// Applied promo code, overriding any site-wide percentage.
    Promo(PromoCode),
}

/// Resolves the active discount regime and computes discounted totals.
#[derive(Debug, Default)]
pub struct DiscountEngine {
    site_wide_percent: Decimal,
    promo: Option<PromoCode>,
}

impl DiscountEngine {
    /// Create an engine with no discount in force.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the site-wide percentage. Has no visible effect while a promo
    /// code is applied.
    pub fn refresh_site_wide(&mut self, percent: Decimal) {
        self.site_wide_percent = percent;
    }

    /// The current site-wide percentage, applied or not.
    #[must_use]
    pub fn site_wide_percent(&self) -> Decimal {
        self.site_wide_percent
    }

    /// The applied promo code, if any.
    #[must_use]
    pub fn promo(&self) -> Option<&PromoCode> {
        self.promo.as_ref()
    }

    /// Validate `code` against the coupon list as of `today` and apply it.
    ///
    /// Matching is case-insensitive among active coupons whose inclusive
    /// date window contains `today`; an absent bound is unbounded on that
    /// side and an unparseable bound disqualifies the coupon. On failure any
    /// previously applied promo is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::UnknownOrExpired`] when no coupon matches.
    pub fn apply_promo_code(
        &mut self,
        code: &str,
        coupons: &[CouponRecord],
        today: Date,
    ) -> Result<&PromoCode, DiscountError> {
        let matched = coupons
            .iter()
            .find(|coupon| coupon_matches(coupon, code, today))
            .ok_or(DiscountError::UnknownOrExpired)?;

        info!(code = %matched.code, "promo code applied");

        Ok(self.promo.insert(PromoCode {
            code: matched.code.clone(),
            kind: matched.discount_type,
            value: matched.discount_value,
        }))
    }

    /// Drop any applied promo code. Called when the cart empties or an order
    /// is finalized.
    pub fn clear_promo(&mut self) {
        self.promo = None;
    }

    /// The rule currently affecting totals, if any. A site-wide percent of
    /// exactly zero is "no discount", not an active rule.
    #[must_use]
    pub fn active_rule(&self) -> Option<DiscountRule> {
        if let Some(promo) = &self.promo {
            return Some(DiscountRule::Promo(promo.clone()));
        }

        if self.site_wide_percent > Decimal::ZERO {
            return Some(DiscountRule::SiteWide(self.site_wide_percent));
        }

        None
    }

    /// Compute the payable total for `subtotal` under the active rule. Pure:
    /// repeated calls with unchanged inputs return the same value.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if price arithmetic overflows.
    pub fn discounted_total(&self, subtotal: Decimal) -> Result<Decimal, DiscountError> {
        match self.active_rule() {
            Some(DiscountRule::Promo(promo)) => match promo.kind {
                DiscountKind::Percent => Ok(pricing::percent_off(subtotal, promo.value)?),
                DiscountKind::Fixed => Ok(pricing::fixed_off(subtotal, promo.value)),
            },
            Some(DiscountRule::SiteWide(percent)) => Ok(pricing::percent_off(subtotal, percent)?),
            None => Ok(subtotal),
        }
    }
}

fn coupon_matches(coupon: &CouponRecord, code: &str, today: Date) -> bool {
    if !coupon.active || !coupon.code.eq_ignore_ascii_case(code.trim()) {
        return false;
    }

    let (Some(start), Some(end)) = (
        parse_bound(coupon.start_date.as_deref()),
        parse_bound(coupon.end_date.as_deref()),
    ) else {
        return false;
    };

    start.is_none_or(|date| date <= today) && end.is_none_or(|date| today <= date)
}

/// `None` means the bound is unparseable; `Some(None)` means unbounded.
fn parse_bound(raw: Option<&str>) -> Option<Option<Date>> {
    match raw.map(str::trim) {
        None | Some("") => Some(None),
        Some(value) => value.parse::<Date>().ok().map(Some),
    }
}
