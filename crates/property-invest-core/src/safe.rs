//! Checked arithmetic that never surfaces a degenerate value.
//!
//! `Decimal` cannot hold NaN or Infinity, but it can divide by zero or
//! overflow. Every pipeline step and every valuation metric builds its value
//! through the `checked_*` family and closes with [`finite`], so the engine
//! reports zero where a naive computation would have failed.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::types::{Percent, Rate};

pub const HUNDRED: Decimal = dec!(100);
pub const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Collapse a checked computation to a reportable value: `None` becomes 0.
pub fn finite(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}

/// `numerator / denominator`, or 0 when the denominator is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    finite(numerator.checked_div(denominator))
}

/// `base × pct / 100`.
pub fn percent_of(base: Decimal, pct: Percent) -> Option<Decimal> {
    base.checked_mul(pct)?.checked_div(HUNDRED)
}

/// Monthly decimal rate from an annual percentage (12% -> 0.01).
pub fn monthly_rate(annual_pct: Percent) -> Option<Rate> {
    annual_pct.checked_div(HUNDRED)?.checked_div(MONTHS_PER_YEAR)
}

/// `(1 + rate)^periods`
pub fn compound(rate: Rate, periods: u32) -> Option<Decimal> {
    Decimal::ONE.checked_add(rate)?.checked_powu(u64::from(periods))
}
