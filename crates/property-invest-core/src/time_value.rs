//! Valuation math over monthly cash-flow series: NPV, IRR, payback period,
//! rental yield and cash-on-cash return.
//!
//! Every function is total: a degenerate computation (zero property value,
//! zero investment, overflow) reports 0 rather than failing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::safe::{finite, monthly_rate, percent_of, safe_div, HUNDRED, MONTHS_PER_YEAR};
use crate::types::{Money, Percent, Rate, Years};

pub const IRR_MAX_ITERATIONS: u32 = 100;
pub const IRR_TOLERANCE: Decimal = dec!(0.0001);

/// Monthly starting guess: 10% a year.
const IRR_INITIAL_GUESS: Rate = dec!(0.008333333333333333333333333);

/// Where the iterate is reset when Newton's step lands on a negative rate.
const IRR_RATE_FLOOR: Rate = dec!(0.01);

/// Result of the Newton-Raphson IRR search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrEstimate {
    /// Annualised rate, percent (monthly rate × 12 × 100)
    pub annual_rate: Percent,
    pub iterations: u32,
    /// False when the iteration cap was hit; `annual_rate` is then the last
    /// iterate, not a root.
    pub converged: bool,
}

// ---------------------------------------------------------------------------
// NPV
// ---------------------------------------------------------------------------

/// NPV = -initial + sum CF_i / (1 + m)^i with m the monthly rate and i
/// starting at 1.
pub fn net_present_value(
    initial_investment: Money,
    monthly_cash_flows: &[Money],
    annual_discount_rate: Percent,
) -> Money {
    finite(checked_npv(
        initial_investment,
        monthly_cash_flows,
        annual_discount_rate,
    ))
}

fn checked_npv(initial: Money, flows: &[Money], annual_rate: Percent) -> Option<Money> {
    let one_plus_r = Decimal::ONE.checked_add(monthly_rate(annual_rate)?)?;
    let mut discount = Decimal::ONE;
    let mut total = -initial;

    for cf in flows {
        discount = discount.checked_mul(one_plus_r)?;
        total = total.checked_add(cf.checked_div(discount)?)?;
    }

    Some(total)
}

// ---------------------------------------------------------------------------
// IRR
// ---------------------------------------------------------------------------

/// IRR with the default iteration cap and tolerance.
pub fn irr(initial_investment: Money, monthly_cash_flows: &[Money]) -> IrrEstimate {
    internal_rate_of_return(
        initial_investment,
        monthly_cash_flows,
        IRR_MAX_ITERATIONS,
        IRR_TOLERANCE,
    )
}

/// Newton-Raphson IRR on a monthly series, reported as an annual percentage.
///
/// Pathological series (no sign change, flat NPV) may not converge; the
/// last iterate is returned with `converged = false`.
pub fn internal_rate_of_return(
    initial_investment: Money,
    monthly_cash_flows: &[Money],
    max_iterations: u32,
    tolerance: Decimal,
) -> IrrEstimate {
    let mut rate = IRR_INITIAL_GUESS;
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        let Some((npv, dnpv)) = npv_and_derivative(initial_investment, monthly_cash_flows, rate)
        else {
            break;
        };

        if npv.abs() < tolerance {
            return IrrEstimate {
                annual_rate: annualise(rate),
                iterations,
                converged: true,
            };
        }

        if dnpv.is_zero() {
            break;
        }

        match npv.checked_div(dnpv).and_then(|step| rate.checked_sub(step)) {
            Some(next) => rate = next,
            None => break,
        }

        if rate < Decimal::ZERO {
            rate = IRR_RATE_FLOOR;
        }
    }

    tracing::debug!(iterations, "IRR search stopped without converging");
    IrrEstimate {
        annual_rate: annualise(rate),
        iterations,
        converged: false,
    }
}

fn annualise(monthly: Rate) -> Percent {
    finite(
        monthly
            .checked_mul(MONTHS_PER_YEAR)
            .and_then(|v| v.checked_mul(HUNDRED)),
    )
}

/// NPV(r) and dNPV/dr for a monthly rate.
fn npv_and_derivative(initial: Money, flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    let mut npv = -initial;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (i, cf) in flows.iter().enumerate() {
        let t = Decimal::from(i as u64 + 1);
        discount = discount.checked_div(one_plus_r)?;
        let pv = cf.checked_mul(discount)?;
        npv = npv.checked_add(pv)?;
        // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
        dnpv = dnpv.checked_sub(t.checked_mul(pv)?.checked_div(one_plus_r)?)?;
    }

    Some((npv, dnpv))
}

// ---------------------------------------------------------------------------
// Payback
// ---------------------------------------------------------------------------

/// Years until cumulative cash flow recovers the initial investment, with
/// linear interpolation inside the crossing month. `None` when the series
/// never pays back, including when nothing was invested but every month
/// loses money.
pub fn payback_period_years(initial_investment: Money, monthly_cash_flows: &[Money]) -> Option<Years> {
    let mut cumulative = -initial_investment;
    for (month, cf) in monthly_cash_flows.iter().enumerate() {
        let previous = cumulative;
        cumulative = cumulative.checked_add(*cf)?;
        if cumulative >= Decimal::ZERO {
            // Already recovered before this month began
            let fraction = if previous >= Decimal::ZERO {
                Decimal::ZERO
            } else {
                safe_div(-previous, *cf)
            };
            return Some(safe_div(Decimal::from(month as u64) + fraction, MONTHS_PER_YEAR));
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Yield and cash-on-cash
// ---------------------------------------------------------------------------

/// Gross rental yield: (rent × 12 × occupancy) / property value, percent.
pub fn rental_yield(property_value: Money, monthly_rent: Money, occupancy_rate: Percent) -> Percent {
    finite(
        monthly_rent
            .checked_mul(MONTHS_PER_YEAR)
            .and_then(|annual| percent_of(annual, occupancy_rate))
            .and_then(|effective| effective.checked_div(property_value))
            .and_then(|v| v.checked_mul(HUNDRED)),
    )
}

/// Annual cash flow over the cash invested, percent.
pub fn cash_on_cash_return(initial_cash_investment: Money, annual_cash_flow: Money) -> Percent {
    finite(
        annual_cash_flow
            .checked_div(initial_cash_investment)
            .and_then(|v| v.checked_mul(HUNDRED)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(50), dec!(50), dec!(50)];
        assert_eq!(net_present_value(dec!(100), &cfs, Decimal::ZERO), dec!(50));
    }

    #[test]
    fn test_npv_single_period() {
        // 12% a year = 1% a month; 101 in one month is worth exactly 100 today
        let npv = net_present_value(dec!(100), &[dec!(101)], dec!(12));
        assert_eq!(npv, Decimal::ZERO);
    }

    #[test]
    fn test_npv_discounting_reduces_value() {
        let cfs = vec![dec!(1000); 120];
        let undiscounted = net_present_value(dec!(50000), &cfs, Decimal::ZERO);
        let discounted = net_present_value(dec!(50000), &cfs, dec!(10));
        assert_eq!(undiscounted, dec!(70000));
        assert!(discounted < undiscounted);
    }

    #[test]
    fn test_irr_monthly_annuity() {
        // 1000 now, 100 a month for a year => ~2.92% a month, ~35.07% a year
        let cfs = vec![dec!(100); 12];
        let est = irr(dec!(1000), &cfs);
        assert!(est.converged);
        assert!(
            (est.annual_rate - dec!(35.07)).abs() < dec!(0.05),
            "Expected IRR ~35.07%, got {}",
            est.annual_rate
        );
    }

    #[test]
    fn test_irr_never_recovers_does_not_converge() {
        let cfs = vec![dec!(-10); 24];
        let est = irr(dec!(1000), &cfs);
        assert!(!est.converged);
        assert!(est.annual_rate >= Decimal::ZERO);
    }

    #[test]
    fn test_payback_exact_month() {
        // 1000 recovered by the 10th payment of 100
        let cfs = vec![dec!(100); 12];
        let years = payback_period_years(dec!(1000), &cfs).unwrap();
        assert_eq!(years, dec!(10) / dec!(12));
    }

    #[test]
    fn test_payback_interpolates_within_month() {
        // After 2 months: -1000 + 800 = -200; month 3 brings +400 => half way
        let cfs = vec![dec!(400); 3];
        let years = payback_period_years(dec!(1000), &cfs).unwrap();
        assert_eq!(years, dec!(2.5) / dec!(12));
    }

    #[test]
    fn test_payback_never() {
        let cfs = vec![dec!(10); 12];
        assert_eq!(payback_period_years(dec!(1000), &cfs), None);
        assert_eq!(payback_period_years(dec!(1000), &[]), None);
    }

    #[test]
    fn test_payback_nothing_invested() {
        assert_eq!(payback_period_years(Decimal::ZERO, &[dec!(5)]), Some(Decimal::ZERO));
        assert_eq!(payback_period_years(Decimal::ZERO, &[Decimal::ZERO]), Some(Decimal::ZERO));
    }

    #[test]
    fn test_payback_nothing_invested_but_losing_money() {
        let cfs = vec![dec!(-10156.07); 240];
        assert_eq!(payback_period_years(Decimal::ZERO, &cfs), None);
        assert_eq!(payback_period_years(Decimal::ZERO, &[]), None);
    }

    #[test]
    fn test_rental_yield() {
        // 1,000/month fully let on 200,000 => 6%
        assert_eq!(rental_yield(dec!(200000), dec!(1000), dec!(100)), dec!(6));
        // 95% occupancy => 5.7%
        assert_eq!(rental_yield(dec!(200000), dec!(1000), dec!(95)), dec!(5.7));
    }

    #[test]
    fn test_rental_yield_zero_value() {
        assert_eq!(rental_yield(Decimal::ZERO, dec!(1000), dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn test_cash_on_cash() {
        assert_eq!(cash_on_cash_return(dec!(100000), dec!(8000)), dec!(8));
        assert_eq!(cash_on_cash_return(Decimal::ZERO, dec!(8000)), Decimal::ZERO);
    }
}
