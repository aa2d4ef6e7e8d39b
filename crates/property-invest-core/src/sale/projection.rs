//! Forward projection for a held property: appreciation, loan run-down and the
//! cash flow collected along the way.

use rust_decimal::prelude::RoundingStrategy;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::investment::{run_pipeline, CalculationSteps, NormalizedInput};
use crate::safe::{compound, finite, percent_of, HUNDRED, MONTHS_PER_YEAR};
use crate::types::{Money, Percent};

/// One year-boundary snapshot of the hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyBreakdown {
    /// 1-based
    pub year: u32,
    pub property_value: Money,
    pub remaining_loan_balance: Money,
    /// Cash flow collected during this year (fewer than 12 months in a
    /// partial final year)
    pub annual_cash_flow: Money,
    pub cumulative_cash_flow: Money,
    /// Property value less the remaining loan balance
    pub accumulated_equity: Money,
    /// ROI if the property were sold at this boundary, percent
    pub roi_if_sold: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedCashFlows {
    pub total_cash_flow: Money,
    pub yearly_breakdown: Vec<YearlyBreakdown>,
}

// ---------------------------------------------------------------------------
// Value and balance
// ---------------------------------------------------------------------------

/// `value × (1 + rate/100)^(months/12)`, rounded to a whole currency unit.
pub fn project_property_value(
    current_value: Money,
    annual_appreciation: Percent,
    holding_months: u32,
) -> Money {
    let Some(rate) = annual_appreciation.checked_div(HUNDRED) else {
        return Decimal::ZERO;
    };

    let growth = if holding_months % 12 == 0 {
        compound(rate, holding_months / 12)
    } else {
        let years = Decimal::from(holding_months) / MONTHS_PER_YEAR;
        Decimal::ONE
            .checked_add(rate)
            .and_then(|base| base.checked_powd(years))
    };

    finite(growth.and_then(|g| current_value.checked_mul(g)))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Loan balance outstanding after `elapsed_months`. A loan that cannot be
/// priced (zero term, inverted periods) reports 0.
pub fn remaining_balance_at_month(inputs: &NormalizedInput, elapsed_months: u32) -> Money {
    inputs
        .loan_terms()
        .remaining_balance_at(elapsed_months)
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, elapsed_months, "remaining balance unavailable");
            Decimal::ZERO
        })
}

// ---------------------------------------------------------------------------
// Accumulated cash flow
// ---------------------------------------------------------------------------

/// Year-by-year cash flow and equity over a hold of `holding_months`, using
/// the steady monthly net property cash flow of the pipeline.
pub fn accumulated_cash_flows(
    inputs: &NormalizedInput,
    holding_months: u32,
    annual_appreciation: Percent,
) -> AccumulatedCashFlows {
    let (steps, _) = run_pipeline(inputs);
    accumulate_from_steps(inputs, &steps, holding_months, annual_appreciation)
}

pub(crate) fn accumulate_from_steps(
    inputs: &NormalizedInput,
    steps: &CalculationSteps,
    holding_months: u32,
    annual_appreciation: Percent,
) -> AccumulatedCashFlows {
    let monthly = steps.property_cash_flow.net_cash_flow;
    let initial = steps.initial_capital.total_initial_capital;
    let years = holding_months.div_ceil(12);

    let mut yearly_breakdown = Vec::with_capacity(years as usize);
    let mut cumulative = Decimal::ZERO;

    for year in 1..=years {
        let months_before = (year - 1) * 12;
        let months_this_year = (holding_months - months_before).min(12);
        let elapsed = months_before + months_this_year;

        let annual_cash_flow = finite(monthly.checked_mul(Decimal::from(months_this_year)));
        cumulative = finite(cumulative.checked_add(annual_cash_flow));

        let property_value =
            project_property_value(inputs.property_price, annual_appreciation, elapsed);
        let remaining_loan_balance = remaining_balance_at_month(inputs, elapsed);
        let accumulated_equity = finite(property_value.checked_sub(remaining_loan_balance));

        let roi_if_sold = sell_now_roi(
            property_value,
            inputs.sale_cost_rate,
            remaining_loan_balance,
            cumulative,
            initial,
        );

        yearly_breakdown.push(YearlyBreakdown {
            year,
            property_value,
            remaining_loan_balance,
            annual_cash_flow,
            cumulative_cash_flow: cumulative,
            accumulated_equity,
            roi_if_sold,
        });
    }

    AccumulatedCashFlows {
        total_cash_flow: cumulative,
        yearly_breakdown,
    }
}

/// `(value − sale costs − balance + cumulative − initial) / initial × 100`
fn sell_now_roi(
    value: Money,
    sale_cost_rate: Percent,
    balance: Money,
    cumulative_cash_flow: Money,
    initial: Money,
) -> Percent {
    finite(
        percent_of(value, sale_cost_rate)
            .and_then(|costs| value.checked_sub(costs))
            .and_then(|v| v.checked_sub(balance))
            .and_then(|v| v.checked_add(cumulative_cash_flow))
            .and_then(|v| v.checked_sub(initial))
            .and_then(|gain| gain.checked_div(initial))
            .and_then(|v| v.checked_mul(HUNDRED)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investment::InvestmentInput;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_years_compound_exactly() {
        assert_eq!(project_property_value(dec!(1000000), dec!(5), 24), dec!(1102500));
        assert_eq!(project_property_value(dec!(1000000), dec!(-10), 12), dec!(900000));
        assert_eq!(project_property_value(dec!(1000000), Decimal::ZERO, 37), dec!(1000000));
    }

    #[test]
    fn test_partial_year_interpolates_geometrically() {
        // 1.21^(1/2) = 1.1
        let v = project_property_value(dec!(1000000), dec!(21), 6);
        assert!((v - dec!(1100000)).abs() <= Decimal::ONE, "got {v}");
    }

    #[test]
    fn test_value_is_rounded_to_whole_units() {
        let v = project_property_value(dec!(333333), dec!(3.3), 7);
        assert_eq!(v, v.trunc());
    }

    #[test]
    fn test_zero_months_is_current_value() {
        assert_eq!(project_property_value(dec!(500000), dec!(8), 0), dec!(500000));
    }

    #[test]
    fn test_partial_final_year() {
        let inputs = InvestmentInput::new(dec!(1000000))
            .loan_to_value(Decimal::ZERO)
            .monthly_rent(dec!(10000))
            .occupancy_rate(dec!(100))
            .rental_tax_rate(Decimal::ZERO)
            .maintenance_rate(Decimal::ZERO)
            .capex_reserve_rate(Decimal::ZERO)
            .property_insurance_rate(Decimal::ZERO)
            .normalize();

        let acc = accumulated_cash_flows(&inputs, 30, Decimal::ZERO);
        assert_eq!(acc.yearly_breakdown.len(), 3);
        assert_eq!(acc.yearly_breakdown[0].annual_cash_flow, dec!(120000));
        assert_eq!(acc.yearly_breakdown[2].annual_cash_flow, dec!(60000));
        assert_eq!(acc.total_cash_flow, dec!(300000));
        assert_eq!(acc.yearly_breakdown[2].cumulative_cash_flow, dec!(300000));

        // No loan: equity is the whole value
        for row in &acc.yearly_breakdown {
            assert_eq!(row.remaining_loan_balance, Decimal::ZERO);
            assert_eq!(row.accumulated_equity, row.property_value);
        }
    }

    #[test]
    fn test_sell_now_roi_at_each_boundary() {
        let inputs = InvestmentInput::new(dec!(1000000))
            .loan_to_value(Decimal::ZERO)
            .purchase_cost_rate(Decimal::ZERO)
            .sale_cost_rate(dec!(2))
            .maintenance_rate(Decimal::ZERO)
            .capex_reserve_rate(Decimal::ZERO)
            .property_insurance_rate(Decimal::ZERO)
            .normalize();

        let acc = accumulated_cash_flows(&inputs, 12, dec!(10));
        let row = &acc.yearly_breakdown[0];
        assert_eq!(row.property_value, dec!(1100000));
        // (1,100,000 − 22,000 − 0 + 0 − 1,000,000) / 1,000,000 = 7.8%
        assert_eq!(row.roi_if_sold, dec!(7.8));
    }

    #[test]
    fn test_balance_runs_down_over_the_hold() {
        let inputs = InvestmentInput::new(dec!(1000000)).normalize();
        let acc = accumulated_cash_flows(&inputs, 120, dec!(3));
        let balances: Vec<_> = acc
            .yearly_breakdown
            .iter()
            .map(|r| r.remaining_loan_balance)
            .collect();
        assert!(balances.windows(2).all(|w| w[1] < w[0]));
        assert_eq!(remaining_balance_at_month(&inputs, 0), dec!(700000));
        assert_eq!(remaining_balance_at_month(&inputs, 240), Decimal::ZERO);
    }
}
