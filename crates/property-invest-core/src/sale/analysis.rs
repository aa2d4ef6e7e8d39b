use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::projection::{
    accumulate_from_steps, project_property_value, remaining_balance_at_month, YearlyBreakdown,
};
use super::validation::{validate_holding_config, HoldingPeriodConfig};
use crate::config::EngineConfig;
use crate::error::PropertyInvestError;
use crate::investment::{calculate_normalized, CalculationResult, InvestmentInput, NormalizedInput};
use crate::safe::{finite, percent_of, HUNDRED, MONTHS_PER_YEAR};
use crate::types::{ComputationMetadata, Money, Percent};
use crate::PropertyInvestResult;

/// Year with the highest sell-now ROI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalSaleYear {
    pub year: u32,
    pub roi: Percent,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleAnalysisResult {
    pub holding_config: HoldingPeriodConfig,
    /// The no-sale calculation, run with the effective sale-cost rate
    pub base: CalculationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_date: Option<NaiveDate>,
    pub sale_cost_rate: Percent,
    pub projected_property_value: Money,
    pub remaining_loan_balance: Money,
    pub gross_sale_proceeds: Money,
    pub total_sale_costs: Money,
    /// Gross proceeds less sale costs and the loan payoff
    pub net_sale_proceeds: Money,
    pub total_cash_flow: Money,
    /// Net proceeds plus cash flow collected over the hold
    pub total_return: Money,
    pub total_roi: Percent,
    pub annualized_roi: Percent,
    pub yearly_breakdown: Vec<YearlyBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_sale_year: Option<OptimalSaleYear>,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Base result plus an optional sale section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentReport {
    pub base: CalculationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<SaleAnalysisResult>,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Sale analysis
// ---------------------------------------------------------------------------

pub fn calculate_sale_analysis(
    input: &InvestmentInput,
    config: &HoldingPeriodConfig,
) -> PropertyInvestResult<SaleAnalysisResult> {
    calculate_sale_analysis_with(input, config, &EngineConfig::default())
}

/// Project a hold-then-sell over `config.holding_period_months`.
///
/// A configuration that fails [`validate_holding_config`] is rejected with
/// [`PropertyInvestError::Validation`]; its warnings are carried on the
/// result otherwise.
pub fn calculate_sale_analysis_with(
    input: &InvestmentInput,
    config: &HoldingPeriodConfig,
    engine: &EngineConfig,
) -> PropertyInvestResult<SaleAnalysisResult> {
    sale_analysis_normalized(&input.normalize_with(&engine.defaults), config, engine)
}

pub(crate) fn sale_analysis_normalized(
    inputs: &NormalizedInput,
    config: &HoldingPeriodConfig,
    engine: &EngineConfig,
) -> PropertyInvestResult<SaleAnalysisResult> {
    let start = Instant::now();

    let report = validate_holding_config(config, &engine.sale_limits);
    if !report.is_valid() {
        return Err(PropertyInvestError::Validation(report.errors));
    }
    let mut warnings = report.warnings;

    let months = config.holding_period_months;
    let inputs = NormalizedInput {
        sale_cost_rate: config.sale_cost_rate.unwrap_or(inputs.sale_cost_rate),
        ..inputs.clone()
    };

    let base = calculate_normalized(&inputs, engine);
    let initial = base.total_initial_capital();

    let projected_property_value =
        project_property_value(inputs.property_price, config.appreciation_rate, months);
    let remaining_loan_balance = remaining_balance_at_month(&inputs, months);
    let gross_sale_proceeds = projected_property_value;
    let total_sale_costs = finite(percent_of(gross_sale_proceeds, inputs.sale_cost_rate));
    let net_sale_proceeds = finite(
        gross_sale_proceeds
            .checked_sub(total_sale_costs)
            .and_then(|v| v.checked_sub(remaining_loan_balance)),
    );
    if net_sale_proceeds < Decimal::ZERO {
        warnings.push(format!(
            "Sale proceeds do not cover the remaining loan balance (short by {:.0})",
            net_sale_proceeds.abs()
        ));
    }

    let accumulated = accumulate_from_steps(&inputs, &base.steps, months, config.appreciation_rate);
    let total_cash_flow = accumulated.total_cash_flow;

    let total_return = finite(net_sale_proceeds.checked_add(total_cash_flow));
    let total_roi = finite(
        total_return
            .checked_sub(initial)
            .and_then(|gain| gain.checked_div(initial))
            .and_then(|v| v.checked_mul(HUNDRED)),
    );
    let annualized_roi = annualized_return(total_return, initial, months);

    let optimal_sale_year = optimal_sale_year(&accumulated.yearly_breakdown);
    let sale_date = config
        .sale_date
        .or_else(|| derive_sale_date(config.purchase_date, months));

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(SaleAnalysisResult {
        holding_config: config.clone(),
        base,
        sale_date,
        sale_cost_rate: inputs.sale_cost_rate,
        projected_property_value,
        remaining_loan_balance,
        gross_sale_proceeds,
        total_sale_costs,
        net_sale_proceeds,
        total_cash_flow,
        total_return,
        total_roi,
        annualized_roi,
        yearly_breakdown: accumulated.yearly_breakdown,
        optimal_sale_year,
        warnings,
        metadata: ComputationMetadata::new(elapsed),
    })
}

/// `((total_return / initial)^(1/years) − 1) × 100`. A non-positive ratio
/// means the capital is wiped out: −100.
fn annualized_return(total_return: Money, initial: Money, months: u32) -> Percent {
    if initial <= Decimal::ZERO || months == 0 {
        return Decimal::ZERO;
    }
    let Some(ratio) = total_return.checked_div(initial) else {
        return Decimal::ZERO;
    };
    if ratio <= Decimal::ZERO {
        return -HUNDRED;
    }

    let years = Decimal::from(months) / MONTHS_PER_YEAR;
    finite(
        Decimal::ONE
            .checked_div(years)
            .and_then(|exp| ratio.checked_powd(exp))
            .and_then(|growth| growth.checked_sub(Decimal::ONE))
            .and_then(|v| v.checked_mul(HUNDRED)),
    )
}

fn optimal_sale_year(breakdown: &[YearlyBreakdown]) -> Option<OptimalSaleYear> {
    let last_year = breakdown.last()?.year;
    let best = breakdown
        .iter()
        .fold(None::<&YearlyBreakdown>, |best, row| match best {
            Some(b) if b.roi_if_sold >= row.roi_if_sold => Some(b),
            _ => Some(row),
        })?;

    let reasoning = if best.year == last_year {
        format!(
            "ROI is still highest at the end of the {last_year}-year hold; holding longer may improve returns further"
        )
    } else if best.year <= 3 {
        format!(
            "An early sale in year {} gives the best ROI; later appreciation does not outpace carrying and transaction costs",
            best.year
        )
    } else {
        format!(
            "Year {} balances accumulated appreciation and cash flow against transaction costs",
            best.year
        )
    };

    Some(OptimalSaleYear {
        year: best.year,
        roi: best.roi_if_sold,
        reasoning,
    })
}

fn derive_sale_date(purchase_date: Option<NaiveDate>, months: u32) -> Option<NaiveDate> {
    purchase_date?.checked_add_months(Months::new(months))
}

// ---------------------------------------------------------------------------
// Combined report
// ---------------------------------------------------------------------------

pub fn analyze_investment(
    input: &InvestmentInput,
    holding: Option<&HoldingPeriodConfig>,
) -> InvestmentReport {
    analyze_investment_with(input, holding, &EngineConfig::default())
}

/// Base calculation plus, when a holding configuration is present and
/// enabled, the sale analysis. A failed sale analysis never costs the caller
/// the base result: the sale section is left out and the reason becomes a
/// warning.
pub fn analyze_investment_with(
    input: &InvestmentInput,
    holding: Option<&HoldingPeriodConfig>,
    engine: &EngineConfig,
) -> InvestmentReport {
    let inputs = input.normalize_with(&engine.defaults);
    let base = calculate_normalized(&inputs, engine);
    let mut warnings = Vec::new();

    let sale = match holding {
        Some(config) if config.enabled => match sale_analysis_normalized(&inputs, config, engine) {
            Ok(sale) => Some(sale),
            Err(e) => {
                tracing::warn!(error = %e, "sale analysis skipped");
                warnings.push(format!("Sale analysis skipped: {e}"));
                None
            }
        },
        _ => None,
    };

    InvestmentReport {
        base,
        sale,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// No loan, no running costs, no rent: only appreciation moves the needle.
    fn unlevered_input() -> InvestmentInput {
        InvestmentInput::new(dec!(1000000))
            .equity(dec!(1000000))
            .purchase_cost_rate(Decimal::ZERO)
            .maintenance_rate(Decimal::ZERO)
            .capex_reserve_rate(Decimal::ZERO)
            .property_insurance_rate(Decimal::ZERO)
            .sale_cost_rate(dec!(2))
    }

    #[test]
    fn test_unlevered_sale() {
        let result =
            calculate_sale_analysis(&unlevered_input(), &HoldingPeriodConfig::new(24, dec!(10)))
                .unwrap();
        assert_eq!(result.projected_property_value, dec!(1210000));
        assert_eq!(result.remaining_loan_balance, Decimal::ZERO);
        assert_eq!(result.total_sale_costs, dec!(24200));
        assert_eq!(result.net_sale_proceeds, dec!(1185800));
        assert_eq!(result.total_cash_flow, Decimal::ZERO);
        assert_eq!(result.total_return, dec!(1185800));
        assert_eq!(result.total_roi, dec!(18.58));
        // sqrt(1.1858) - 1 ≈ 8.8944%
        assert!((result.annualized_roi - dec!(8.8944)).abs() < dec!(0.001));
    }

    #[test]
    fn test_sale_cost_override() {
        let mut config = HoldingPeriodConfig::new(24, dec!(10));
        config.sale_cost_rate = Some(dec!(5));
        let result = calculate_sale_analysis(&unlevered_input(), &config).unwrap();
        assert_eq!(result.sale_cost_rate, dec!(5));
        assert_eq!(result.total_sale_costs, dec!(60500));
        assert_eq!(result.base.inputs.sale_cost_rate, dec!(5));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = calculate_sale_analysis(&unlevered_input(), &HoldingPeriodConfig::new(6, dec!(3)))
            .unwrap_err();
        assert!(matches!(err, PropertyInvestError::Validation(_)));
    }

    #[test]
    fn test_optimal_year_final_when_appreciating() {
        let result =
            calculate_sale_analysis(&unlevered_input(), &HoldingPeriodConfig::new(60, dec!(5)))
                .unwrap();
        let best = result.optimal_sale_year.unwrap();
        assert_eq!(best.year, 5);
        assert!(best.reasoning.contains("holding longer"));
    }

    #[test]
    fn test_optimal_year_early_when_depreciating() {
        let result =
            calculate_sale_analysis(&unlevered_input(), &HoldingPeriodConfig::new(60, dec!(-5)))
                .unwrap();
        let best = result.optimal_sale_year.unwrap();
        assert_eq!(best.year, 1);
        assert!(best.reasoning.contains("early sale"));
    }

    #[test]
    fn test_optimal_year_reasoning_mid_term() {
        let rows: Vec<YearlyBreakdown> = [dec!(1), dec!(3), dec!(5), dec!(7), dec!(4), dec!(2)]
            .iter()
            .enumerate()
            .map(|(i, roi)| YearlyBreakdown {
                year: i as u32 + 1,
                property_value: Decimal::ZERO,
                remaining_loan_balance: Decimal::ZERO,
                annual_cash_flow: Decimal::ZERO,
                cumulative_cash_flow: Decimal::ZERO,
                accumulated_equity: Decimal::ZERO,
                roi_if_sold: *roi,
            })
            .collect();
        let best = optimal_sale_year(&rows).unwrap();
        assert_eq!(best.year, 4);
        assert!(best.reasoning.starts_with("Year 4 balances"));
        assert_eq!(optimal_sale_year(&[]), None);
    }

    #[test]
    fn test_annualized_wiped_out() {
        assert_eq!(annualized_return(dec!(-5000), dec!(100000), 60), dec!(-100));
        assert_eq!(annualized_return(dec!(5000), Decimal::ZERO, 60), Decimal::ZERO);
    }

    #[test]
    fn test_sale_date_from_purchase_date() {
        let mut config = HoldingPeriodConfig::new(30, dec!(3));
        config.purchase_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        let result = calculate_sale_analysis(&unlevered_input(), &config).unwrap();
        assert_eq!(result.sale_date, NaiveDate::from_ymd_opt(2026, 7, 31));

        config.sale_date = NaiveDate::from_ymd_opt(2027, 1, 1);
        let result = calculate_sale_analysis(&unlevered_input(), &config).unwrap();
        assert_eq!(result.sale_date, NaiveDate::from_ymd_opt(2027, 1, 1));
    }

    #[test]
    fn test_underwater_sale_warns() {
        let input = InvestmentInput::new(dec!(1000000)).loan_to_value(dec!(95));
        let result =
            calculate_sale_analysis(&input, &HoldingPeriodConfig::new(24, dec!(-10))).unwrap();
        assert!(result.net_sale_proceeds < Decimal::ZERO);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("Sale proceeds do not cover")));
    }

    #[test]
    fn test_report_keeps_base_when_sale_invalid() {
        let config = HoldingPeriodConfig::new(400, dec!(3));
        let report = analyze_investment(&unlevered_input(), Some(&config));
        assert!(report.sale.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Sale analysis skipped"));
        assert_eq!(report.base, {
            let mut expected = crate::investment::calculate_investment(&unlevered_input());
            expected.metadata = report.base.metadata.clone();
            expected
        });
    }

    #[test]
    fn test_report_without_sale() {
        let report = analyze_investment(&unlevered_input(), None);
        assert!(report.sale.is_none());
        assert!(report.warnings.is_empty());

        let mut config = HoldingPeriodConfig::new(400, dec!(3));
        config.enabled = false;
        let report = analyze_investment(&unlevered_input(), Some(&config));
        assert!(report.sale.is_none());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_report_with_sale() {
        let config = HoldingPeriodConfig::new(60, dec!(3));
        let report = analyze_investment(&unlevered_input(), Some(&config));
        assert!(report.sale.is_some());
        assert!(report.warnings.is_empty());
    }
}
