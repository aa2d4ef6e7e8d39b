use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::analysis::{sale_analysis_normalized, SaleAnalysisResult};
use super::validation::HoldingPeriodConfig;
use crate::config::EngineConfig;
use crate::error::PropertyInvestError;
use crate::investment::InvestmentInput;
use crate::safe::finite;
use crate::types::*;
use crate::PropertyInvestResult;

const BALANCED_ROI_WEIGHT: Decimal = dec!(0.7);
const BALANCED_ANNUALIZED_WEIGHT: Decimal = dec!(0.3);

/// One holding period's headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleScenarioSummary {
    pub holding_period_months: u32,
    pub projected_property_value: Money,
    pub net_sale_proceeds: Money,
    pub total_cash_flow: Money,
    pub total_return: Money,
    pub total_roi: Percent,
    pub annualized_roi: Percent,
    /// 0.7 × total ROI + 0.3 × annualised ROI
    pub balanced_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleScenarioComparison {
    pub scenarios: Vec<SaleScenarioSummary>,
    /// Holding period (months) with the highest total return
    pub best_total_return: u32,
    /// Holding period (months) with the highest total ROI
    pub best_total_roi: u32,
    /// Holding period (months) with the highest balanced score
    pub best_balanced: u32,
}

impl SaleScenarioSummary {
    fn from_analysis(analysis: &SaleAnalysisResult) -> Self {
        let balanced_score = finite(
            analysis
                .total_roi
                .checked_mul(BALANCED_ROI_WEIGHT)
                .zip(analysis.annualized_roi.checked_mul(BALANCED_ANNUALIZED_WEIGHT))
                .and_then(|(a, b)| a.checked_add(b)),
        );
        SaleScenarioSummary {
            holding_period_months: analysis.holding_config.holding_period_months,
            projected_property_value: analysis.projected_property_value,
            net_sale_proceeds: analysis.net_sale_proceeds,
            total_cash_flow: analysis.total_cash_flow,
            total_return: analysis.total_return,
            total_roi: analysis.total_roi,
            annualized_roi: analysis.annualized_roi,
            balanced_score,
        }
    }
}

pub fn compare_sale_scenarios(
    input: &InvestmentInput,
    holding_periods: &[u32],
    base_config: &HoldingPeriodConfig,
) -> PropertyInvestResult<ComputationOutput<SaleScenarioComparison>> {
    compare_sale_scenarios_with(input, holding_periods, base_config, &EngineConfig::default())
}

/// Run one sale analysis per holding period (everything else taken from
/// `base_config`) and pick the best by total return, by total ROI and by a
/// 70/30 blend of total and annualised ROI. Ties go to the period listed
/// first.
pub fn compare_sale_scenarios_with(
    input: &InvestmentInput,
    holding_periods: &[u32],
    base_config: &HoldingPeriodConfig,
    engine: &EngineConfig,
) -> PropertyInvestResult<ComputationOutput<SaleScenarioComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if holding_periods.is_empty() {
        return Err(PropertyInvestError::InsufficientData(
            "At least one holding period required".into(),
        ));
    }

    let inputs = input.normalize_with(&engine.defaults);
    let mut scenarios = Vec::with_capacity(holding_periods.len());

    for &months in holding_periods {
        let config = base_config.with_holding_period(months);
        match sale_analysis_normalized(&inputs, &config, engine) {
            Ok(analysis) => scenarios.push(SaleScenarioSummary::from_analysis(&analysis)),
            Err(e) => {
                tracing::warn!(months, error = %e, "holding period skipped");
                warnings.push(format!("Holding period of {months} months skipped: {e}"));
            }
        }
    }

    let pick = |key: fn(&SaleScenarioSummary) -> Decimal| -> u32 {
        scenarios
            .iter()
            .fold(None::<&SaleScenarioSummary>, |best, s| match best {
                Some(b) if key(b) >= key(s) => Some(b),
                _ => Some(s),
            })
            .map(|s| s.holding_period_months)
            .unwrap_or_default()
    };

    if scenarios.is_empty() {
        return Err(PropertyInvestError::InsufficientData(
            "No valid holding period to compare".into(),
        ));
    }

    let best_total_return = pick(|s| s.total_return);
    let best_total_roi = pick(|s| s.total_roi);
    let best_balanced = pick(|s| s.balanced_score);

    let output = SaleScenarioComparison {
        scenarios,
        best_total_return,
        best_total_roi,
        best_balanced,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Holding Period Sale Comparison",
        &serde_json::json!({
            "holding_periods": holding_periods,
            "appreciation_rate": base_config.appreciation_rate.to_string(),
            "balanced_weights": {
                "total_roi": BALANCED_ROI_WEIGHT.to_string(),
                "annualized_roi": BALANCED_ANNUALIZED_WEIGHT.to_string(),
            },
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> InvestmentInput {
        InvestmentInput::new(dec!(2000000))
            .loan_to_value(dec!(60))
            .preferential_rate(dec!(6))
            .floating_rate(dec!(8))
            .loan_term_years(25)
            .monthly_rent(dec!(14000))
            .management_fee(dec!(700))
    }

    #[test]
    fn test_one_summary_per_period() {
        let out = compare_sale_scenarios(
            &sample_input(),
            &[36, 60, 120],
            &HoldingPeriodConfig::new(60, dec!(4)),
        )
        .unwrap();
        let cmp = &out.result;
        let months: Vec<u32> = cmp.scenarios.iter().map(|s| s.holding_period_months).collect();
        assert_eq!(months, vec![36, 60, 120]);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_longer_hold_wins_total_return_when_appreciating() {
        let out = compare_sale_scenarios(
            &sample_input(),
            &[36, 60, 120],
            &HoldingPeriodConfig::new(60, dec!(4)),
        )
        .unwrap();
        let cmp = &out.result;
        assert!(cmp.scenarios[0].total_return < cmp.scenarios[2].total_return);
        assert_eq!(cmp.best_total_return, 120);
        assert_eq!(cmp.best_total_roi, 120);
    }

    #[test]
    fn test_balanced_score() {
        let out = compare_sale_scenarios(
            &sample_input(),
            &[60],
            &HoldingPeriodConfig::new(60, dec!(4)),
        )
        .unwrap();
        let s = &out.result.scenarios[0];
        assert_eq!(
            s.balanced_score,
            s.total_roi * dec!(0.7) + s.annualized_roi * dec!(0.3)
        );
        assert_eq!(out.result.best_balanced, 60);
    }

    #[test]
    fn test_invalid_periods_skipped() {
        let out = compare_sale_scenarios(
            &sample_input(),
            &[6, 60, 500],
            &HoldingPeriodConfig::new(60, dec!(4)),
        )
        .unwrap();
        assert_eq!(out.result.scenarios.len(), 1);
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_no_valid_period() {
        let base = HoldingPeriodConfig::new(60, dec!(4));
        let err = compare_sale_scenarios(&sample_input(), &[6, 500], &base).unwrap_err();
        assert!(matches!(err, PropertyInvestError::InsufficientData(_)));

        let err = compare_sale_scenarios(&sample_input(), &[], &base).unwrap_err();
        assert!(matches!(err, PropertyInvestError::InsufficientData(_)));
    }
}
