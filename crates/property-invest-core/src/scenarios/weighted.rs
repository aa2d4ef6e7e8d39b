use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::economic::{apply_scenario, EconomicScenario};
use crate::config::EngineConfig;
use crate::error::PropertyInvestError;
use crate::investment::{calculate_normalized, InvestmentInput};
use crate::safe::finite;
use crate::types::*;
use crate::PropertyInvestResult;

/// An economic scenario with the probability of it playing out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedScenario {
    pub scenario: EconomicScenario,
    /// 0-1
    pub probability: Rate,
}

/// Result for a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedScenarioResult {
    pub name: String,
    pub probability: Rate,
    pub net_cash_flow: Money,
    pub annual_roi: Percent,
    pub npv: Money,
    pub deviation_from_base: Money,
    pub deviation_pct: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedScenarioOutput {
    pub results: Vec<WeightedScenarioResult>,
    pub base_net_cash_flow: Money,
    pub base_annual_roi: Percent,
    pub probability_weighted_net_cash_flow: Money,
    pub probability_weighted_annual_roi: Percent,
    pub probability_weighted_npv: Money,
}

pub fn analyze_weighted_scenarios(
    input: &InvestmentInput,
    scenarios: &[WeightedScenario],
) -> PropertyInvestResult<ComputationOutput<WeightedScenarioOutput>> {
    analyze_weighted_scenarios_with(input, scenarios, &EngineConfig::default())
}

/// Run every scenario against the same record and weight the outcomes by
/// probability. Deviations are measured on monthly net property cash flow.
pub fn analyze_weighted_scenarios_with(
    input: &InvestmentInput,
    scenarios: &[WeightedScenario],
    engine: &EngineConfig,
) -> PropertyInvestResult<ComputationOutput<WeightedScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if scenarios.is_empty() {
        return Err(PropertyInvestError::InsufficientData(
            "At least one scenario required".into(),
        ));
    }

    for s in scenarios {
        if s.probability < Decimal::ZERO || s.probability > Decimal::ONE {
            return Err(PropertyInvestError::InvalidInput {
                field: format!("scenario:{} probability", s.scenario.name),
                reason: "Probability must be between 0 and 1".into(),
            });
        }
    }

    let total_prob: Decimal = scenarios.iter().map(|s| s.probability).sum();
    let prob_tolerance = dec!(0.001);
    if (total_prob - Decimal::ONE).abs() > prob_tolerance {
        return Err(PropertyInvestError::InvalidInput {
            field: "probabilities".into(),
            reason: format!("Probabilities must sum to 1.0 (got {total_prob})"),
        });
    }
    if total_prob != Decimal::ONE {
        warnings.push(format!(
            "Probabilities sum to {total_prob}; treated as approximately 1.0"
        ));
    }

    let base_inputs = input.normalize_with(&engine.defaults);
    let base = calculate_normalized(&base_inputs, engine);
    let base_net = base.net_property_cash_flow();

    let mut results = Vec::with_capacity(scenarios.len());
    let mut weighted_net = Decimal::ZERO;
    let mut weighted_roi = Decimal::ZERO;
    let mut weighted_npv = Decimal::ZERO;

    for weighted in scenarios {
        let name = &weighted.scenario.name;
        let outcome = calculate_normalized(&apply_scenario(&base_inputs, &weighted.scenario), engine);
        let net = outcome.net_property_cash_flow();

        let deviation = finite(net.checked_sub(base_net));
        let deviation_pct = if base_net.is_zero() {
            if !deviation.is_zero() {
                warnings.push(format!(
                    "Base cash flow is zero; cannot compute deviation_pct for scenario '{name}'"
                ));
            }
            Decimal::ZERO
        } else {
            finite(deviation.checked_div(base_net))
        };

        let p = weighted.probability;
        weighted_net = finite(net.checked_mul(p).and_then(|v| v.checked_add(weighted_net)));
        weighted_roi = finite(
            outcome
                .metrics
                .annual_roi
                .checked_mul(p)
                .and_then(|v| v.checked_add(weighted_roi)),
        );
        weighted_npv = finite(
            outcome
                .metrics
                .npv
                .checked_mul(p)
                .and_then(|v| v.checked_add(weighted_npv)),
        );

        results.push(WeightedScenarioResult {
            name: name.clone(),
            probability: p,
            net_cash_flow: net,
            annual_roi: outcome.metrics.annual_roi,
            npv: outcome.metrics.npv,
            deviation_from_base: deviation,
            deviation_pct,
        });
    }

    let output = WeightedScenarioOutput {
        results,
        base_net_cash_flow: base_net,
        base_annual_roi: base.metrics.annual_roi,
        probability_weighted_net_cash_flow: weighted_net,
        probability_weighted_annual_roi: weighted_roi,
        probability_weighted_npv: weighted_npv,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Probability-Weighted Economic Scenario Analysis",
        &serde_json::json!({
            "num_scenarios": scenarios.len(),
            "base_net_cash_flow": base_net.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::economic::MarketAdjustment;
    use rust_decimal_macros::dec;

    fn sample_input() -> InvestmentInput {
        InvestmentInput::new(dec!(1000000))
            .loan_to_value(dec!(50))
            .monthly_rent(dec!(9000))
            .occupancy_rate(dec!(100))
    }

    fn rent_shift(name: &str, change: Decimal, probability: Decimal) -> WeightedScenario {
        WeightedScenario {
            scenario: EconomicScenario {
                name: name.into(),
                description: String::new(),
                market: MarketAdjustment {
                    rental_change: change,
                    ..Default::default()
                },
                sale: None,
            },
            probability,
        }
    }

    fn bear_base_bull() -> Vec<WeightedScenario> {
        vec![
            rent_shift("Bear", dec!(-10), dec!(0.25)),
            rent_shift("Base", Decimal::ZERO, dec!(0.50)),
            rent_shift("Bull", dec!(10), dec!(0.25)),
        ]
    }

    #[test]
    fn test_symmetric_scenarios_weight_to_base() {
        let out = analyze_weighted_scenarios(&sample_input(), &bear_base_bull()).unwrap();
        let r = &out.result;
        assert_eq!(r.results.len(), 3);
        assert!(
            (r.probability_weighted_net_cash_flow - r.base_net_cash_flow).abs() < dec!(0.0001)
        );
        assert_eq!(r.results[1].deviation_from_base, Decimal::ZERO);
    }

    #[test]
    fn test_deviations() {
        let out = analyze_weighted_scenarios(&sample_input(), &bear_base_bull()).unwrap();
        let r = &out.result;
        // ±900 rent at 100% occupancy, less 10% rental tax => ±810
        assert_eq!(r.results[0].deviation_from_base, dec!(-810));
        assert_eq!(r.results[2].deviation_from_base, dec!(810));
        assert!(r.results[0].deviation_pct < Decimal::ZERO);
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        let scenarios = vec![
            rent_shift("A", dec!(-10), dec!(0.30)),
            rent_shift("B", dec!(10), dec!(0.30)),
        ];
        assert!(analyze_weighted_scenarios(&sample_input(), &scenarios).is_err());
    }

    #[test]
    fn test_probability_out_of_range() {
        let scenarios = vec![
            rent_shift("A", dec!(-10), dec!(1.5)),
            rent_shift("B", dec!(10), dec!(-0.5)),
        ];
        assert!(analyze_weighted_scenarios(&sample_input(), &scenarios).is_err());
    }

    #[test]
    fn test_near_one_warns() {
        let scenarios = vec![
            rent_shift("A", dec!(-10), dec!(0.5)),
            rent_shift("B", dec!(10), dec!(0.4995)),
        ];
        let out = analyze_weighted_scenarios(&sample_input(), &scenarios).unwrap();
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_empty_scenarios() {
        assert!(analyze_weighted_scenarios(&sample_input(), &[]).is_err());
    }
}
