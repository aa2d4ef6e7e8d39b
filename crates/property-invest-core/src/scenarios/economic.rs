//! Economic scenarios: named bundles of market shifts applied to an
//! investment record before the pipeline (and optionally the sale engine)
//! runs again.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::investment::{calculate_normalized, CalculationResult, InvestmentInput, NormalizedInput};
use crate::safe::{finite, percent_of, HUNDRED};
use crate::sale::analysis::sale_analysis_normalized;
use crate::sale::{HoldingPeriodConfig, SaleAnalysisResult};
use crate::types::{Money, Percent};

/// Shifts to the market the property operates in. Percent changes scale a
/// value (`-10` = 10% lower); point changes are added to a rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketAdjustment {
    /// Percent change to the purchase price (equity scales with it)
    pub property_price_change: Percent,
    /// Percent change to the monthly rent
    pub rental_change: Percent,
    /// Points added to the preferential rate
    pub preferential_rate_change: Percent,
    /// Points added to the floating rate
    pub floating_rate_change: Percent,
    /// Points added to occupancy
    pub occupancy_change: Percent,
    /// Percent change to management, maintenance, CapEx and insurance costs
    pub operating_cost_change: Percent,
    /// Informational, carried to the outcome
    pub market_sentiment: Option<Decimal>,
    /// Informational, carried to the outcome
    pub liquidity: Option<Decimal>,
}

/// Shifts that only matter when the property is sold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleAdjustment {
    /// Points added to annual appreciation
    pub appreciation_change: Percent,
    /// Points added to the sale-cost rate
    pub sale_cost_change: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicScenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub market: MarketAdjustment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale: Option<SaleAdjustment>,
}

/// Scenario result against the unadjusted base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDeltas {
    pub net_cash_flow: Money,
    pub personal_cash_flow: Money,
    pub annual_roi: Percent,
    pub npv: Money,
    pub rental_yield: Percent,
    /// Present only when both the base and the scenario sale analyses ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_return: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_sentiment: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<Decimal>,
    pub adjusted_input: NormalizedInput,
    pub result: CalculationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<SaleAnalysisResult>,
    pub deltas: ScenarioDeltas,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Adjustment
// ---------------------------------------------------------------------------

fn scale(value: Decimal, change_pct: Percent) -> Decimal {
    finite(
        HUNDRED
            .checked_add(change_pct)
            .and_then(|factor| percent_of(value, factor)),
    )
    .max(Decimal::ZERO)
}

fn shift(rate: Percent, points: Percent) -> Percent {
    finite(rate.checked_add(points)).max(Decimal::ZERO)
}

/// A copy of `inputs` with the scenario applied. Amounts and rates never go
/// negative and occupancy stays within 0-100%.
pub fn apply_scenario(inputs: &NormalizedInput, scenario: &EconomicScenario) -> NormalizedInput {
    let m = &scenario.market;
    let mut adjusted = inputs.clone();

    adjusted.property_price = scale(inputs.property_price, m.property_price_change);
    adjusted.equity = scale(inputs.equity, m.property_price_change);
    adjusted.monthly_rent = scale(inputs.monthly_rent, m.rental_change);
    adjusted.preferential_rate = shift(inputs.preferential_rate, m.preferential_rate_change);
    adjusted.floating_rate = shift(inputs.floating_rate, m.floating_rate_change);
    adjusted.occupancy_rate = shift(inputs.occupancy_rate, m.occupancy_change).min(HUNDRED);

    adjusted.management_fee = scale(inputs.management_fee, m.operating_cost_change);
    adjusted.maintenance_rate = scale(inputs.maintenance_rate, m.operating_cost_change);
    adjusted.capex_reserve_rate = scale(inputs.capex_reserve_rate, m.operating_cost_change);
    adjusted.property_insurance_rate =
        scale(inputs.property_insurance_rate, m.operating_cost_change);

    if let Some(sale) = &scenario.sale {
        adjusted.sale_cost_rate = shift(inputs.sale_cost_rate, sale.sale_cost_change);
    }

    adjusted
}

/// A copy of `config` with the scenario's sale adjustment applied. The
/// sale-cost override is only shifted when one is set; otherwise the shift
/// already reached the record through [`apply_scenario`].
pub fn adjust_holding_config(
    config: &HoldingPeriodConfig,
    scenario: &EconomicScenario,
) -> HoldingPeriodConfig {
    let mut adjusted = config.clone();
    if let Some(sale) = &scenario.sale {
        adjusted.appreciation_rate = finite(config.appreciation_rate.checked_add(sale.appreciation_change));
        adjusted.sale_cost_rate = config
            .sale_cost_rate
            .map(|rate| shift(rate, sale.sale_cost_change));
    }
    adjusted
}

// ---------------------------------------------------------------------------
// Running a scenario
// ---------------------------------------------------------------------------

pub fn run_scenario(
    input: &InvestmentInput,
    scenario: &EconomicScenario,
    holding: Option<&HoldingPeriodConfig>,
) -> ScenarioOutcome {
    run_scenario_with(input, scenario, holding, &EngineConfig::default())
}

/// Run the base and the adjusted record side by side. When a holding
/// configuration is given and enabled, both are also run through the sale
/// engine; a failed sale analysis is reported as a warning.
pub fn run_scenario_with(
    input: &InvestmentInput,
    scenario: &EconomicScenario,
    holding: Option<&HoldingPeriodConfig>,
    engine: &EngineConfig,
) -> ScenarioOutcome {
    let base_inputs = input.normalize_with(&engine.defaults);
    let adjusted_input = apply_scenario(&base_inputs, scenario);

    let base = calculate_normalized(&base_inputs, engine);
    let result = calculate_normalized(&adjusted_input, engine);

    let mut warnings = Vec::new();
    let (base_sale, sale) = match holding {
        Some(config) if config.enabled => {
            let adjusted_config = adjust_holding_config(config, scenario);
            let base_sale = sale_analysis_normalized(&base_inputs, config, engine).ok();
            let sale = match sale_analysis_normalized(&adjusted_input, &adjusted_config, engine) {
                Ok(sale) => Some(sale),
                Err(e) => {
                    tracing::warn!(scenario = %scenario.name, error = %e, "scenario sale analysis skipped");
                    warnings.push(format!("Sale analysis skipped under '{}': {e}", scenario.name));
                    None
                }
            };
            (base_sale, sale)
        }
        _ => (None, None),
    };

    let deltas = ScenarioDeltas {
        net_cash_flow: difference(result.net_property_cash_flow(), base.net_property_cash_flow()),
        personal_cash_flow: difference(
            result.steps.personal_cash_flow.final_cash_flow,
            base.steps.personal_cash_flow.final_cash_flow,
        ),
        annual_roi: difference(result.metrics.annual_roi, base.metrics.annual_roi),
        npv: difference(result.metrics.npv, base.metrics.npv),
        rental_yield: difference(result.metrics.rental_yield, base.metrics.rental_yield),
        total_return: match (&sale, &base_sale) {
            (Some(s), Some(b)) => Some(difference(s.total_return, b.total_return)),
            _ => None,
        },
    };

    ScenarioOutcome {
        scenario_name: scenario.name.clone(),
        market_sentiment: scenario.market.market_sentiment,
        liquidity: scenario.market.liquidity,
        adjusted_input,
        result,
        sale,
        deltas,
        warnings,
    }
}

fn difference(scenario: Decimal, base: Decimal) -> Decimal {
    finite(scenario.checked_sub(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> InvestmentInput {
        InvestmentInput::new(dec!(1500000))
            .loan_to_value(dec!(65))
            .preferential_rate(dec!(5.5))
            .floating_rate(dec!(7.5))
            .loan_term_years(25)
            .monthly_rent(dec!(10000))
            .management_fee(dec!(500))
    }

    fn recession() -> EconomicScenario {
        EconomicScenario {
            name: "Recession".into(),
            description: "Falling prices and rents, higher rates".into(),
            market: MarketAdjustment {
                property_price_change: dec!(-10),
                rental_change: dec!(-15),
                preferential_rate_change: dec!(1),
                floating_rate_change: dec!(2),
                occupancy_change: dec!(-10),
                operating_cost_change: dec!(5),
                market_sentiment: Some(dec!(-0.6)),
                liquidity: Some(dec!(0.4)),
            },
            sale: Some(SaleAdjustment {
                appreciation_change: dec!(-3),
                sale_cost_change: dec!(1),
            }),
        }
    }

    #[test]
    fn test_apply_scenario_adjusts_fields() {
        let base = sample_input().normalize();
        let adjusted = apply_scenario(&base, &recession());

        assert_eq!(adjusted.property_price, dec!(1350000));
        assert_eq!(adjusted.monthly_rent, dec!(8500));
        assert_eq!(adjusted.preferential_rate, dec!(6.5));
        assert_eq!(adjusted.floating_rate, dec!(9.5));
        assert_eq!(adjusted.occupancy_rate, dec!(85));
        assert_eq!(adjusted.management_fee, dec!(525));
        assert_eq!(adjusted.maintenance_rate, dec!(1.05));
        assert_eq!(adjusted.sale_cost_rate, dec!(4));
        assert_eq!(adjusted.loan_to_value, base.loan_to_value);
    }

    #[test]
    fn test_apply_scenario_leaves_original_untouched() {
        let base = sample_input().normalize();
        let snapshot = base.clone();
        let _ = apply_scenario(&base, &recession());
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_floors_and_clamps() {
        let base = sample_input().normalize();
        let scenario = EconomicScenario {
            name: "Extreme".into(),
            description: String::new(),
            market: MarketAdjustment {
                rental_change: dec!(-150),
                preferential_rate_change: dec!(-20),
                occupancy_change: dec!(50),
                ..Default::default()
            },
            sale: None,
        };
        let adjusted = apply_scenario(&base, &scenario);
        assert_eq!(adjusted.monthly_rent, Decimal::ZERO);
        assert_eq!(adjusted.preferential_rate, Decimal::ZERO);
        assert_eq!(adjusted.occupancy_rate, dec!(100));
    }

    #[test]
    fn test_adjust_holding_config() {
        let mut config = HoldingPeriodConfig::new(60, dec!(4));
        let adjusted = adjust_holding_config(&config, &recession());
        assert_eq!(adjusted.appreciation_rate, dec!(1));
        assert_eq!(adjusted.sale_cost_rate, None);

        config.sale_cost_rate = Some(dec!(2));
        let adjusted = adjust_holding_config(&config, &recession());
        assert_eq!(adjusted.sale_cost_rate, Some(dec!(3)));
    }

    #[test]
    fn test_run_scenario_deltas() {
        let outcome = run_scenario(&sample_input(), &recession(), None);
        assert_eq!(outcome.scenario_name, "Recession");
        assert_eq!(outcome.market_sentiment, Some(dec!(-0.6)));
        assert!(outcome.deltas.net_cash_flow < Decimal::ZERO);
        assert!(outcome.deltas.rental_yield < Decimal::ZERO);
        assert!(outcome.deltas.total_return.is_none());
        assert!(outcome.sale.is_none());

        let base = crate::investment::calculate_investment(&sample_input());
        assert_eq!(
            outcome.deltas.net_cash_flow,
            outcome.result.net_property_cash_flow() - base.net_property_cash_flow()
        );
    }

    #[test]
    fn test_run_scenario_with_sale() {
        let config = HoldingPeriodConfig::new(60, dec!(4));
        let outcome = run_scenario(&sample_input(), &recession(), Some(&config));
        let sale = outcome.sale.as_ref().unwrap();
        assert_eq!(sale.holding_config.appreciation_rate, dec!(1));
        assert!(outcome.deltas.total_return.unwrap() < Decimal::ZERO);
    }

    #[test]
    fn test_neutral_scenario_changes_nothing() {
        let scenario = EconomicScenario {
            name: "Flat".into(),
            description: String::new(),
            market: MarketAdjustment::default(),
            sale: None,
        };
        let base = sample_input().normalize();
        assert_eq!(apply_scenario(&base, &scenario), base);
    }
}
