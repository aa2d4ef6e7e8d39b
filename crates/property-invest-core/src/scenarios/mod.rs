pub mod economic;
pub mod sensitivity;
pub mod weighted;

pub use economic::{
    adjust_holding_config, apply_scenario, run_scenario, run_scenario_with, EconomicScenario,
    MarketAdjustment, SaleAdjustment, ScenarioDeltas, ScenarioOutcome,
};
pub use sensitivity::{
    evaluate_sensitivity, evaluate_sensitivity_with, SensitivityField, SensitivityInput,
    SensitivityMetric, SensitivityOutput, SensitivityVariable,
};
pub use weighted::{
    analyze_weighted_scenarios, analyze_weighted_scenarios_with, WeightedScenario,
    WeightedScenarioOutput, WeightedScenarioResult,
};
