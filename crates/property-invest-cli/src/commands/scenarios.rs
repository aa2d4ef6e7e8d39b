use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use property_invest_core::scenarios::{
    analyze_weighted_scenarios_with, evaluate_sensitivity_with, run_scenario_with,
    EconomicScenario, SensitivityInput, SensitivityVariable, WeightedScenario,
};
use property_invest_core::EngineConfig;

use super::{load_holding, load_investment};
use crate::input;

/// Arguments for economic scenarios
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to the investment record (JSON or YAML); stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Scenario file: one scenario, or a list of scenarios with probabilities
    #[arg(long)]
    pub scenario: String,

    /// Holding-period configuration; re-runs the sale analysis under the scenario
    #[arg(long)]
    pub holding: Option<String>,
}

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to the investment record (JSON or YAML); stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// First sensitivity variable in format field:min:max:step
    /// (e.g. "monthly_rent:6000:12000:1000")
    #[arg(long)]
    pub var1: String,

    /// Second sensitivity variable in format field:min:max:step
    /// (e.g. "floating_rate:8:14:1")
    #[arg(long)]
    pub var2: String,

    /// Metric read from each cell: net_cash_flow, personal_cash_flow,
    /// annual_roi, npv, rental_yield
    #[arg(long, default_value = "net_cash_flow")]
    pub metric: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScenarioFile {
    Weighted(Vec<WeightedScenario>),
    Single(EconomicScenario),
}

fn parse_sens_var(spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be field:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    Ok(SensitivityVariable {
        field: parts[0].parse()?,
        min: parts[1].parse::<Decimal>()?,
        max: parts[2].parse::<Decimal>()?,
        step: parts[3].parse::<Decimal>()?,
    })
}

pub fn run_scenario(args: ScenarioArgs, engine: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_investment(args.input.as_deref())?;
    let holding = load_holding(args.holding.as_deref())?;

    match input::file::read_input::<ScenarioFile>(&args.scenario)? {
        ScenarioFile::Single(scenario) => {
            let outcome = run_scenario_with(&record, &scenario, holding.as_ref(), engine);
            Ok(serde_json::to_value(outcome)?)
        }
        ScenarioFile::Weighted(scenarios) => {
            if holding.is_some() {
                tracing::warn!("--holding is ignored for probability-weighted scenarios");
            }
            let result = analyze_weighted_scenarios_with(&record, &scenarios, engine)?;
            Ok(serde_json::to_value(result)?)
        }
    }
}

pub fn run_sensitivity(args: SensitivityArgs, engine: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_investment(args.input.as_deref())?;
    let sensitivity = SensitivityInput {
        variable_1: parse_sens_var(&args.var1)?,
        variable_2: parse_sens_var(&args.var2)?,
        metric: args.metric.parse()?,
    };
    let result = evaluate_sensitivity_with(&record, &sensitivity, engine)?;
    Ok(serde_json::to_value(result)?)
}
