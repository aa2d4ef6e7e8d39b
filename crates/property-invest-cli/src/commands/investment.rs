use clap::Args;
use serde_json::Value;

use property_invest_core::amortization::amortization_schedule;
use property_invest_core::investment::calculate_investment_with;
use property_invest_core::sale::analyze_investment_with;
use property_invest_core::EngineConfig;

use super::{load_holding, load_investment};

/// Arguments for the cash-flow pipeline
#[derive(Args)]
pub struct InvestArgs {
    /// Path to the investment record (JSON or YAML); stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Holding-period configuration; adds a sale analysis to the report
    #[arg(long)]
    pub holding: Option<String>,
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to the investment record (JSON or YAML); stdin when omitted
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_invest(args: InvestArgs, engine: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_investment(args.input.as_deref())?;
    match load_holding(args.holding.as_deref())? {
        Some(holding) => {
            let report = analyze_investment_with(&record, Some(&holding), engine);
            Ok(serde_json::to_value(report)?)
        }
        None => {
            let result = calculate_investment_with(&record, engine);
            Ok(serde_json::to_value(result)?)
        }
    }
}

pub fn run_schedule(args: ScheduleArgs, engine: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_investment(args.input.as_deref())?;
    let inputs = record.normalize_with(&engine.defaults);
    let max_years = engine.input_limits.max_loan_term_years;
    if inputs.loan_term_years > max_years {
        return Err(format!(
            "Loan term of {} years exceeds the {}-year maximum",
            inputs.loan_term_years, max_years
        )
        .into());
    }
    let schedule = amortization_schedule(&inputs.loan_terms())?;
    tracing::debug!(months = schedule.rows.len(), "amortization schedule built");
    Ok(serde_json::to_value(schedule)?)
}
