use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_invest_core::sale::{
    calculate_sale_analysis_with, compare_sale_scenarios_with, HoldingPeriodConfig,
};
use property_invest_core::EngineConfig;

use super::{load_holding, load_investment};

/// Arguments for a single sale projection
#[derive(Args)]
pub struct SaleArgs {
    /// Path to the investment record (JSON or YAML); stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Holding-period configuration file
    #[arg(long)]
    pub holding: String,
}

/// Arguments for the holding-period comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to the investment record (JSON or YAML); stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Holding-period configuration supplying appreciation and sale costs
    #[arg(long)]
    pub holding: Option<String>,

    /// Holding periods to compare, in months
    #[arg(long, value_delimiter = ',', default_value = "24,60,120")]
    pub periods: Vec<u32>,

    /// Annual appreciation (percent) when no holding file is given
    #[arg(long, default_value = "3")]
    pub appreciation: Decimal,
}

pub fn run_sale(args: SaleArgs, engine: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_investment(args.input.as_deref())?;
    let holding = load_holding(Some(args.holding.as_str()))?
        .ok_or("--holding <file> required for the sale analysis")?;
    let result = calculate_sale_analysis_with(&record, &holding, engine)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs, engine: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_investment(args.input.as_deref())?;
    let base = match load_holding(args.holding.as_deref())? {
        Some(holding) => holding,
        None => {
            let first = args.periods.first().copied().unwrap_or(60);
            HoldingPeriodConfig::new(first, args.appreciation)
        }
    };
    let result = compare_sale_scenarios_with(&record, &args.periods, &base, engine)?;
    Ok(serde_json::to_value(result)?)
}
