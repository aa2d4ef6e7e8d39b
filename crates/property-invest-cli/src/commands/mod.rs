pub mod investment;
pub mod sale;
pub mod scenarios;

use property_invest_core::investment::InvestmentInput;
use property_invest_core::sale::HoldingPeriodConfig;
use property_invest_core::EngineConfig;

use crate::input;

/// Engine configuration from `--config`, or the built-in defaults.
pub fn load_engine_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => input::file::read_input(path),
        None => Ok(EngineConfig::default()),
    }
}

/// The investment record from `--input`, falling back to piped stdin.
pub fn load_investment(path: Option<&str>) -> Result<InvestmentInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_input(path)
    } else if let Some(record) = input::stdin::read_stdin()? {
        Ok(record)
    } else {
        Err("--input <file.json|file.yaml> or stdin required for the investment record".into())
    }
}

pub fn load_holding(path: Option<&str>) -> Result<Option<HoldingPeriodConfig>, Box<dyn std::error::Error>> {
    path.map(input::file::read_input).transpose()
}
