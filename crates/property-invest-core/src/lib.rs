pub mod amortization;
pub mod config;
pub mod error;
pub mod investment;
pub mod safe;
pub mod time_value;
pub mod types;

#[cfg(feature = "sale")]
pub mod sale;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use config::EngineConfig;
pub use error::PropertyInvestError;
pub use investment::{calculate_investment, CalculationResult, InvestmentInput};
pub use types::*;

/// Standard result type for all property-invest operations
pub type PropertyInvestResult<T> = Result<T, PropertyInvestError>;
