//! Hold-then-sell analysis: appreciation projection, loan run-down, sale
//! proceeds and holding-period comparison.

pub mod analysis;
pub mod comparison;
pub mod projection;
pub mod validation;

pub use analysis::{
    analyze_investment, analyze_investment_with, calculate_sale_analysis,
    calculate_sale_analysis_with, InvestmentReport, OptimalSaleYear, SaleAnalysisResult,
};
pub use comparison::{
    compare_sale_scenarios, compare_sale_scenarios_with, SaleScenarioComparison,
    SaleScenarioSummary,
};
pub use projection::{
    accumulated_cash_flows, project_property_value, remaining_balance_at_month,
    AccumulatedCashFlows, YearlyBreakdown,
};
pub use validation::{validate_holding_config, HoldingPeriodConfig, ValidationReport};
