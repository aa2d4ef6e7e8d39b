//! Investment pipeline: normalise a record, derive the four cash-flow steps,
//! compute ROI / NPV / payback / yield / IRR, and flag risks.

pub mod advisories;
pub mod input;
pub mod pipeline;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::TwoStagePayment;
use crate::config::EngineConfig;
use crate::error::PropertyInvestError;
use crate::safe::{finite, MONTHS_PER_YEAR};
use crate::time_value::{
    cash_on_cash_return, irr, net_present_value, payback_period_years, rental_yield, IrrEstimate,
};
use crate::types::{ComputationMetadata, Money, Percent, Years};
use crate::PropertyInvestResult;

pub use advisories::{validate_investment_input, validate_investment_input_with};
pub use input::{InvestmentInput, NormalizedInput};
pub use pipeline::{
    run_pipeline, CalculationSteps, InitialCapital, MonthlyOperatingCost, PersonalCashFlow,
    PropertyCashFlow,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Metrics derived from the steps over a flat monthly series of the
/// current net property cash flow, one entry per month of the loan term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    /// Annualised cash-on-cash return on total initial capital, percent
    pub annual_roi: Percent,
    /// `None` when the series never recovers the initial capital
    pub payback_period_years: Option<Years>,
    pub npv: Money,
    /// Gross rental yield on the purchase price, percent
    pub rental_yield: Percent,
    /// `None` when the loan term is zero and there is no series
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr: Option<IrrEstimate>,
}

/// Output of one investment calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub inputs: NormalizedInput,
    pub steps: CalculationSteps,
    pub metrics: InvestmentMetrics,
    /// Two-stage loan detail; absent when the payment had to fall back to
    /// the single-rate calculation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan: Option<TwoStagePayment>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub validation_errors: Vec<String>,
    pub metadata: ComputationMetadata,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full calculation with the standard engine configuration.
///
/// Never fails: validation problems are logged and reported in
/// `validation_errors`, and every numeric field is a usable number.
pub fn calculate_investment(input: &InvestmentInput) -> CalculationResult {
    calculate_investment_with(input, &EngineConfig::default())
}

pub fn calculate_investment_with(input: &InvestmentInput, config: &EngineConfig) -> CalculationResult {
    calculate_normalized(&input.normalize_with(&config.defaults), config)
}

/// Like [`calculate_investment_with`], but a record with validation errors is
/// rejected with [`PropertyInvestError::Validation`].
pub fn calculate_investment_checked(
    input: &InvestmentInput,
    config: &EngineConfig,
) -> PropertyInvestResult<CalculationResult> {
    let result = calculate_investment_with(input, config);
    if result.validation_errors.is_empty() {
        Ok(result)
    } else {
        Err(PropertyInvestError::Validation(result.validation_errors))
    }
}

/// Calculation on an already-normalised record. The sale and scenario
/// engines enter here.
pub fn calculate_normalized(inputs: &NormalizedInput, config: &EngineConfig) -> CalculationResult {
    let start = Instant::now();

    let validation_errors = validate_investment_input_with(inputs, &config.input_limits);
    for error in &validation_errors {
        tracing::warn!(%error, "investment input failed validation");
    }

    let (steps, loan) = run_pipeline(inputs);
    let metrics = compute_metrics(inputs, &steps, config);
    let warnings = advisories::collect_warnings(inputs, &steps, &metrics, &config.advisory);
    let suggestions = advisories::collect_suggestions(inputs, &steps, &config.advisory);

    let elapsed = start.elapsed().as_micros() as u64;
    CalculationResult {
        inputs: inputs.clone(),
        steps,
        metrics,
        loan,
        warnings,
        suggestions,
        validation_errors,
        metadata: ComputationMetadata::new(elapsed),
    }
}

/// The flat series assumes the current payment holds for the whole term;
/// the later jump to the floating payment is not modelled here.
pub fn monthly_cash_flow_series(inputs: &NormalizedInput, steps: &CalculationSteps) -> Vec<Money> {
    vec![steps.property_cash_flow.net_cash_flow; inputs.loan_term_months() as usize]
}

fn compute_metrics(
    inputs: &NormalizedInput,
    steps: &CalculationSteps,
    config: &EngineConfig,
) -> InvestmentMetrics {
    let initial = steps.initial_capital.total_initial_capital;
    let net = steps.property_cash_flow.net_cash_flow;
    let series = if inputs.loan_term_years > config.input_limits.max_loan_term_years {
        tracing::debug!(
            loan_term_years = inputs.loan_term_years,
            "loan term above limit; series metrics skipped"
        );
        Vec::new()
    } else {
        monthly_cash_flow_series(inputs, steps)
    };

    let annual_cash_flow = finite(net.checked_mul(MONTHS_PER_YEAR));

    InvestmentMetrics {
        annual_roi: cash_on_cash_return(initial, annual_cash_flow),
        payback_period_years: payback_period_years(initial, &series),
        npv: net_present_value(initial, &series, config.advisory.npv_discount_rate),
        rental_yield: rental_yield(
            inputs.property_price,
            inputs.monthly_rent,
            inputs.occupancy_rate,
        ),
        irr: if series.is_empty() {
            None
        } else {
            Some(irr(initial, &series))
        },
    }
}

impl CalculationResult {
    pub fn net_property_cash_flow(&self) -> Money {
        self.steps.property_cash_flow.net_cash_flow
    }

    pub fn total_initial_capital(&self) -> Money {
        self.steps.initial_capital.total_initial_capital
    }

    pub fn is_cash_flow_positive(&self) -> bool {
        self.net_property_cash_flow() > Decimal::ZERO
    }
}
