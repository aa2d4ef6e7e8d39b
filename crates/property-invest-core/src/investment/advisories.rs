use rust_decimal::Decimal;

use super::input::NormalizedInput;
use super::pipeline::CalculationSteps;
use super::InvestmentMetrics;
use crate::config::{AdvisoryThresholds, InputLimits};
use crate::safe::{finite, HUNDRED};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_investment_input(inputs: &NormalizedInput) -> Vec<String> {
    validate_investment_input_with(inputs, &InputLimits::default())
}

/// Structural problems with an investment record. The pipeline still runs on
/// such a record; callers decide whether to reject it.
pub fn validate_investment_input_with(inputs: &NormalizedInput, limits: &InputLimits) -> Vec<String> {
    let mut errors = Vec::new();

    if inputs.property_price <= Decimal::ZERO {
        errors.push(format!(
            "Property price must be positive (got {})",
            inputs.property_price
        ));
    }
    if inputs.other_income < Decimal::ZERO {
        errors.push("Other income cannot be negative".to_string());
    }
    if inputs.living_expenses < Decimal::ZERO {
        errors.push("Living expenses cannot be negative".to_string());
    }
    if inputs.loan_term_years == 0 {
        errors.push("Loan term must be at least one year".to_string());
    }
    if inputs.occupancy_rate < Decimal::ZERO || inputs.occupancy_rate > HUNDRED {
        errors.push(format!(
            "Occupancy rate must be between 0% and 100% (got {}%)",
            inputs.occupancy_rate
        ));
    }
    if inputs.preferential_months > inputs.loan_term_months() {
        errors.push(format!(
            "Preferential period ({} months) exceeds loan term ({} months)",
            inputs.preferential_months,
            inputs.loan_term_months()
        ));
    }
    if inputs.loan_to_value < Decimal::ZERO || inputs.loan_to_value > HUNDRED {
        errors.push(format!(
            "Loan-to-value must be between 0% and 100% (got {}%)",
            inputs.loan_to_value
        ));
    }
    if inputs.loan_term_years > limits.max_loan_term_years {
        errors.push(format!(
            "Loan term of {} years exceeds the {}-year maximum",
            inputs.loan_term_years, limits.max_loan_term_years
        ));
    }

    errors
}

// ---------------------------------------------------------------------------
// Warnings and suggestions
// ---------------------------------------------------------------------------

pub fn collect_warnings(
    inputs: &NormalizedInput,
    steps: &CalculationSteps,
    metrics: &InvestmentMetrics,
    thresholds: &AdvisoryThresholds,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if inputs.loan_to_value > thresholds.max_loan_to_value {
        warnings.push(format!(
            "High LTV: loan-to-value of {:.1}% exceeds {}%; elevated leverage risk",
            inputs.loan_to_value, thresholds.max_loan_to_value
        ));
    }

    let net = steps.property_cash_flow.net_cash_flow;
    if net < Decimal::ZERO {
        warnings.push(format!(
            "Negative cash flow: the property loses {:.0} per month after financing, operating costs and tax",
            net.abs()
        ));
    }

    if metrics.rental_yield < thresholds.min_rental_yield {
        warnings.push(format!(
            "Low rental yield: {:.2}% is below {}%",
            metrics.rental_yield, thresholds.min_rental_yield
        ));
    }

    if inputs.floating_rate < inputs.preferential_rate {
        warnings.push(format!(
            "Floating rate {}% is below the preferential rate {}%; check the loan terms",
            inputs.floating_rate, inputs.preferential_rate
        ));
    }

    warnings
}

pub fn collect_suggestions(
    inputs: &NormalizedInput,
    steps: &CalculationSteps,
    thresholds: &AdvisoryThresholds,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if steps.property_cash_flow.net_cash_flow < Decimal::ZERO {
        suggestions.push(
            "Raise the rent or cut operating costs to bring monthly cash flow above zero".to_string(),
        );
    }

    if inputs.management_fee > Decimal::ZERO {
        if inputs.monthly_rent <= Decimal::ZERO {
            suggestions.push(format!(
                "Management fee of {} is charged on no rent; consider renegotiating it",
                inputs.management_fee
            ));
        } else {
            let fee_share = finite(
                inputs
                    .management_fee
                    .checked_mul(HUNDRED)
                    .and_then(|v| v.checked_div(inputs.monthly_rent)),
            );
            if fee_share > thresholds.max_management_fee_share {
                suggestions.push(format!(
                    "Management fee is {:.1}% of rent (above {}%); consider renegotiating it",
                    fee_share, thresholds.max_management_fee_share
                ));
            }
        }
    }

    if inputs.capex_reserve_rate < thresholds.min_capex_reserve_rate {
        suggestions.push(format!(
            "CapEx reserve of {}% a year is below {}%; consider setting aside more for capital repairs",
            inputs.capex_reserve_rate, thresholds.min_capex_reserve_rate
        ));
    }

    suggestions
}
