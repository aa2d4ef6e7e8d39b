use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::PropertyInvestError;
use crate::investment::{calculate_normalized, CalculationResult, InvestmentInput, NormalizedInput};
use crate::types::*;
use crate::PropertyInvestResult;

/// Investment field a sensitivity variable sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityField {
    MonthlyRent,
    PropertyPrice,
    PreferentialRate,
    FloatingRate,
    OccupancyRate,
    LoanToValue,
    ManagementFee,
}

/// Output read from each grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetric {
    NetCashFlow,
    PersonalCashFlow,
    AnnualRoi,
    Npv,
    RentalYield,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub field: SensitivityField,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Input for 2-way sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    /// First variable to sweep (grid rows)
    pub variable_1: SensitivityVariable,
    /// Second variable to sweep (grid columns)
    pub variable_2: SensitivityVariable,
    pub metric: SensitivityMetric,
}

/// Output of 2-way sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1: SensitivityField,
    pub variable_2: SensitivityField,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub metric: SensitivityMetric,
    /// Matrix[i][j] = metric when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j]
    pub matrix: Vec<Vec<Decimal>>,
    /// Metric for the unmodified record
    pub base_case_value: Decimal,
    /// Cell closest to the unmodified record's values (row, col)
    pub base_case_position: (usize, usize),
}

// ---------------------------------------------------------------------------
// Fields and metrics
// ---------------------------------------------------------------------------

impl SensitivityField {
    pub fn read(self, inputs: &NormalizedInput) -> Decimal {
        match self {
            SensitivityField::MonthlyRent => inputs.monthly_rent,
            SensitivityField::PropertyPrice => inputs.property_price,
            SensitivityField::PreferentialRate => inputs.preferential_rate,
            SensitivityField::FloatingRate => inputs.floating_rate,
            SensitivityField::OccupancyRate => inputs.occupancy_rate,
            SensitivityField::LoanToValue => inputs.loan_to_value,
            SensitivityField::ManagementFee => inputs.management_fee,
        }
    }

    pub fn write(self, inputs: &mut NormalizedInput, value: Decimal) {
        match self {
            SensitivityField::MonthlyRent => inputs.monthly_rent = value,
            SensitivityField::PropertyPrice => inputs.property_price = value,
            SensitivityField::PreferentialRate => inputs.preferential_rate = value,
            SensitivityField::FloatingRate => inputs.floating_rate = value,
            SensitivityField::OccupancyRate => inputs.occupancy_rate = value,
            SensitivityField::LoanToValue => inputs.loan_to_value = value,
            SensitivityField::ManagementFee => inputs.management_fee = value,
        }
    }

    fn name(self) -> &'static str {
        match self {
            SensitivityField::MonthlyRent => "monthly_rent",
            SensitivityField::PropertyPrice => "property_price",
            SensitivityField::PreferentialRate => "preferential_rate",
            SensitivityField::FloatingRate => "floating_rate",
            SensitivityField::OccupancyRate => "occupancy_rate",
            SensitivityField::LoanToValue => "loan_to_value",
            SensitivityField::ManagementFee => "management_fee",
        }
    }
}

impl fmt::Display for SensitivityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensitivityField {
    type Err = PropertyInvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly_rent" | "rent" => Ok(SensitivityField::MonthlyRent),
            "property_price" | "price" => Ok(SensitivityField::PropertyPrice),
            "preferential_rate" | "promo_rate" => Ok(SensitivityField::PreferentialRate),
            "floating_rate" | "float_rate" => Ok(SensitivityField::FloatingRate),
            "occupancy_rate" | "occupancy" => Ok(SensitivityField::OccupancyRate),
            "loan_to_value" | "ltv" => Ok(SensitivityField::LoanToValue),
            "management_fee" => Ok(SensitivityField::ManagementFee),
            other => Err(PropertyInvestError::InvalidInput {
                field: "sensitivity field".into(),
                reason: format!("Unknown field '{other}'"),
            }),
        }
    }
}

impl SensitivityMetric {
    pub fn read(self, result: &CalculationResult) -> Decimal {
        match self {
            SensitivityMetric::NetCashFlow => result.net_property_cash_flow(),
            SensitivityMetric::PersonalCashFlow => result.steps.personal_cash_flow.final_cash_flow,
            SensitivityMetric::AnnualRoi => result.metrics.annual_roi,
            SensitivityMetric::Npv => result.metrics.npv,
            SensitivityMetric::RentalYield => result.metrics.rental_yield,
        }
    }
}

impl fmt::Display for SensitivityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensitivityMetric::NetCashFlow => "net_cash_flow",
            SensitivityMetric::PersonalCashFlow => "personal_cash_flow",
            SensitivityMetric::AnnualRoi => "annual_roi",
            SensitivityMetric::Npv => "npv",
            SensitivityMetric::RentalYield => "rental_yield",
        };
        f.write_str(name)
    }
}

impl FromStr for SensitivityMetric {
    type Err = PropertyInvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "net_cash_flow" | "cash_flow" => Ok(SensitivityMetric::NetCashFlow),
            "personal_cash_flow" => Ok(SensitivityMetric::PersonalCashFlow),
            "annual_roi" | "roi" => Ok(SensitivityMetric::AnnualRoi),
            "npv" => Ok(SensitivityMetric::Npv),
            "rental_yield" | "yield" => Ok(SensitivityMetric::RentalYield),
            other => Err(PropertyInvestError::InvalidInput {
                field: "sensitivity metric".into(),
                reason: format!("Unknown metric '{other}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> PropertyInvestResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(PropertyInvestError::InvalidInput {
            field: format!("variable:{}", var.field),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(PropertyInvestError::InvalidInput {
            field: format!("variable:{}", var.field),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        match current.checked_add(var.step) {
            Some(next) => current = next,
            None => break,
        }
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub fn evaluate_sensitivity(
    input: &InvestmentInput,
    sensitivity: &SensitivityInput,
) -> PropertyInvestResult<ComputationOutput<SensitivityOutput>> {
    evaluate_sensitivity_with(input, sensitivity, &EngineConfig::default())
}

/// Sweep two fields of the normalised record over their ranges and read the
/// chosen metric from every cell.
pub fn evaluate_sensitivity_with(
    input: &InvestmentInput,
    sensitivity: &SensitivityInput,
    engine: &EngineConfig,
) -> PropertyInvestResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (f1, f2) = (sensitivity.variable_1.field, sensitivity.variable_2.field);
    if f1 == f2 {
        return Err(PropertyInvestError::InvalidInput {
            field: "variable_2".into(),
            reason: format!("Both variables sweep {f1}"),
        });
    }

    let v1_values = generate_sweep_values(&sensitivity.variable_1)?;
    let v2_values = generate_sweep_values(&sensitivity.variable_2)?;

    let base_inputs = input.normalize_with(&engine.defaults);
    let metric = sensitivity.metric;

    let mut matrix = Vec::with_capacity(v1_values.len());
    for v1 in &v1_values {
        let mut row = Vec::with_capacity(v2_values.len());
        for v2 in &v2_values {
            let mut cell = base_inputs.clone();
            f1.write(&mut cell, *v1);
            f2.write(&mut cell, *v2);

            let result = calculate_normalized(&cell, engine);
            if !result.validation_errors.is_empty() {
                warnings.push(format!(
                    "Invalid record at ({f1} = {v1}, {f2} = {v2}): {}",
                    result.validation_errors.join("; ")
                ));
            }
            row.push(metric.read(&result));
        }
        matrix.push(row);
    }

    let base_case_value = metric.read(&calculate_normalized(&base_inputs, engine));
    let base_row = closest_index(&v1_values, f1.read(&base_inputs));
    let base_col = closest_index(&v2_values, f2.read(&base_inputs));

    let output = SensitivityOutput {
        variable_1: f1,
        variable_2: f2,
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        metric,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Sensitivity Analysis",
        &serde_json::json!({
            "variable_1": f1.to_string(),
            "variable_2": f2.to_string(),
            "metric": metric.to_string(),
            "grid_cells": output.matrix.len() * output.variable_2_values.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> InvestmentInput {
        InvestmentInput::new(dec!(1000000))
            .loan_to_value(dec!(60))
            .monthly_rent(dec!(8000))
    }

    fn rent_vs_rate() -> SensitivityInput {
        SensitivityInput {
            variable_1: SensitivityVariable {
                field: SensitivityField::MonthlyRent,
                min: dec!(6000),
                max: dec!(10000),
                step: dec!(1000),
            },
            variable_2: SensitivityVariable {
                field: SensitivityField::PreferentialRate,
                min: dec!(4),
                max: dec!(10),
                step: dec!(2),
            },
            metric: SensitivityMetric::NetCashFlow,
        }
    }

    #[test]
    fn test_grid_dimensions() {
        let out = evaluate_sensitivity(&sample_input(), &rent_vs_rate()).unwrap();
        let r = &out.result;
        assert_eq!(r.variable_1_values.len(), 5);
        assert_eq!(r.variable_2_values.len(), 4);
        assert_eq!(r.matrix.len(), 5);
        assert!(r.matrix.iter().all(|row| row.len() == 4));
    }

    #[test]
    fn test_monotonic_in_both_directions() {
        let out = evaluate_sensitivity(&sample_input(), &rent_vs_rate()).unwrap();
        let m = &out.result.matrix;
        // Higher rent => more cash flow
        for i in 0..m.len() - 1 {
            assert!(m[i][0] < m[i + 1][0]);
        }
        // Higher rate => bigger payment => less cash flow
        for j in 0..m[0].len() - 1 {
            assert!(m[0][j] > m[0][j + 1]);
        }
    }

    #[test]
    fn test_base_case_matches_unmodified_record() {
        let out = evaluate_sensitivity(&sample_input(), &rent_vs_rate()).unwrap();
        let r = &out.result;
        // Rent 8,000 is row 2; default preferential rate 8% is column 2
        assert_eq!(r.base_case_position, (2, 2));
        assert_eq!(r.matrix[2][2], r.base_case_value);
    }

    #[test]
    fn test_same_field_twice_rejected() {
        let mut input = rent_vs_rate();
        input.variable_2.field = SensitivityField::MonthlyRent;
        assert!(evaluate_sensitivity(&sample_input(), &input).is_err());
    }

    #[test]
    fn test_invalid_step() {
        let mut input = rent_vs_rate();
        input.variable_1.step = Decimal::ZERO;
        assert!(evaluate_sensitivity(&sample_input(), &input).is_err());
    }

    #[test]
    fn test_sweep_with_non_exact_step() {
        let var = SensitivityVariable {
            field: SensitivityField::OccupancyRate,
            min: dec!(0),
            max: dec!(1),
            step: dec!(0.3),
        };
        let vals = generate_sweep_values(&var).unwrap();
        // 0, 0.3, 0.6, 0.9, 1.0 (max appended)
        assert_eq!(vals.len(), 5);
        assert_eq!(*vals.last().unwrap(), dec!(1));
    }

    #[test]
    fn test_invalid_cells_warn() {
        let mut input = rent_vs_rate();
        input.variable_2 = SensitivityVariable {
            field: SensitivityField::OccupancyRate,
            min: dec!(90),
            max: dec!(110),
            step: dec!(10),
        };
        let out = evaluate_sensitivity(&sample_input(), &input).unwrap();
        // One column over 100% occupancy, five rows
        assert_eq!(out.warnings.len(), 5);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("ltv".parse::<SensitivityField>().unwrap(), SensitivityField::LoanToValue);
        assert_eq!("roi".parse::<SensitivityMetric>().unwrap(), SensitivityMetric::AnnualRoi);
        assert!("bogus".parse::<SensitivityField>().is_err());
    }
}
