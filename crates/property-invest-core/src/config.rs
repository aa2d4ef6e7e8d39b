//! Engine configuration: input defaults, advisory thresholds, input limits
//! and sale limits.
//!
//! Every field has a documented default so a caller can deserialize a partial
//! override file (`#[serde(default)]`) and get the standard engine behaviour
//! for everything it leaves out.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Percent;

/// Values used for every optional field the caller leaves unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentDefaults {
    pub loan_to_value: Percent,
    pub purchase_cost_rate: Percent,
    pub loan_insurance_rate: Percent,
    pub preferential_rate: Percent,
    pub preferential_months: u32,
    pub floating_rate: Percent,
    pub loan_term_years: u32,
    pub property_insurance_rate: Percent,
    pub occupancy_rate: Percent,
    pub maintenance_rate: Percent,
    pub capex_reserve_rate: Percent,
    pub rental_tax_rate: Percent,
    pub sale_cost_rate: Percent,
}

impl Default for InvestmentDefaults {
    fn default() -> Self {
        InvestmentDefaults {
            loan_to_value: dec!(70),
            purchase_cost_rate: dec!(2),
            loan_insurance_rate: dec!(1.5),
            preferential_rate: dec!(8),
            preferential_months: 12,
            floating_rate: dec!(12),
            loan_term_years: 20,
            property_insurance_rate: dec!(0.15),
            occupancy_rate: dec!(95),
            maintenance_rate: dec!(1),
            capex_reserve_rate: dec!(1),
            rental_tax_rate: dec!(10),
            sale_cost_rate: dec!(3),
        }
    }
}

/// Thresholds behind the non-fatal warnings and suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryThresholds {
    /// LTV above this is flagged as high leverage.
    pub max_loan_to_value: Percent,
    /// Gross rental yield below this is flagged.
    pub min_rental_yield: Percent,
    /// Management fee above this share of rent triggers a suggestion.
    pub max_management_fee_share: Percent,
    /// CapEx reserve rate below this triggers a suggestion.
    pub min_capex_reserve_rate: Percent,
    /// Annual rate used to discount the monthly cash-flow series for NPV.
    pub npv_discount_rate: Percent,
}

impl Default for AdvisoryThresholds {
    fn default() -> Self {
        AdvisoryThresholds {
            max_loan_to_value: dec!(80),
            min_rental_yield: dec!(4),
            max_management_fee_share: dec!(10),
            min_capex_reserve_rate: dec!(1),
            npv_discount_rate: dec!(10),
        }
    }
}

/// Bounds an investment record must respect to be valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLimits {
    /// Longest loan term accepted. Longer terms fail validation and the
    /// term-length cash-flow series is not built for them.
    pub max_loan_term_years: u32,
}

impl Default for InputLimits {
    fn default() -> Self {
        InputLimits {
            max_loan_term_years: 50,
        }
    }
}

/// Bounds for a holding-period configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleLimits {
    pub min_holding_months: u32,
    pub max_holding_months: u32,
    /// Holding periods shorter than this draw a transaction-cost warning.
    pub short_holding_months: u32,
    pub min_appreciation_rate: Percent,
    pub max_appreciation_rate: Percent,
    /// Appreciation above this is accepted but warned about.
    pub high_appreciation_rate: Percent,
    pub min_sale_cost_rate: Percent,
    pub max_sale_cost_rate: Percent,
}

impl Default for SaleLimits {
    fn default() -> Self {
        SaleLimits {
            min_holding_months: 12,
            max_holding_months: 360,
            short_holding_months: 24,
            min_appreciation_rate: dec!(-10),
            max_appreciation_rate: dec!(30),
            high_appreciation_rate: dec!(15),
            min_sale_cost_rate: dec!(0.5),
            max_sale_cost_rate: dec!(15),
        }
    }
}

/// Everything the engine reads besides the investment record itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub defaults: InvestmentDefaults,
    pub advisory: AdvisoryThresholds,
    pub input_limits: InputLimits,
    pub sale_limits: SaleLimits,
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON override document.
    pub fn from_json(json: &str) -> crate::PropertyInvestResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
