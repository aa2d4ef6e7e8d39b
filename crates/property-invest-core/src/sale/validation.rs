use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::SaleLimits;
use crate::types::Percent;

/// How long the property is held and on what terms it is sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingPeriodConfig {
    pub holding_period_months: u32,
    /// Annual appreciation, percent
    pub appreciation_rate: Percent,
    /// Overrides the investment record's sale-cost rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_cost_rate: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_date: Option<NaiveDate>,
    /// Used to derive the sale date when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl HoldingPeriodConfig {
    pub fn new(holding_period_months: u32, appreciation_rate: Percent) -> Self {
        HoldingPeriodConfig {
            holding_period_months,
            appreciation_rate,
            sale_cost_rate: None,
            sale_date: None,
            purchase_date: None,
            enabled: true,
        }
    }

    pub fn with_holding_period(&self, months: u32) -> Self {
        HoldingPeriodConfig {
            holding_period_months: months,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a holding configuration against the sale limits. Out-of-range
/// holding periods and appreciation rates are errors; everything else that
/// looks risky is a warning.
pub fn validate_holding_config(config: &HoldingPeriodConfig, limits: &SaleLimits) -> ValidationReport {
    let mut report = ValidationReport::default();
    let months = config.holding_period_months;

    if months < limits.min_holding_months || months > limits.max_holding_months {
        report.errors.push(format!(
            "Holding period must be between {} and {} months (got {months})",
            limits.min_holding_months, limits.max_holding_months
        ));
    } else if months < limits.short_holding_months {
        report.warnings.push(format!(
            "Holding period of {months} months is short; transaction costs and tax weigh heavily on an early sale"
        ));
    }

    let appreciation = config.appreciation_rate;
    if appreciation < limits.min_appreciation_rate || appreciation > limits.max_appreciation_rate {
        report.errors.push(format!(
            "Appreciation rate must be between {}% and {}% a year (got {appreciation}%)",
            limits.min_appreciation_rate, limits.max_appreciation_rate
        ));
    } else if appreciation > limits.high_appreciation_rate {
        report.warnings.push(format!(
            "Appreciation of {appreciation}% a year is optimistic (above {}%)",
            limits.high_appreciation_rate
        ));
    }

    if let Some(rate) = config.sale_cost_rate {
        if rate < limits.min_sale_cost_rate || rate > limits.max_sale_cost_rate {
            report.warnings.push(format!(
                "Sale cost rate of {rate}% is outside the usual {}%-{}% range",
                limits.min_sale_cost_rate, limits.max_sale_cost_rate
            ));
        }
    }

    if let (Some(purchase), Some(sale)) = (config.purchase_date, config.sale_date) {
        if sale <= purchase {
            report
                .errors
                .push(format!("Sale date {sale} must be after purchase date {purchase}"));
        }
    }

    report
}
