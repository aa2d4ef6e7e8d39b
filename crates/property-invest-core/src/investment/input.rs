use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::LoanTerms;
use crate::config::InvestmentDefaults;
use crate::safe::{finite, percent_of, HUNDRED};
use crate::types::{Money, Percent};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Investment record as supplied by a caller. Only the property price is
/// required; every other field falls back to [`InvestmentDefaults`] (rates)
/// or zero (amounts) during normalisation.
///
/// All rates are percentages: `dec!(95)` occupancy means 95%.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentInput {
    /// Purchase price of the property
    pub property_price: Money,
    /// Cash equity put into the purchase; derives the LTV when no explicit
    /// LTV is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<Money>,
    /// One-time setup cost (renovation, furnishing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_cost: Option<Money>,
    /// Loan-to-value ratio, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_to_value: Option<Percent>,
    /// Transfer and notary costs as a percentage of price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_cost_rate: Option<Percent>,
    /// One-off loan insurance as a percentage of the loan amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_insurance_rate: Option<Percent>,
    /// Annual preferential interest rate, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferential_rate: Option<Percent>,
    /// Length of the preferential period in months
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferential_months: Option<u32>,
    /// Annual floating interest rate after the preferential period, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floating_rate: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_term_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_fee: Option<Money>,
    /// Annual property insurance as a percentage of price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_insurance_rate: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy_rate: Option<Percent>,
    /// Annual maintenance as a percentage of price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_rate: Option<Percent>,
    /// Annual capital-expenditure reserve as a percentage of price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex_reserve_rate: Option<Percent>,
    /// Tax on effective rental income, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_tax_rate: Option<Percent>,
    /// Transaction costs at sale as a percentage of the sale price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_cost_rate: Option<Percent>,
    /// Owner's other monthly income
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_income: Option<Money>,
    /// Owner's monthly living expenses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living_expenses: Option<Money>,
}

/// Fully populated investment record. Only produced by
/// [`InvestmentInput::normalize_with`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInput {
    pub property_price: Money,
    pub equity: Money,
    pub setup_cost: Money,
    pub loan_to_value: Percent,
    pub purchase_cost_rate: Percent,
    pub loan_insurance_rate: Percent,
    pub preferential_rate: Percent,
    pub preferential_months: u32,
    pub floating_rate: Percent,
    pub loan_term_years: u32,
    pub monthly_rent: Money,
    pub management_fee: Money,
    pub property_insurance_rate: Percent,
    pub occupancy_rate: Percent,
    pub maintenance_rate: Percent,
    pub capex_reserve_rate: Percent,
    pub rental_tax_rate: Percent,
    pub sale_cost_rate: Percent,
    pub other_income: Money,
    pub living_expenses: Money,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

macro_rules! optional_setters {
    ($($field:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $field(mut self, value: $ty) -> Self {
                self.$field = Some(value);
                self
            }
        )*
    };
}

impl InvestmentInput {
    pub fn new(property_price: Money) -> Self {
        InvestmentInput {
            property_price,
            ..Default::default()
        }
    }

    optional_setters! {
        equity: Money,
        setup_cost: Money,
        loan_to_value: Percent,
        purchase_cost_rate: Percent,
        loan_insurance_rate: Percent,
        preferential_rate: Percent,
        preferential_months: u32,
        floating_rate: Percent,
        loan_term_years: u32,
        monthly_rent: Money,
        management_fee: Money,
        property_insurance_rate: Percent,
        occupancy_rate: Percent,
        maintenance_rate: Percent,
        capex_reserve_rate: Percent,
        rental_tax_rate: Percent,
        sale_cost_rate: Percent,
        other_income: Money,
        living_expenses: Money,
    }
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

impl InvestmentInput {
    pub fn normalize(&self) -> NormalizedInput {
        self.normalize_with(&InvestmentDefaults::default())
    }

    /// Fill every unset field. Rates come from `defaults`; money amounts
    /// default to zero.
    pub fn normalize_with(&self, defaults: &InvestmentDefaults) -> NormalizedInput {
        let price = self.property_price;
        let loan_to_value = self.resolve_loan_to_value(defaults);
        let equity = self.equity.unwrap_or_else(|| {
            finite(
                HUNDRED
                    .checked_sub(loan_to_value.clamp(Decimal::ZERO, HUNDRED))
                    .and_then(|own_share| percent_of(price, own_share)),
            )
        });

        NormalizedInput {
            property_price: price,
            equity,
            setup_cost: self.setup_cost.unwrap_or(Decimal::ZERO),
            loan_to_value,
            purchase_cost_rate: self.purchase_cost_rate.unwrap_or(defaults.purchase_cost_rate),
            loan_insurance_rate: self.loan_insurance_rate.unwrap_or(defaults.loan_insurance_rate),
            preferential_rate: self.preferential_rate.unwrap_or(defaults.preferential_rate),
            preferential_months: self.preferential_months.unwrap_or(defaults.preferential_months),
            floating_rate: self.floating_rate.unwrap_or(defaults.floating_rate),
            loan_term_years: self.loan_term_years.unwrap_or(defaults.loan_term_years),
            monthly_rent: self.monthly_rent.unwrap_or(Decimal::ZERO),
            management_fee: self.management_fee.unwrap_or(Decimal::ZERO),
            property_insurance_rate: self
                .property_insurance_rate
                .unwrap_or(defaults.property_insurance_rate),
            occupancy_rate: self.occupancy_rate.unwrap_or(defaults.occupancy_rate),
            maintenance_rate: self.maintenance_rate.unwrap_or(defaults.maintenance_rate),
            capex_reserve_rate: self.capex_reserve_rate.unwrap_or(defaults.capex_reserve_rate),
            rental_tax_rate: self.rental_tax_rate.unwrap_or(defaults.rental_tax_rate),
            sale_cost_rate: self.sale_cost_rate.unwrap_or(defaults.sale_cost_rate),
            other_income: self.other_income.unwrap_or(Decimal::ZERO),
            living_expenses: self.living_expenses.unwrap_or(Decimal::ZERO),
        }
    }

    /// Explicit LTV wins; otherwise equity derives it; otherwise the default.
    fn resolve_loan_to_value(&self, defaults: &InvestmentDefaults) -> Percent {
        if let Some(ltv) = self.loan_to_value {
            return ltv;
        }
        match self.equity {
            Some(equity) if self.property_price > Decimal::ZERO => {
                finite(
                    self.property_price
                        .checked_sub(equity)
                        .and_then(|financed| financed.checked_mul(HUNDRED))
                        .and_then(|v| v.checked_div(self.property_price)),
                )
                .clamp(Decimal::ZERO, HUNDRED)
            }
            _ => defaults.loan_to_value,
        }
    }
}

impl NormalizedInput {
    /// LTV is kept as entered (so validation can report it) but financed
    /// within [0, 100]; the loan is never negative.
    pub fn loan_amount(&self) -> Money {
        let ltv = self.loan_to_value.clamp(Decimal::ZERO, HUNDRED);
        finite(percent_of(self.property_price, ltv)).max(Decimal::ZERO)
    }

    pub fn loan_term_months(&self) -> u32 {
        self.loan_term_years.saturating_mul(12)
    }

    pub fn loan_terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.loan_amount(),
            preferential_rate: self.preferential_rate,
            preferential_months: self.preferential_months,
            floating_rate: self.floating_rate,
            total_months: self.loan_term_months(),
        }
    }
}
