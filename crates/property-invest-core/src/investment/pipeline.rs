//! The four-step cash-flow derivation: initial capital, monthly operating
//! cost, property net cash flow, personal net cash flow.
//!
//! Each step closes every field through [`finite`], so a record built here
//! never carries the result of a failed division or an overflow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::NormalizedInput;
use crate::amortization::{monthly_payment, TwoStagePayment};
use crate::safe::{finite, percent_of, MONTHS_PER_YEAR};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Step records
// ---------------------------------------------------------------------------

/// Step 1: cash needed to close the purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialCapital {
    pub loan_amount: Money,
    pub equity_used: Money,
    pub setup_cost: Money,
    pub purchase_cost: Money,
    pub loan_insurance_cost: Money,
    pub total_initial_capital: Money,
}

/// Step 2: recurring monthly costs of owning the property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyOperatingCost {
    /// Preferential-period payment, reported as the monthly bank payment
    pub bank_payment: Money,
    pub management_fee: Money,
    pub maintenance: Money,
    pub capex_reserve: Money,
    pub property_insurance: Money,
    pub total_operating_cost: Money,
}

/// Step 3: what the property itself earns each month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCashFlow {
    pub effective_rental_income: Money,
    pub rental_tax: Money,
    pub net_cash_flow: Money,
}

/// Step 4: the owner's monthly position including the property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalCashFlow {
    pub other_income: Money,
    pub living_expenses: Money,
    pub net_property_cash_flow: Money,
    pub final_cash_flow: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSteps {
    pub initial_capital: InitialCapital,
    pub operating_cost: MonthlyOperatingCost,
    pub property_cash_flow: PropertyCashFlow,
    pub personal_cash_flow: PersonalCashFlow,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run all four steps. The two-stage loan detail is returned alongside when
/// it could be computed.
pub fn run_pipeline(inputs: &NormalizedInput) -> (CalculationSteps, Option<TwoStagePayment>) {
    let initial_capital = initial_capital(inputs);
    let (bank_payment, loan) = monthly_bank_payment(inputs);
    let operating_cost = operating_cost(inputs, bank_payment);
    let property_cash_flow = property_cash_flow(inputs, &operating_cost);
    let personal_cash_flow = personal_cash_flow(inputs, &property_cash_flow);

    (
        CalculationSteps {
            initial_capital,
            operating_cost,
            property_cash_flow,
            personal_cash_flow,
        },
        loan,
    )
}

fn initial_capital(inputs: &NormalizedInput) -> InitialCapital {
    let price = inputs.property_price;
    let loan_amount = inputs.loan_amount();
    let equity_used = finite(price.checked_sub(loan_amount)).max(Decimal::ZERO);
    let purchase_cost = finite(percent_of(price, inputs.purchase_cost_rate));
    let loan_insurance_cost = finite(percent_of(loan_amount, inputs.loan_insurance_rate));

    let total_initial_capital = finite(
        equity_used
            .checked_add(inputs.setup_cost)
            .and_then(|v| v.checked_add(purchase_cost))
            .and_then(|v| v.checked_add(loan_insurance_cost)),
    );

    InitialCapital {
        loan_amount,
        equity_used,
        setup_cost: inputs.setup_cost,
        purchase_cost,
        loan_insurance_cost,
        total_initial_capital,
    }
}

/// The payment reported for the current month is the preferential one (the
/// floating payment when there is no preferential period). If the two-stage
/// computation fails, the loan is priced at the preferential rate over the
/// full term instead.
fn monthly_bank_payment(inputs: &NormalizedInput) -> (Money, Option<TwoStagePayment>) {
    let terms = inputs.loan_terms();

    match terms.payments() {
        Ok(payments) => {
            let current = if terms.preferential_months == 0 {
                payments.float_payment
            } else {
                payments.promo_payment
            };
            (current, Some(payments))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "two-stage payment failed; falling back to single-rate full-term payment"
            );
            let fallback =
                monthly_payment(terms.preferential_rate, terms.total_months, terms.principal)
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "single-rate payment failed; reporting zero");
                        Decimal::ZERO
                    });
            (fallback, None)
        }
    }
}

fn monthly_share_of_price(inputs: &NormalizedInput, annual_rate: Decimal) -> Money {
    finite(percent_of(inputs.property_price, annual_rate).and_then(|v| v.checked_div(MONTHS_PER_YEAR)))
}

fn operating_cost(inputs: &NormalizedInput, bank_payment: Money) -> MonthlyOperatingCost {
    let maintenance = monthly_share_of_price(inputs, inputs.maintenance_rate);
    let capex_reserve = monthly_share_of_price(inputs, inputs.capex_reserve_rate);
    let property_insurance = monthly_share_of_price(inputs, inputs.property_insurance_rate);

    let total_operating_cost = finite(
        bank_payment
            .checked_add(inputs.management_fee)
            .and_then(|v| v.checked_add(maintenance))
            .and_then(|v| v.checked_add(capex_reserve))
            .and_then(|v| v.checked_add(property_insurance)),
    );

    MonthlyOperatingCost {
        bank_payment,
        management_fee: inputs.management_fee,
        maintenance,
        capex_reserve,
        property_insurance,
        total_operating_cost,
    }
}

fn property_cash_flow(inputs: &NormalizedInput, costs: &MonthlyOperatingCost) -> PropertyCashFlow {
    let effective_rental_income = finite(percent_of(inputs.monthly_rent, inputs.occupancy_rate));
    let rental_tax = finite(percent_of(effective_rental_income, inputs.rental_tax_rate));
    let net_cash_flow = finite(
        effective_rental_income
            .checked_sub(costs.total_operating_cost)
            .and_then(|v| v.checked_sub(rental_tax)),
    );

    PropertyCashFlow {
        effective_rental_income,
        rental_tax,
        net_cash_flow,
    }
}

fn personal_cash_flow(inputs: &NormalizedInput, property: &PropertyCashFlow) -> PersonalCashFlow {
    let final_cash_flow = finite(
        inputs
            .other_income
            .checked_sub(inputs.living_expenses)
            .and_then(|v| v.checked_add(property.net_cash_flow)),
    );

    PersonalCashFlow {
        other_income: inputs.other_income,
        living_expenses: inputs.living_expenses,
        net_property_cash_flow: property.net_cash_flow,
        final_cash_flow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investment::input::InvestmentInput;
    use rust_decimal_macros::dec;

    fn sample_input() -> NormalizedInput {
        InvestmentInput::new(dec!(1000000))
            .loan_to_value(dec!(60))
            .setup_cost(dec!(20000))
            .purchase_cost_rate(dec!(2))
            .loan_insurance_rate(dec!(1))
            .preferential_rate(dec!(6))
            .preferential_months(24)
            .floating_rate(dec!(9))
            .loan_term_years(25)
            .monthly_rent(dec!(6000))
            .management_fee(dec!(300))
            .property_insurance_rate(dec!(0.12))
            .occupancy_rate(dec!(90))
            .maintenance_rate(dec!(1.2))
            .capex_reserve_rate(dec!(0.6))
            .rental_tax_rate(dec!(10))
            .other_income(dec!(5000))
            .living_expenses(dec!(3500))
            .normalize()
    }

    #[test]
    fn test_step1_initial_capital() {
        let (steps, _) = run_pipeline(&sample_input());
        let ic = &steps.initial_capital;
        assert_eq!(ic.loan_amount, dec!(600000));
        assert_eq!(ic.equity_used, dec!(400000));
        assert_eq!(ic.purchase_cost, dec!(20000));
        assert_eq!(ic.loan_insurance_cost, dec!(6000));
        // 400,000 + 20,000 + 20,000 + 6,000
        assert_eq!(ic.total_initial_capital, dec!(446000));
    }

    #[test]
    fn test_step2_operating_cost() {
        let inputs = sample_input();
        let (steps, loan) = run_pipeline(&inputs);
        let oc = &steps.operating_cost;

        let expected_payment = monthly_payment(dec!(6), 300, dec!(600000)).unwrap();
        assert_eq!(oc.bank_payment, expected_payment);
        assert_eq!(loan.unwrap().promo_payment, expected_payment);

        assert_eq!(oc.maintenance, dec!(1000));
        assert_eq!(oc.capex_reserve, dec!(500));
        assert_eq!(oc.property_insurance, dec!(100));
        assert_eq!(
            oc.total_operating_cost,
            expected_payment + dec!(300) + dec!(1000) + dec!(500) + dec!(100)
        );
    }

    #[test]
    fn test_step3_and_step4_cash_flow() {
        let (steps, _) = run_pipeline(&sample_input());
        let pcf = &steps.property_cash_flow;
        assert_eq!(pcf.effective_rental_income, dec!(5400));
        assert_eq!(pcf.rental_tax, dec!(540));
        assert_eq!(
            pcf.net_cash_flow,
            dec!(5400) - steps.operating_cost.total_operating_cost - dec!(540)
        );

        let personal = &steps.personal_cash_flow;
        assert_eq!(personal.final_cash_flow, dec!(1500) + pcf.net_cash_flow);
    }

    #[test]
    fn test_no_preferential_period_reports_floating_payment() {
        let mut inputs = sample_input();
        inputs.preferential_months = 0;
        let (steps, _) = run_pipeline(&inputs);
        let expected = monthly_payment(dec!(9), 300, dec!(600000)).unwrap();
        assert_eq!(steps.operating_cost.bank_payment, expected);
    }

    #[test]
    fn test_fallback_when_preferential_period_exceeds_term() {
        let mut inputs = sample_input();
        inputs.preferential_months = 400;
        let (steps, loan) = run_pipeline(&inputs);
        assert!(loan.is_none());
        let expected = monthly_payment(dec!(6), 300, dec!(600000)).unwrap();
        assert_eq!(steps.operating_cost.bank_payment, expected);
    }

    #[test]
    fn test_zero_term_reports_zero_payment() {
        let mut inputs = sample_input();
        inputs.loan_term_years = 0;
        let (steps, loan) = run_pipeline(&inputs);
        assert!(loan.is_none());
        assert_eq!(steps.operating_cost.bank_payment, Decimal::ZERO);
    }
}
