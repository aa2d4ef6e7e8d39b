//! Mortgage amortization: annuity payment, closed-form remaining balance and
//! the two-stage (preferential then floating rate) loan used by the
//! investment pipeline.
//!
//! Rates are annual percentages (`dec!(8)` = 8%); periods are months.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PropertyInvestError;
use crate::safe::{compound, monthly_rate};
use crate::types::{Money, Percent};
use crate::PropertyInvestResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A loan with a preferential (promotional) rate for its first months and a
/// floating rate for the remainder of the term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Annual preferential rate, percent
    pub preferential_rate: Percent,
    /// Months at the preferential rate
    pub preferential_months: u32,
    /// Annual floating rate after the preferential period, percent
    pub floating_rate: Percent,
    /// Full loan term in months
    pub total_months: u32,
}

/// Payments of a two-stage loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoStagePayment {
    /// Monthly payment during the preferential period
    pub promo_payment: Money,
    /// Monthly payment once the floating rate applies
    pub float_payment: Money,
    /// Outstanding principal when the preferential period ends
    pub balance_at_promo_end: Money,
    /// Interest paid over the whole term
    pub total_interest: Money,
}

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    /// Annual rate applied this month, percent
    pub annual_rate: Percent,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

/// Month-by-month schedule with totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub rows: Vec<ScheduleRow>,
    pub total_paid: Money,
    pub total_interest: Money,
}

// ---------------------------------------------------------------------------
// Payment math
// ---------------------------------------------------------------------------

fn overflow(context: &str) -> PropertyInvestError {
    PropertyInvestError::NumericOverflow {
        context: context.into(),
    }
}

/// Standard fixed-rate annuity payment: P * r(1+r)^n / ((1+r)^n - 1).
///
/// A zero rate amortises in a straight line (`principal / total_months`).
pub fn monthly_payment(
    annual_rate: Percent,
    total_months: u32,
    principal: Money,
) -> PropertyInvestResult<Money> {
    if total_months == 0 {
        return Err(PropertyInvestError::InvalidInput {
            field: "total_months".into(),
            reason: "Loan term must be at least one month".into(),
        });
    }

    if annual_rate.is_zero() {
        return principal
            .checked_div(Decimal::from(total_months))
            .ok_or_else(|| overflow("straight-line payment"));
    }

    let r = monthly_rate(annual_rate).ok_or_else(|| overflow("monthly rate"))?;
    let growth = compound(r, total_months).ok_or_else(|| overflow("payment compounding"))?;
    let denominator = growth - Decimal::ONE;

    if denominator.is_zero() {
        return Err(PropertyInvestError::DivisionByZero {
            context: "annuity payment denominator".into(),
        });
    }

    principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(growth))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| overflow("annuity payment"))
}

/// Outstanding principal after `months_elapsed` payments of a fixed-rate loan.
///
/// Zero once the loan is fully amortised; never negative.
pub fn remaining_balance(
    principal: Money,
    annual_rate: Percent,
    total_months: u32,
    months_elapsed: u32,
) -> PropertyInvestResult<Money> {
    if months_elapsed >= total_months {
        return Ok(Decimal::ZERO);
    }

    if annual_rate.is_zero() {
        let paid_share = Decimal::from(months_elapsed) / Decimal::from(total_months);
        return principal
            .checked_mul(Decimal::ONE - paid_share)
            .map(|b| b.max(Decimal::ZERO))
            .ok_or_else(|| overflow("straight-line balance"));
    }

    let r = monthly_rate(annual_rate).ok_or_else(|| overflow("monthly rate"))?;
    let payment = monthly_payment(annual_rate, total_months, principal)?;
    let growth = compound(r, months_elapsed).ok_or_else(|| overflow("balance compounding"))?;

    // B_k = P(1+r)^k - PMT((1+r)^k - 1)/r
    let grown_principal = principal
        .checked_mul(growth)
        .ok_or_else(|| overflow("balance compounding"))?;
    let paid_down = payment
        .checked_mul(growth - Decimal::ONE)
        .and_then(|v| v.checked_div(r))
        .ok_or_else(|| overflow("balance paydown"))?;

    Ok((grown_principal - paid_down).max(Decimal::ZERO))
}

/// Payments of a preferential-then-floating loan.
///
/// The preferential payment amortises the principal over the *full* term at
/// the preferential rate; the balance left when that period ends is then
/// re-amortised over the remaining months at the floating rate.
pub fn two_stage_payment(
    principal: Money,
    promo_rate: Percent,
    promo_months: u32,
    float_rate: Percent,
    total_months: u32,
) -> PropertyInvestResult<TwoStagePayment> {
    if total_months == 0 {
        return Err(PropertyInvestError::InvalidInput {
            field: "total_months".into(),
            reason: "Loan term must be at least one month".into(),
        });
    }
    if promo_months > total_months {
        return Err(PropertyInvestError::InvalidInput {
            field: "promo_months".into(),
            reason: format!(
                "Preferential period ({promo_months} months) exceeds loan term ({total_months} months)"
            ),
        });
    }

    if promo_months == 0 {
        let float_payment = monthly_payment(float_rate, total_months, principal)?;
        let total_paid = float_payment
            .checked_mul(Decimal::from(total_months))
            .ok_or_else(|| overflow("total interest"))?;
        return Ok(TwoStagePayment {
            promo_payment: Decimal::ZERO,
            float_payment,
            balance_at_promo_end: principal,
            total_interest: total_paid - principal,
        });
    }

    let promo_payment = monthly_payment(promo_rate, total_months, principal)?;
    let balance_at_promo_end = remaining_balance(principal, promo_rate, total_months, promo_months)?;

    let float_months = total_months - promo_months;
    let float_payment = if float_months == 0 {
        Decimal::ZERO
    } else {
        monthly_payment(float_rate, float_months, balance_at_promo_end)?
    };

    let promo_paid = promo_payment
        .checked_mul(Decimal::from(promo_months))
        .ok_or_else(|| overflow("preferential interest"))?;
    let float_paid = float_payment
        .checked_mul(Decimal::from(float_months))
        .ok_or_else(|| overflow("floating interest"))?;

    let promo_interest = promo_paid - (principal - balance_at_promo_end);
    let float_interest = float_paid - balance_at_promo_end;

    Ok(TwoStagePayment {
        promo_payment,
        float_payment,
        balance_at_promo_end,
        total_interest: promo_interest + float_interest,
    })
}

// ---------------------------------------------------------------------------
// LoanTerms
// ---------------------------------------------------------------------------

impl LoanTerms {
    pub fn payments(&self) -> PropertyInvestResult<TwoStagePayment> {
        two_stage_payment(
            self.principal,
            self.preferential_rate,
            self.preferential_months,
            self.floating_rate,
            self.total_months,
        )
    }

    /// Outstanding principal after `elapsed_months`, switching from the
    /// preferential schedule to the floating re-amortisation once the
    /// preferential period is over.
    pub fn remaining_balance_at(&self, elapsed_months: u32) -> PropertyInvestResult<Money> {
        if elapsed_months >= self.total_months {
            return Ok(Decimal::ZERO);
        }

        if elapsed_months <= self.preferential_months {
            return remaining_balance(
                self.principal,
                self.preferential_rate,
                self.total_months,
                elapsed_months,
            );
        }

        let balance_at_promo_end = remaining_balance(
            self.principal,
            self.preferential_rate,
            self.total_months,
            self.preferential_months,
        )?;
        remaining_balance(
            balance_at_promo_end,
            self.floating_rate,
            self.total_months - self.preferential_months,
            elapsed_months - self.preferential_months,
        )
    }
}

/// Month-by-month schedule following the two-stage payments.
///
/// The last row (or any row whose principal would overshoot) retires the
/// remaining balance exactly, so the schedule closes at zero.
pub fn amortization_schedule(loan: &LoanTerms) -> PropertyInvestResult<AmortizationSchedule> {
    let payments = loan.payments()?;
    let mut rows = Vec::with_capacity(loan.total_months as usize);
    let mut balance = loan.principal;
    let mut total_paid = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;

    for month in 1..=loan.total_months {
        let (annual_rate, scheduled) = if month <= loan.preferential_months {
            (loan.preferential_rate, payments.promo_payment)
        } else {
            (loan.floating_rate, payments.float_payment)
        };

        let r = monthly_rate(annual_rate).ok_or_else(|| overflow("monthly rate"))?;
        let interest = balance
            .checked_mul(r)
            .ok_or_else(|| overflow("schedule interest"))?;

        let mut principal = scheduled - interest;
        let mut payment = scheduled;
        if principal > balance || month == loan.total_months {
            principal = balance;
            payment = interest + balance;
        }

        balance -= principal;
        total_paid += payment;
        total_interest += interest;

        rows.push(ScheduleRow {
            month,
            annual_rate,
            payment,
            interest,
            principal,
            closing_balance: balance,
        });
    }

    Ok(AmortizationSchedule {
        rows,
        total_paid,
        total_interest,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
