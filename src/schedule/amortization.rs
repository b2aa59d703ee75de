use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dates::Period;
use crate::error::{SimResult, SimulationError};
use crate::types::{Money, Rate, round2};

/// Financial transaction tax (ITF) charged on every installment.
pub const TRANSACTION_TAX_RATE: Rate = dec!(0.00005);

/// Per-installment expense. No fee schedule applies yet.
pub const FIXED_EXPENSE: Money = Decimal::ZERO;

/// Balances under one cent are rounding residue, not debt.
const DUST_THRESHOLD: Money = dec!(0.01);

/// Days in the year the annual effective rate is quoted over.
const RATE_YEAR_DAYS: Decimal = dec!(360);

/// One line of the repayment table. Monetary fields are rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentRow {
    /// Installment number, starting at 1.
    pub index: u32,
    /// Payment date, already rolled to a business day.
    pub payment_date: NaiveDate,
    /// Calendar days since the previous payment or the disbursement.
    pub period_days: u32,
    /// Principal still owed after this installment.
    pub balance: Money,
    /// Principal repaid by this installment.
    pub amortization: Money,
    /// Interest accrued over the period.
    pub interest: Money,
    /// Amortization plus interest.
    pub partial_installment: Money,
    /// Fixed per-installment expense.
    pub expense: Money,
    /// Partial installment plus expense.
    pub total_installment: Money,
    /// Transaction tax (ITF) on the total installment.
    pub tax: Money,
    /// Total installment plus tax: what the borrower pays.
    pub total_due: Money,
}

impl InstallmentRow {
    /// A row for an installment with nothing left to repay.
    fn settled(index: u32, period: &Period) -> Self {
        Self {
            index,
            payment_date: period.date,
            period_days: period.days,
            balance: Decimal::ZERO,
            amortization: Decimal::ZERO,
            interest: Decimal::ZERO,
            partial_installment: Decimal::ZERO,
            expense: Decimal::ZERO,
            total_installment: Decimal::ZERO,
            tax: Decimal::ZERO,
            total_due: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleRow {
    /// The loan being paid out to the borrower.
    Disbursement { date: NaiveDate, amount: Money },
    /// One repayment.
    Installment(InstallmentRow),
}

impl ScheduleRow {
    pub fn date(&self) -> NaiveDate {
        match self {
            ScheduleRow::Disbursement { date, .. } => *date,
            ScheduleRow::Installment(row) => row.payment_date,
        }
    }

    pub fn installment(&self) -> Option<&InstallmentRow> {
        match self {
            ScheduleRow::Disbursement { .. } => None,
            ScheduleRow::Installment(row) => Some(row),
        }
    }
}

/// The repayment table together with the figures it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Daily effective rate derived from the annual rate.
    pub daily_rate: Rate,
    /// Sum of the discount factors of every payment date (`sumaFSA`).
    pub present_value_factor: Decimal,
    /// Level installment paid by every row but the closing one.
    pub level_installment: Money,
    /// Cents moved onto the last amortizing row so the table foots to principal.
    pub rounding_adjustment: Money,
    /// The disbursement row followed by one row per period.
    pub rows: Vec<ScheduleRow>,
}

/// Daily effective rate equivalent to an annual effective rate over 360 days.
pub fn daily_rate(annual_rate: Rate) -> Rate {
    (Decimal::ONE + annual_rate).powd(Decimal::ONE / RATE_YEAR_DAYS) - Decimal::ONE
}

/// Sum over payment dates of `(1 + daily_rate)^-D`, where `D` is the number of
/// days from disbursement to that payment.
pub fn present_value_factor(daily_rate: Rate, periods: &[Period]) -> SimResult<Decimal> {
    let base = Decimal::ONE + daily_rate;
    let mut elapsed: i64 = 0;
    let mut factor = Decimal::ZERO;

    for period in periods {
        elapsed += i64::from(period.days);
        factor += base.powi(-elapsed);
    }

    if factor <= Decimal::ZERO {
        return Err(SimulationError::DegenerateRate { factor });
    }
    Ok(factor)
}

pub fn level_installment(principal: Money, present_value_factor: Decimal) -> Money {
    round2(principal / present_value_factor)
}

/// Builds the full table: a disbursement row followed by one row per period.
///
/// Every installment but the last pays the level amount while the balance
/// plus interest exceeds it; the last one (or any earlier one that can close
/// the loan) pays off the whole balance.
pub fn build_schedule(
    principal: Money,
    annual_rate: Rate,
    disbursement_date: NaiveDate,
    periods: &[Period],
) -> SimResult<AmortizationSchedule> {
    let daily_rate = daily_rate(annual_rate);
    let factor = present_value_factor(daily_rate, periods)?;
    let level = level_installment(principal, factor);
    debug!(%daily_rate, %factor, %level, "level installment");

    let term = u32::try_from(periods.len())
        .map_err(|_| SimulationError::invalid_input("term", "too many periods"))?;
    let growth = Decimal::ONE + daily_rate;
    let mut rows = Vec::with_capacity(periods.len() + 1);
    rows.push(ScheduleRow::Disbursement {
        date: disbursement_date,
        amount: principal,
    });

    let mut balance = principal;
    for (index, period) in (1u32..).zip(periods) {
        if balance < DUST_THRESHOLD {
            rows.push(ScheduleRow::Installment(InstallmentRow::settled(
                index, period,
            )));
            continue;
        }

        let interest = balance * (growth.powu(u64::from(period.days)) - Decimal::ONE);
        let (amortization, partial_installment) = if index < term && balance + interest > level
        {
            (level - interest, level)
        } else {
            (balance, balance + interest)
        };

        let new_balance = if index == term {
            Decimal::ZERO
        } else {
            balance - amortization
        };

        let total_installment = partial_installment + FIXED_EXPENSE;
        let tax = total_installment * TRANSACTION_TAX_RATE;
        let total_due = total_installment + tax;

        rows.push(ScheduleRow::Installment(InstallmentRow {
            index,
            payment_date: period.date,
            period_days: period.days,
            balance: round2(new_balance),
            amortization: round2(amortization),
            interest: round2(interest),
            partial_installment: round2(partial_installment),
            expense: round2(FIXED_EXPENSE),
            total_installment: round2(total_installment),
            tax: round2(tax),
            total_due: round2(total_due),
        }));

        balance = new_balance;
    }

    let (rows, rounding_adjustment) = reconcile(rows, principal);

    Ok(AmortizationSchedule {
        daily_rate,
        present_value_factor: factor,
        level_installment: level,
        rounding_adjustment,
        rows,
    })
}

/// Moves the gap between `principal` and the summed (rounded) amortization
/// onto the last row that amortizes anything.
///
/// Returns the corrected rows and the amount actually applied.
pub fn reconcile(rows: Vec<ScheduleRow>, principal: Money) -> (Vec<ScheduleRow>, Money) {
    let amortized: Money = rows
        .iter()
        .filter_map(ScheduleRow::installment)
        .map(|row| row.amortization)
        .sum();
    let difference = round2(principal - round2(amortized));
    if difference.is_zero() {
        return (rows, Decimal::ZERO);
    }

    let Some(target) = rows.iter().rposition(|row| {
        row.installment()
            .is_some_and(|installment| installment.amortization > Decimal::ZERO)
    }) else {
        return (rows, Decimal::ZERO);
    };
    debug!(%difference, row = target, "reconciling amortization");

    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(position, row)| match row {
            ScheduleRow::Installment(mut installment) if position == target => {
                installment.amortization += difference;
                ScheduleRow::Installment(installment)
            }
            other => other,
        })
        .collect();

    (rows, difference)
}
