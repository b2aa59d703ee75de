use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::BusinessDayAdjuster;
use crate::error::{SimResult, SimulationError};

/// A payment date and the calendar days elapsed since the previous payment
/// (or since disbursement, for the first one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Payment date, on a business day.
    pub date: NaiveDate,
    /// Days since the previous payment; always positive.
    pub days: u32,
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// `start` moved forward by `months`, placed on `anchor_day` or on the last
/// day of the month when the month is shorter.
pub fn anchored_month(start: NaiveDate, months: u32, anchor_day: u32) -> SimResult<NaiveDate> {
    let shifted = start
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(months)))
        .ok_or_else(|| {
            SimulationError::InvalidDate(format!("cannot add {months} months to {start}"))
        })?;
    let day = anchor_day.min(days_in_month(shifted.year(), shifted.month()));
    shifted.with_day(day).ok_or_else(|| {
        SimulationError::InvalidDate(format!(
            "day {day} does not exist in {}-{:02}",
            shifted.year(),
            shifted.month()
        ))
    })
}

/// Generates `term` payment periods.
///
/// Payment 1 is `first_payment` itself; payment k is `first_payment` plus
/// k-1 months on the same day of month. Every date is rolled to the next
/// business day before its period is measured.
pub fn payment_periods(
    disbursement: NaiveDate,
    first_payment: NaiveDate,
    term: u32,
    adjuster: &mut BusinessDayAdjuster<'_>,
) -> SimResult<Vec<Period>> {
    let anchor_day = first_payment.day();
    let mut periods = Vec::with_capacity(term as usize);
    let mut previous = disbursement;

    for installment in 1..=term {
        let candidate = if installment == 1 {
            first_payment
        } else {
            anchored_month(first_payment, installment - 1, anchor_day)?
        };
        let date = adjuster.next_business_day(candidate)?;

        let days = (date - previous).num_days();
        if days <= 0 {
            return Err(SimulationError::InvalidPeriod { installment, days });
        }
        debug!(installment, %date, days, "payment period");

        periods.push(Period {
            date,
            days: days as u32,
        });
        previous = date;
    }

    Ok(periods)
}
