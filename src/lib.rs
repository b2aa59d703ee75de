//! `microloan_sim` computes the repayment schedule of a micro-loan.
//!
//! Given a principal, an annual effective rate (TEA), a number of monthly
//! installments and the disbursement / first-payment dates, it produces:
//! - a repayment table whose payment dates fall on business days of the
//!   Peruvian calendar (Sundays and public holidays are skipped),
//! - level installments over non-uniform periods, with daily accrual on a
//!   360-day rate year and a closing installment that clears the balance,
//! - column totals and the TCEA, the XIRR of the whole cash-flow stream,
//! - a comparison against lending the same capital into a fixed-term deposit.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use microloan_sim::{SimulationInput, calculate_schedule};
//! use rust_decimal_macros::dec;
//!
//! let input = SimulationInput {
//!     principal: dec!(2000),
//!     annual_rate: dec!(70),
//!     term: 12,
//!     disbursement_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
//!     first_payment_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
//!     loan_count: 1,
//!     benchmark_rate: dec!(4.28),
//! };
//!
//! match calculate_schedule(&input) {
//!     Ok(result) => {
//!         println!("Level installment: {}", result.summary.level_installment);
//!         println!("Total interest:    {}", result.summary.total_interest);
//!         match result.summary.effective_cost_rate {
//!             Some(tcea) => println!("TCEA: {tcea}"),
//!             None => println!("TCEA: undefined"),
//!         }
//!     }
//!     Err(e) => eprintln!("Error calculating schedule: {e}"),
//! }
//! ```

pub mod calendar;
pub mod error;
pub mod input;
pub mod schedule;
pub mod summary;
pub mod types;
pub mod xirr;

use chrono::{Datelike, Months};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use calendar::{BusinessDayAdjuster, CalendarConfig, HolidayCalendar, HolidaySet};
pub use error::{SimResult, SimulationError};
pub use input::{SimulationInput, ValidatedInput};
pub use schedule::{InstallmentRow, Period, ScheduleRow};
pub use summary::{ComparisonMetrics, ScheduleSummary, cash_flows};
pub use types::{Money, Rate};
pub use xirr::DatedCashFlow;

/// Everything a simulation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// The disbursement row followed by one row per installment.
    pub rows: Vec<ScheduleRow>,
    /// Column totals, TEA and TCEA.
    pub summary: ScheduleSummary,
    /// Lending compared with the fixed-term deposit benchmark.
    pub comparison: ComparisonMetrics,
}

/// Runs simulations against a holiday calendar whose per-year cache is
/// shared by every run.
#[derive(Debug, Default)]
pub struct Simulator {
    calendar: HolidayCalendar,
}

impl Simulator {
    pub fn new(calendar: HolidayCalendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    /// Validates `input` and builds the schedule, totals and comparison.
    ///
    /// # Errors
    ///
    /// Fails on any out-of-range input, a non-positive payment period or a
    /// degenerate present value factor. An undefined TCEA is not an error.
    pub fn simulate(&self, input: &SimulationInput) -> SimResult<SimulationResult> {
        let input = input.validate()?;

        let (start_year, end_year) = holiday_years(&input)?;
        let mut adjuster = BusinessDayAdjuster::new(&self.calendar, start_year, end_year)?;
        let periods = schedule::payment_periods(
            input.disbursement_date,
            input.first_payment_date,
            input.term,
            &mut adjuster,
        )?;

        let table = schedule::build_schedule(
            input.principal,
            input.annual_rate,
            input.disbursement_date,
            &periods,
        )?;

        let mut summary = ScheduleSummary::from_rows(
            &table.rows,
            table.present_value_factor,
            table.level_installment,
            input.annual_rate,
        );
        summary.effective_cost_rate =
            xirr::xirr(&cash_flows(&table.rows), xirr::DEFAULT_GUESS);
        if summary.effective_cost_rate.is_none() {
            warn!(principal = %input.principal, term = input.term, "TCEA is undefined");
        }

        let comparison = ComparisonMetrics::new(
            &summary,
            input.principal,
            input.term,
            input.loan_count,
            input.benchmark_rate,
        );

        info!(
            principal = %input.principal,
            term = input.term,
            level_installment = %summary.level_installment,
            total_due = %summary.total_due,
            "schedule computed"
        );

        Ok(SimulationResult {
            rows: table.rows,
            summary,
            comparison,
        })
    }
}

/// Runs a single simulation with the default (Peruvian) calendar.
pub fn calculate_schedule(input: &SimulationInput) -> SimResult<SimulationResult> {
    Simulator::default().simulate(input)
}

/// Years whose holidays the payment dates can touch: from the disbursement
/// year to the year of the first payment date plus `term` months.
fn holiday_years(input: &ValidatedInput) -> SimResult<(i32, i32)> {
    let horizon = input
        .first_payment_date
        .checked_add_months(Months::new(input.term))
        .ok_or_else(|| {
            SimulationError::InvalidDate(format!(
                "{} plus {} months is out of range",
                input.first_payment_date, input.term
            ))
        })?;
    Ok((input.disbursement_date.year(), horizon.year()))
}
