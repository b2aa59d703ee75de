use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use super::holidays::HolidayCalendar;
use crate::error::{SimResult, SimulationError};

/// Immutable union of holidays over an inclusive range of years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidaySet {
    start_year: i32,
    end_year: i32,
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    pub(crate) fn new(start_year: i32, end_year: i32, dates: BTreeSet<NaiveDate>) -> Self {
        Self {
            start_year,
            end_year,
            dates,
        }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.end_year
    }

    pub fn covers(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Sundays and holidays are non-business days. Saturdays are business days.
    ///
    /// Fails for a year outside the set rather than answering `false`.
    pub fn is_non_business_day(&self, date: NaiveDate) -> SimResult<bool> {
        if !self.covers(date.year()) {
            return Err(SimulationError::UncoveredYear {
                year: date.year(),
                start_year: self.start_year,
                end_year: self.end_year,
            });
        }
        Ok(date.weekday() == Weekday::Sun || self.dates.contains(&date))
    }
}

/// Rolls dates forward to business days, widening its holiday snapshot
/// whenever a date lands in a year it does not cover yet.
#[derive(Debug)]
pub struct BusinessDayAdjuster<'a> {
    calendar: &'a HolidayCalendar,
    holidays: HolidaySet,
}

impl<'a> BusinessDayAdjuster<'a> {
    pub fn new(calendar: &'a HolidayCalendar, start_year: i32, end_year: i32) -> SimResult<Self> {
        let holidays = calendar.holiday_set(start_year, end_year)?;
        Ok(Self { calendar, holidays })
    }

    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    pub fn is_non_business_day(&mut self, date: NaiveDate) -> SimResult<bool> {
        self.ensure_covered(date.year())?;
        self.holidays.is_non_business_day(date)
    }

    /// Returns `date` itself when it is a business day, otherwise the first
    /// business day after it.
    pub fn next_business_day(&mut self, date: NaiveDate) -> SimResult<NaiveDate> {
        let mut adjusted = date;
        while self.is_non_business_day(adjusted)? {
            adjusted = adjusted.succ_opt().ok_or_else(|| {
                SimulationError::InvalidDate(format!("no day after {adjusted}"))
            })?;
        }
        if adjusted != date {
            debug!(%date, %adjusted, "shifted to next business day");
        }
        Ok(adjusted)
    }

    fn ensure_covered(&mut self, year: i32) -> SimResult<()> {
        if self.holidays.covers(year) {
            return Ok(());
        }
        let start_year = self.holidays.start_year().min(year);
        let end_year = self.holidays.end_year().max(year);
        debug!(year, start_year, end_year, "rebuilding holiday set");
        self.holidays = self.calendar.holiday_set(start_year, end_year)?;
        Ok(())
    }
}
