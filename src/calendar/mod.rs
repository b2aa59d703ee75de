//! Business-day calendar for payment dates.
//!
//! - [`holidays`]: fixed and Easter-relative public holidays, memoized per year
//! - [`adjuster`]: rolls candidate payment dates forward to the next business day

pub mod adjuster;
pub mod holidays;

pub use adjuster::{BusinessDayAdjuster, HolidaySet};
pub use holidays::{CalendarConfig, FixedHoliday, HolidayCache, HolidayCalendar, easter_sunday};
