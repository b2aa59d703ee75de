use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::adjuster::HolidaySet;
use crate::error::{SimResult, SimulationError};

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Easter Sunday for `year` (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// A civil holiday observed on the same month and day every year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedHoliday {
    /// Month, 1 to 12.
    pub month: u32,
    /// Day of the month.
    pub day: u32,
    /// Display name; informational only.
    #[serde(default)]
    pub name: String,
}

impl FixedHoliday {
    fn new(month: u32, day: u32, name: &str) -> Self {
        Self {
            month,
            day,
            name: name.into(),
        }
    }
}

/// Holiday rules plus the cache bound. The default is the Peruvian calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Civil holidays repeated every year.
    pub fixed_holidays: Vec<FixedHoliday>,
    /// Observe Maundy Thursday and Good Friday.
    #[serde(default = "default_true")]
    pub holy_week: bool,
    /// Most years the holiday cache keeps at once.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            fixed_holidays: vec![
                FixedHoliday::new(1, 1, "New Year's Day"),
                FixedHoliday::new(5, 1, "Labour Day"),
                FixedHoliday::new(6, 7, "Battle of Arica"),
                FixedHoliday::new(6, 29, "Saints Peter and Paul"),
                FixedHoliday::new(7, 23, "Air Force Day"),
                FixedHoliday::new(7, 28, "Independence Day"),
                FixedHoliday::new(7, 29, "Independence Day"),
                FixedHoliday::new(8, 6, "Battle of Junin"),
                FixedHoliday::new(8, 30, "Saint Rose of Lima"),
                FixedHoliday::new(10, 8, "Battle of Angamos"),
                FixedHoliday::new(11, 1, "All Saints' Day"),
                FixedHoliday::new(12, 8, "Immaculate Conception"),
                FixedHoliday::new(12, 9, "Battle of Ayacucho"),
                FixedHoliday::new(12, 25, "Christmas Day"),
            ],
            holy_week: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl CalendarConfig {
    /// Parses a config from JSON and rejects month/day pairs that never exist.
    ///
    /// February 29 is accepted; it is simply skipped in common years.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: CalendarConfig = serde_json::from_str(json)?;
        for holiday in &config.fixed_holidays {
            if NaiveDate::from_ymd_opt(2000, holiday.month, holiday.day).is_none() {
                return Err(SimulationError::InvalidDate(format!(
                    "fixed holiday {:?} has no valid date {:02}-{:02}",
                    holiday.name, holiday.month, holiday.day
                )));
            }
        }
        if config.cache_capacity == 0 {
            return Err(SimulationError::invalid_input(
                "cache_capacity",
                "must be at least 1",
            ));
        }
        Ok(config)
    }
}

/// Thread-safe, size-bounded memo of holiday dates per year.
///
/// When full, inserting a year evicts the cached year farthest from it.
#[derive(Debug)]
pub struct HolidayCache {
    entries: RwLock<BTreeMap<i32, Arc<BTreeSet<NaiveDate>>>>,
    capacity: usize,
}

impl HolidayCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, year: i32) -> Option<Arc<BTreeSet<NaiveDate>>> {
        self.entries.read().get(&year).cloned()
    }

    pub fn insert(&self, year: i32, holidays: Arc<BTreeSet<NaiveDate>>) {
        let mut entries = self.entries.write();
        if !entries.contains_key(&year) && entries.len() >= self.capacity {
            let farthest = entries
                .keys()
                .copied()
                .max_by_key(|cached| (cached - year).abs());
            if let Some(evicted) = farthest {
                entries.remove(&evicted);
                debug!(year = evicted, "evicted holiday year from cache");
            }
        }
        entries.insert(year, holidays);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Computes public holidays and hands out immutable [`HolidaySet`] snapshots.
#[derive(Debug)]
pub struct HolidayCalendar {
    config: CalendarConfig,
    cache: HolidayCache,
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::new(CalendarConfig::default())
    }
}

impl HolidayCalendar {
    pub fn new(config: CalendarConfig) -> Self {
        let cache = HolidayCache::new(config.cache_capacity);
        Self { config, cache }
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub fn cache(&self) -> &HolidayCache {
        &self.cache
    }

    /// Holidays of a single year, served from the cache when possible.
    pub fn holidays_for_year(&self, year: i32) -> SimResult<Arc<BTreeSet<NaiveDate>>> {
        if let Some(cached) = self.cache.get(year) {
            return Ok(cached);
        }

        let holidays = Arc::new(self.compute_year(year)?);
        self.cache.insert(year, Arc::clone(&holidays));
        debug!(year, count = holidays.len(), "computed holidays");
        Ok(holidays)
    }

    /// Union of the holidays of every year in `start_year..=end_year`.
    ///
    /// Always builds a fresh set; callers swap snapshots instead of mutating one.
    pub fn holiday_set(&self, start_year: i32, end_year: i32) -> SimResult<HolidaySet> {
        if end_year < start_year {
            return Err(SimulationError::InvalidDate(format!(
                "holiday range {start_year}..={end_year} is empty"
            )));
        }

        let mut dates = BTreeSet::new();
        for year in start_year..=end_year {
            dates.extend(self.holidays_for_year(year)?.iter().copied());
        }
        Ok(HolidaySet::new(start_year, end_year, dates))
    }

    fn compute_year(&self, year: i32) -> SimResult<BTreeSet<NaiveDate>> {
        let mut holidays = BTreeSet::new();

        for fixed in &self.config.fixed_holidays {
            match NaiveDate::from_ymd_opt(year, fixed.month, fixed.day) {
                Some(date) => {
                    holidays.insert(date);
                }
                None if fixed.month == 2 && fixed.day == 29 => {}
                None => {
                    return Err(SimulationError::InvalidDate(format!(
                        "fixed holiday {:02}-{:02} does not exist in {year}",
                        fixed.month, fixed.day
                    )));
                }
            }
        }

        if self.config.holy_week {
            let easter = easter_sunday(year).ok_or_else(|| {
                SimulationError::InvalidDate(format!("cannot compute Easter for {year}"))
            })?;
            holidays.insert(easter - Duration::days(3));
            holidays.insert(easter - Duration::days(2));
        }

        Ok(holidays)
    }
}
