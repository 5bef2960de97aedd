//! Calendar date source for statistics.

use chrono::{Datelike, Days, Local, NaiveDate};
use std::sync::{Arc, Mutex};

pub trait Clock: Send {
    /// Today's local calendar date.
    fn today(&self) -> NaiveDate;
}

/// The local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A manually advanced clock. Clones share the same date.
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(Mutex::new(date)),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        if let Ok(mut current) = self.date.lock() {
            *current = date;
        }
    }

    pub fn advance_days(&self, days: u64) {
        if let Ok(mut current) = self.date.lock() {
            if let Some(next) = current.checked_add_days(Days::new(days)) {
                *current = next;
            }
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.date.lock() {
            Ok(date) => *date,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// ISO year-week key such as `2024-W03`. Uses the ISO week-numbering year,
/// so 2024-12-30 belongs to `2025-W01`.
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_key() {
        assert_eq!(week_key(date(2024, 1, 15)), "2024-W03");
        assert_eq!(week_key(date(2024, 12, 30)), "2025-W01");
        assert_eq!(week_key(date(2021, 1, 3)), "2020-W53");
    }

    #[test]
    fn test_fixed_clock_shared_between_clones() {
        let clock = FixedClock::new(date(2024, 2, 28));
        let other = clock.clone();
        clock.advance_days(2);
        assert_eq!(other.today(), date(2024, 3, 1));
        other.set(date(2024, 1, 1));
        assert_eq!(clock.today(), date(2024, 1, 1));
    }
}
