//! Cross-session statistics: totals, daily and weekly counts, streaks.

use crate::clock::{week_key, Clock};
use crate::models::{PeriodStats, Statistics, TotalStats};
use crate::persistence::{PersistenceError, Store};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Result of recording a work session. The in-memory statistics are updated
/// even when saving fails.
#[derive(Debug)]
pub struct Recorded {
    pub stats: Statistics,
    pub save_error: Option<PersistenceError>,
}

/// Owns the persisted statistics and the rules for updating them.
pub struct StatsAggregator {
    store: Box<dyn Store<Statistics>>,
    clock: Box<dyn Clock>,
    current: Statistics,
    /// Set when the last save failed; the in-memory copy is then newer than
    /// the store and must not be replaced by a reload.
    unsaved: bool,
}

impl StatsAggregator {
    pub fn new(store: Box<dyn Store<Statistics>>, clock: Box<dyn Clock>) -> Self {
        let current = load_or_default(store.as_ref());
        Self {
            store,
            clock,
            current,
            unsaved: false,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The statistics as last loaded or recorded.
    pub fn current(&self) -> &Statistics {
        &self.current
    }

    /// Counts one completed work session of `duration_minutes` for today.
    pub fn record_work_session(&mut self, duration_minutes: u32) -> Recorded {
        if !self.unsaved {
            self.current = load_or_default(self.store.as_ref());
        }

        let today = self.clock.today();
        let stats = &mut self.current;

        stats.total_pomodoros = stats.total_pomodoros.saturating_add(1);
        stats.total_work_minutes = stats.total_work_minutes.saturating_add(duration_minutes);
        add_session(
            stats.daily_stats.entry(today.to_string()).or_default(),
            duration_minutes,
        );
        add_session(
            stats.weekly_stats.entry(week_key(today)).or_default(),
            duration_minutes,
        );

        let last = stats
            .last_pomodoro_date
            .as_deref()
            .and_then(|raw| raw.parse::<NaiveDate>().ok());
        stats.streak_days = next_streak(stats.streak_days, last, today);
        stats.last_pomodoro_date = Some(today.to_string());

        info!(
            minutes = duration_minutes,
            total = stats.total_pomodoros,
            streak = stats.streak_days,
            "Recorded pomodoro"
        );

        let save_error = match self.store.save(&self.current) {
            Ok(()) => {
                self.unsaved = false;
                None
            }
            Err(e) => {
                warn!("Could not save statistics: {}", e);
                self.unsaved = true;
                Some(e)
            }
        };

        Recorded {
            stats: self.current.clone(),
            save_error,
        }
    }

    /// Today's counts, zero when nothing was recorded today.
    pub fn today_stats(&self) -> PeriodStats {
        let key = self.clock.today().to_string();
        self.current
            .daily_stats
            .get(&key)
            .copied()
            .unwrap_or_default()
    }

    /// Counts for the current ISO week, zero when nothing was recorded.
    pub fn week_stats(&self) -> PeriodStats {
        let key = week_key(self.clock.today());
        self.current
            .weekly_stats
            .get(&key)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_stats(&self) -> TotalStats {
        TotalStats {
            total_pomodoros: self.current.total_pomodoros,
            total_work_minutes: self.current.total_work_minutes,
            streak_days: self.current.streak_days,
        }
    }
}

/// Loads statistics, falling back to zeroed defaults when the store is
/// empty or unreadable.
pub fn load_or_default(store: &dyn Store<Statistics>) -> Statistics {
    match store.load() {
        Ok(Some(stats)) => stats,
        Ok(None) => {
            debug!("No statistics stored yet");
            Statistics::default()
        }
        Err(e) => {
            warn!("Could not load statistics: {}. Starting from zero.", e);
            Statistics::default()
        }
    }
}

fn add_session(period: &mut PeriodStats, minutes: u32) {
    period.pomodoros = period.pomodoros.saturating_add(1);
    period.minutes = period.minutes.saturating_add(minutes);
}

/// Streak after recording on `today`, given the previous record date.
/// A date in the future counts as the same day.
fn next_streak(streak: u32, last: Option<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(last) = last else {
        return 1;
    };
    match (today - last).num_days() {
        gap if gap <= 0 => streak,
        1 => streak.saturating_add(1),
        _ => 1,
    }
}
