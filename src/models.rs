//! Data models for the timer core.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kind of interval the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Focused work session.
    #[default]
    Work,
    /// Short break between work sessions.
    ShortBreak,
    /// Long break at the end of a cycle.
    LongBreak,
}

impl Phase {
    /// Returns true for either break phase.
    pub fn is_break(&self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "Focus",
            Self::ShortBreak => "Short break",
            Self::LongBreak => "Long break",
        }
    }
}

/// Whether the countdown is ticking. Running and paused are exclusive by
/// construction; `Idle` means stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Countdown state of the current phase.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_secs: u32,
    /// Configured duration of the current phase.
    pub total_secs: u32,
    pub run: RunState,
}

impl TimerState {
    /// Creates an idle work phase with the full work duration remaining.
    pub fn new(work_secs: u32) -> Self {
        Self::idle(Phase::Work, work_secs)
    }

    /// Creates an idle state for the given phase with its full duration.
    pub fn idle(phase: Phase, total_secs: u32) -> Self {
        Self {
            phase,
            remaining_secs: total_secs,
            total_secs,
            run: RunState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.run == RunState::Idle
    }

    pub fn is_running(&self) -> bool {
        self.run == RunState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.run == RunState::Paused
    }

    /// Returns the progress fraction (0.0 to 1.0) of the current phase.
    pub fn progress_percent(&self) -> f32 {
        if self.total_secs == 0 {
            return 1.0;
        }
        1.0 - (self.remaining_secs as f32 / self.total_secs as f32)
    }
}

/// Pomodoro count and focus minutes for one day or one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodStats {
    #[serde(default)]
    pub pomodoros: u32,
    #[serde(default)]
    pub minutes: u32,
}

/// Persisted statistics shared across runs.
///
/// `total_pomodoros` always equals the sum of `daily_stats[*].pomodoros`;
/// only [`crate::stats::StatsAggregator::record_work_session`] mutates it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_pomodoros: u32,
    #[serde(default)]
    pub total_work_minutes: u32,
    /// Keyed by ISO date (`2024-01-15`).
    #[serde(default)]
    pub daily_stats: BTreeMap<String, PeriodStats>,
    /// Keyed by ISO year-week (`2024-W03`).
    #[serde(default)]
    pub weekly_stats: BTreeMap<String, PeriodStats>,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub last_pomodoro_date: Option<String>,
}

/// All-time counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TotalStats {
    pub total_pomodoros: u32,
    pub total_work_minutes: u32,
    pub streak_days: u32,
}

/// Observable state handed to the presentation layer after every command.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timer: TimerState,
    /// Work phase in its final `warning_threshold` fraction.
    pub finishing: bool,
    pub completed_work_sessions: u32,
    pub position_in_cycle: u32,
    pub cycle_length: u32,
    pub today: PeriodStats,
    pub week: PeriodStats,
    pub totals: TotalStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_state_new_is_idle_work() {
        let state = TimerState::new(1500);
        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.remaining_secs, 1500);
        assert_eq!(state.total_secs, 1500);
        assert!(state.is_idle());
        assert!(!state.is_running());
        assert!(!state.is_paused());
    }

    #[test]
    fn test_progress_percent() {
        let mut state = TimerState::new(1500);
        assert_eq!(state.progress_percent(), 0.0);

        state.remaining_secs = 1200;
        assert!((state.progress_percent() - 0.2).abs() < 0.01);

        state.remaining_secs = 0;
        assert!((state.progress_percent() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_progress_division_by_zero() {
        let state = TimerState::idle(Phase::ShortBreak, 0);
        assert_eq!(state.progress_percent(), 1.0);
    }

    #[test]
    fn test_phase_is_break() {
        assert!(!Phase::Work.is_break());
        assert!(Phase::ShortBreak.is_break());
        assert!(Phase::LongBreak.is_break());
    }

    #[test]
    fn test_statistics_missing_fields_default() {
        let stats: Statistics = serde_json::from_str(r#"{"total_pomodoros": 3}"#).unwrap();
        assert_eq!(stats.total_pomodoros, 3);
        assert_eq!(stats.total_work_minutes, 0);
        assert!(stats.daily_stats.is_empty());
        assert_eq!(stats.last_pomodoro_date, None);
    }

    #[test]
    fn test_statistics_json_shape() {
        let mut stats = Statistics::default();
        stats.daily_stats.insert(
            "2024-01-15".into(),
            PeriodStats {
                pomodoros: 2,
                minutes: 50,
            },
        );
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["daily_stats"]["2024-01-15"]["pomodoros"], 2);
        assert_eq!(value["last_pomodoro_date"], serde_json::Value::Null);
        assert_eq!(value["streak_days"], 0);
    }
}
