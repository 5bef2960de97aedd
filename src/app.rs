//! The phase state machine and the commands the presentation layer issues.

use crate::clock::Clock;
use crate::cycle::CycleCounter;
use crate::models::{Phase, RunState, Snapshot, Statistics, TimerState};
use crate::persistence::{PersistenceError, Store};
use crate::settings::{Settings, SettingsError, SettingsUpdate};
use crate::stats::StatsAggregator;
use tracing::{debug, info, warn};

/// A moment the presentation layer should mark with sound or a notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    /// The timer started from idle (not on resume).
    Started { phase: Phase },
    /// A work session ran to zero. `next` is the break that follows.
    WorkComplete {
        completed_today: u32,
        next: Phase,
        break_mins: u32,
    },
    /// A break ran to zero.
    BreakComplete,
}

/// What a command produced: the new state, at most one cue, and any
/// persistence failure. A failed save never rolls back the state.
#[derive(Debug)]
pub struct Outcome {
    pub snapshot: Snapshot,
    pub cue: Option<Cue>,
    pub save_error: Option<PersistenceError>,
}

/// Timer state, configuration, cycle counter and statistics.
///
/// All mutation goes through `&mut self`, so ticks and user commands are
/// serialized by whoever owns the app (the tray app keeps it behind a mutex).
pub struct App {
    settings: Settings,
    state: TimerState,
    cycle: CycleCounter,
    stats: StatsAggregator,
    settings_store: Box<dyn Store<Settings>>,
}

impl App {
    /// Creates the app, loading settings and statistics. Unreadable or
    /// invalid stored data falls back to defaults.
    pub fn new(
        settings_store: Box<dyn Store<Settings>>,
        stats_store: Box<dyn Store<Statistics>>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let settings = load_settings(settings_store.as_ref());
        let stats = StatsAggregator::new(stats_store, clock);

        Self {
            state: TimerState::new(settings.work_secs()),
            settings,
            cycle: CycleCounter::new(),
            stats,
            settings_store,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.cycle.completed()
    }

    pub fn position_in_cycle(&self) -> u32 {
        self.cycle
            .position_in_cycle(self.settings.pomodoros_until_long_break)
    }

    /// Starts the current phase, or resumes it when paused. Only a start from
    /// idle produces a cue.
    pub fn start(&mut self) -> Outcome {
        let cue = match self.state.run {
            RunState::Idle => {
                self.state.run = RunState::Running;
                info!("Timer started ({:?})", self.state.phase);
                Some(Cue::Started {
                    phase: self.state.phase,
                })
            }
            RunState::Paused => {
                self.state.run = RunState::Running;
                info!("Timer resumed");
                None
            }
            RunState::Running => None,
        };
        self.outcome(cue, None)
    }

    pub fn pause(&mut self) -> Outcome {
        if self.state.is_running() {
            self.state.run = RunState::Paused;
            info!(remaining = self.state.remaining_secs, "Timer paused");
        }
        self.outcome(None, None)
    }

    pub fn resume(&mut self) -> Outcome {
        if self.state.is_paused() {
            return self.start();
        }
        self.outcome(None, None)
    }

    /// Pauses when running, resumes when paused, ignored when idle.
    pub fn toggle_pause(&mut self) -> Outcome {
        match self.state.run {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
            RunState::Idle => self.outcome(None, None),
        }
    }

    /// Stops and returns to a full work phase. The cycle count is kept.
    pub fn reset(&mut self) -> Outcome {
        self.state = TimerState::new(self.settings.work_secs());
        info!("Timer reset");
        self.outcome(None, None)
    }

    /// Zeroes the cycle count and resets the timer.
    pub fn reset_session(&mut self) -> Outcome {
        self.cycle.reset();
        info!("Session reset");
        self.reset()
    }

    /// Moves to the next phase without completing the current one. A skipped
    /// work session is not counted and not recorded. Ignored when idle.
    pub fn skip(&mut self) -> Outcome {
        if self.state.is_idle() {
            return self.outcome(None, None);
        }

        let next = match self.state.phase {
            Phase::Work => self.break_after_work(
                self.cycle
                    .next_break_is_long(self.settings.pomodoros_until_long_break),
            ),
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        info!("Skipped {:?}, next is {:?}", self.state.phase, next);
        self.state = TimerState::idle(next, self.duration_of(next));
        self.outcome(None, None)
    }

    /// Advances the countdown by one second. Does nothing unless running.
    pub fn tick(&mut self) -> Outcome {
        if !self.state.is_running() {
            return self.outcome(None, None);
        }

        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs == 0 {
            let (cue, save_error) = self.complete_phase();
            return self.outcome(Some(cue), save_error);
        }
        self.outcome(None, None)
    }

    /// Applies a settings change. Rejected while the timer is running or
    /// paused; an invalid field rejects the whole update. The timer is reset
    /// only when a duration or the cycle length changed, so toggling a flag
    /// keeps a pending break.
    pub fn update_settings(&mut self, update: &SettingsUpdate) -> Result<Outcome, SettingsError> {
        if !self.state.is_idle() {
            warn!("Settings update rejected: timer is active");
            return Err(SettingsError::TimerActive);
        }

        let next = update.apply_to(&self.settings).map_err(|e| {
            warn!("Settings update rejected: {}", e);
            e
        })?;
        let reconfigured = !next.same_timing(&self.settings);
        self.settings = next;
        if reconfigured {
            self.state = TimerState::new(self.settings.work_secs());
        }
        info!(
            work = self.settings.work_time_minutes,
            short_break = self.settings.break_time_minutes,
            long_break = self.settings.long_break_minutes,
            cycle = self.settings.pomodoros_until_long_break,
            "Settings updated"
        );

        let save_error = self.save_settings();
        Ok(self.outcome(None, save_error))
    }

    /// Toggles the completion sound. Allowed at any time.
    pub fn set_beep_enabled(&mut self, enabled: bool) -> Outcome {
        self.settings.beep_enabled = enabled;
        let save_error = self.save_settings();
        self.outcome(None, save_error)
    }

    /// Toggles desktop notifications. Allowed at any time.
    pub fn set_notifications_enabled(&mut self, enabled: bool) -> Outcome {
        self.settings.notifications_enabled = enabled;
        let save_error = self.save_settings();
        self.outcome(None, save_error)
    }

    pub fn snapshot(&self) -> Snapshot {
        let cycle_length = self.settings.pomodoros_until_long_break;
        Snapshot {
            timer: self.state.clone(),
            finishing: self.is_finishing(),
            completed_work_sessions: self.cycle.completed(),
            position_in_cycle: self.cycle.position_in_cycle(cycle_length),
            cycle_length,
            today: self.stats.today_stats(),
            week: self.stats.week_stats(),
            totals: self.stats.total_stats(),
        }
    }

    fn complete_phase(&mut self) -> (Cue, Option<PersistenceError>) {
        match self.state.phase {
            Phase::Work => {
                let long = self
                    .cycle
                    .record_completion(self.settings.pomodoros_until_long_break);
                let next = self.break_after_work(long);
                self.enter_phase(next, self.settings.auto_start_breaks);
                info!(
                    count = self.cycle.completed(),
                    "Pomodoro completed, starting {:?}", next
                );

                let recorded = self
                    .stats
                    .record_work_session(self.settings.work_time_minutes);
                let completed_today = self.stats.today_stats().pomodoros;
                let cue = Cue::WorkComplete {
                    completed_today,
                    next,
                    break_mins: self.duration_of(next) / 60,
                };
                (cue, recorded.save_error)
            }
            Phase::ShortBreak | Phase::LongBreak => {
                self.enter_phase(Phase::Work, self.settings.auto_start_work);
                info!("Break completed");
                (Cue::BreakComplete, None)
            }
        }
    }

    fn enter_phase(&mut self, phase: Phase, keep_running: bool) {
        let mut next = TimerState::idle(phase, self.duration_of(phase));
        if keep_running {
            next.run = RunState::Running;
        }
        self.state = next;
    }

    fn break_after_work(&self, long: bool) -> Phase {
        if long {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        }
    }

    fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.settings.work_secs(),
            Phase::ShortBreak => self.settings.short_break_secs(),
            Phase::LongBreak => self.settings.long_break_secs(),
        }
    }

    fn is_finishing(&self) -> bool {
        self.state.phase == Phase::Work
            && !self.state.is_idle()
            && self.state.remaining_secs > 0
            && f64::from(self.state.remaining_secs)
                <= self.settings.warning_threshold * f64::from(self.settings.work_secs())
    }

    fn save_settings(&self) -> Option<PersistenceError> {
        match self.settings_store.save(&self.settings) {
            Ok(()) => None,
            Err(e) => {
                warn!("Could not save settings: {}", e);
                Some(e)
            }
        }
    }

    fn outcome(&self, cue: Option<Cue>, save_error: Option<PersistenceError>) -> Outcome {
        Outcome {
            snapshot: self.snapshot(),
            cue,
            save_error,
        }
    }
}

/// Loads settings, falling back to defaults for anything unreadable or out
/// of range.
pub fn load_settings(store: &dyn Store<Settings>) -> Settings {
    match store.load() {
        Ok(Some(mut settings)) => {
            if let Err(e) = settings.validate() {
                warn!("Stored settings are invalid ({}). Using defaults.", e);
                settings.reset_core_fields();
            } else {
                debug!("Settings loaded");
            }
            settings
        }
        Ok(None) => Settings::default(),
        Err(e) => {
            warn!("Could not load settings: {}. Using defaults.", e);
            Settings::default()
        }
    }
}
