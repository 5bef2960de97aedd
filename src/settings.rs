//! User-configurable settings and their validation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

pub const MIN_DURATION_MINS: u32 = 1;
pub const MAX_DURATION_MINS: u32 = 1440;
pub const MIN_CYCLE_LENGTH: u32 = 1;
pub const MAX_CYCLE_LENGTH: u32 = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("warning_threshold must be between 0 and 1, got {0}")]
    InvalidThreshold(f64),
    #[error("{field} expects a {expected}, got {value:?}")]
    InvalidValue {
        field: String,
        expected: &'static str,
        value: String,
    },
    #[error("unknown setting: {0}")]
    UnknownField(String),
    #[error("settings cannot change while the timer is running or paused")]
    TimerActive,
}

/// Persisted settings. Field names match `config.json`.
///
/// Deserialization is field by field: a missing field or one of the wrong
/// type takes its default without affecting the others.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Settings {
    /// Duration of a work session in minutes.
    pub work_time_minutes: u32,
    /// Duration of a short break in minutes.
    pub break_time_minutes: u32,
    /// Duration of a long break in minutes.
    pub long_break_minutes: u32,
    /// Number of work sessions per cycle; the last one is followed by a long break.
    pub pomodoros_until_long_break: u32,
    pub auto_start_breaks: bool,
    pub auto_start_work: bool,
    /// Fraction of the work duration left that switches to the finishing state.
    pub warning_threshold: f64,
    pub beep_enabled: bool,
    pub beep_frequency: u32,
    /// Beep length in seconds.
    pub beep_duration: f32,
    pub beep_volume: f32,
    pub notifications_enabled: bool,
    /// Fields written by other tools or newer versions, kept on save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_time_minutes: 25,
            break_time_minutes: 5,
            long_break_minutes: 15,
            pomodoros_until_long_break: 4,
            auto_start_breaks: true,
            auto_start_work: false,
            warning_threshold: 0.1,
            beep_enabled: true,
            beep_frequency: 440,
            beep_duration: 0.3,
            beep_volume: 0.5,
            notifications_enabled: true,
            extra: Map::new(),
        }
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_fields(fields))
    }
}

impl Settings {
    /// Builds settings from a JSON object over the defaults. Unknown keys
    /// end up in `extra`.
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        let mut settings = Self::default();
        take(&mut fields, "work_time_minutes", &mut settings.work_time_minutes);
        take(&mut fields, "break_time_minutes", &mut settings.break_time_minutes);
        take(&mut fields, "long_break_minutes", &mut settings.long_break_minutes);
        take(
            &mut fields,
            "pomodoros_until_long_break",
            &mut settings.pomodoros_until_long_break,
        );
        take(&mut fields, "auto_start_breaks", &mut settings.auto_start_breaks);
        take(&mut fields, "auto_start_work", &mut settings.auto_start_work);
        take(&mut fields, "warning_threshold", &mut settings.warning_threshold);
        take(&mut fields, "beep_enabled", &mut settings.beep_enabled);
        take(&mut fields, "beep_frequency", &mut settings.beep_frequency);
        take(&mut fields, "beep_duration", &mut settings.beep_duration);
        take(&mut fields, "beep_volume", &mut settings.beep_volume);
        take(
            &mut fields,
            "notifications_enabled",
            &mut settings.notifications_enabled,
        );
        settings.extra = fields;
        settings
    }

    pub fn work_secs(&self) -> u32 {
        self.work_time_minutes * 60
    }

    pub fn short_break_secs(&self) -> u32 {
        self.break_time_minutes * 60
    }

    pub fn long_break_secs(&self) -> u32 {
        self.long_break_minutes * 60
    }

    /// Checks every core field; cosmetic fields are not validated.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range(
            "work_time_minutes",
            self.work_time_minutes,
            MIN_DURATION_MINS,
            MAX_DURATION_MINS,
        )?;
        check_range(
            "break_time_minutes",
            self.break_time_minutes,
            MIN_DURATION_MINS,
            MAX_DURATION_MINS,
        )?;
        check_range(
            "long_break_minutes",
            self.long_break_minutes,
            MIN_DURATION_MINS,
            MAX_DURATION_MINS,
        )?;
        check_range(
            "pomodoros_until_long_break",
            self.pomodoros_until_long_break,
            MIN_CYCLE_LENGTH,
            MAX_CYCLE_LENGTH,
        )?;
        if !self.warning_threshold.is_finite() || !(0.0..=1.0).contains(&self.warning_threshold) {
            return Err(SettingsError::InvalidThreshold(self.warning_threshold));
        }
        Ok(())
    }

    /// True when durations and cycle length match.
    pub fn same_timing(&self, other: &Settings) -> bool {
        self.work_time_minutes == other.work_time_minutes
            && self.break_time_minutes == other.break_time_minutes
            && self.long_break_minutes == other.long_break_minutes
            && self.pomodoros_until_long_break == other.pomodoros_until_long_break
    }

    /// Resets the core fields to their defaults, keeping cosmetic and unknown fields.
    pub fn reset_core_fields(&mut self) {
        let defaults = Self::default();
        self.work_time_minutes = defaults.work_time_minutes;
        self.break_time_minutes = defaults.break_time_minutes;
        self.long_break_minutes = defaults.long_break_minutes;
        self.pomodoros_until_long_break = defaults.pomodoros_until_long_break;
        self.auto_start_breaks = defaults.auto_start_breaks;
        self.auto_start_work = defaults.auto_start_work;
        self.warning_threshold = defaults.warning_threshold;
    }
}

/// Moves `key` out of `fields` into `slot` if it parses; otherwise the
/// default in `slot` stays.
fn take<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str, slot: &mut T) {
    let Some(value) = fields.remove(key) else {
        return;
    };
    match serde_json::from_value(value) {
        Ok(parsed) => *slot = parsed,
        Err(e) => warn!("Ignoring stored {}: {}", key, e),
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), SettingsError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// A partial change to the timer settings. Applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub work_time_minutes: Option<u32>,
    pub break_time_minutes: Option<u32>,
    pub long_break_minutes: Option<u32>,
    pub pomodoros_until_long_break: Option<u32>,
    pub warning_threshold: Option<f64>,
    pub auto_start_breaks: Option<bool>,
    pub auto_start_work: Option<bool>,
}

impl SettingsUpdate {
    /// Parses a `key=value` assignment, as accepted on the command line.
    pub fn set_from_str(&mut self, assignment: &str) -> Result<(), SettingsError> {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| SettingsError::UnknownField(assignment.to_string()))?;
        let key = key.trim();
        let raw = raw.trim();

        match key {
            "work_time_minutes" => self.work_time_minutes = Some(parse_minutes(key, raw)?),
            "break_time_minutes" => self.break_time_minutes = Some(parse_minutes(key, raw)?),
            "long_break_minutes" => self.long_break_minutes = Some(parse_minutes(key, raw)?),
            "pomodoros_until_long_break" => {
                self.pomodoros_until_long_break = Some(parse_minutes(key, raw)?)
            }
            "warning_threshold" => {
                self.warning_threshold = Some(raw.parse().map_err(|_| invalid(key, "number", raw))?)
            }
            "auto_start_breaks" => {
                self.auto_start_breaks = Some(raw.parse().map_err(|_| invalid(key, "boolean", raw))?)
            }
            "auto_start_work" => {
                self.auto_start_work = Some(raw.parse().map_err(|_| invalid(key, "boolean", raw))?)
            }
            other => return Err(SettingsError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the settings with this update applied, or the first validation
    /// error. The input is never modified.
    pub fn apply_to(&self, settings: &Settings) -> Result<Settings, SettingsError> {
        let mut next = settings.clone();
        if let Some(v) = self.work_time_minutes {
            next.work_time_minutes = v;
        }
        if let Some(v) = self.break_time_minutes {
            next.break_time_minutes = v;
        }
        if let Some(v) = self.long_break_minutes {
            next.long_break_minutes = v;
        }
        if let Some(v) = self.pomodoros_until_long_break {
            next.pomodoros_until_long_break = v;
        }
        if let Some(v) = self.warning_threshold {
            next.warning_threshold = v;
        }
        if let Some(v) = self.auto_start_breaks {
            next.auto_start_breaks = v;
        }
        if let Some(v) = self.auto_start_work {
            next.auto_start_work = v;
        }
        next.validate()?;
        Ok(next)
    }
}

fn parse_minutes(field: &str, raw: &str) -> Result<u32, SettingsError> {
    raw.parse().map_err(|_| invalid(field, "whole number", raw))
}

fn invalid(field: &str, expected: &'static str, raw: &str) -> SettingsError {
    SettingsError::InvalidValue {
        field: field.to_string(),
        expected,
        value: raw.to_string(),
    }
}
