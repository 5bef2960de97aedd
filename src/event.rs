//! Menu event handling.

use crate::menu::{
    ID_AUTO_BREAKS_TOGGLE, ID_AUTO_WORK_TOGGLE, ID_NEW_SESSION, ID_NOTIF_TOGGLE, ID_PAUSE,
    ID_QUIT, ID_RESET, ID_RESUME, ID_SKIP, ID_SOUND_TOGGLE, ID_START, PREFIX_CYCLE, PREFIX_LONG,
    PREFIX_SHORT, PREFIX_WORK,
};
use pomotimer::app::{App, Outcome};
use pomotimer::settings::{SettingsError, SettingsUpdate};

/// Result of handling a menu event.
#[derive(Debug)]
pub enum EventResult {
    /// Nothing to do (unknown or informational item).
    Continue,
    /// User requested quit.
    Quit,
    /// A command ran; re-render from the outcome.
    Updated(Outcome),
    /// A settings change was refused. The menu must be resynced so the
    /// clicked checkmark reverts.
    Rejected(SettingsError),
}

/// Maps a menu item ID to an app command.
pub fn dispatch(app: &mut App, id: &str) -> EventResult {
    match id {
        ID_START => EventResult::Updated(app.start()),
        ID_PAUSE => EventResult::Updated(app.pause()),
        ID_RESUME => EventResult::Updated(app.resume()),
        ID_RESET => EventResult::Updated(app.reset()),
        ID_SKIP => EventResult::Updated(app.skip()),
        ID_NEW_SESSION => EventResult::Updated(app.reset_session()),
        ID_SOUND_TOGGLE => {
            let enabled = !app.settings().beep_enabled;
            EventResult::Updated(app.set_beep_enabled(enabled))
        }
        ID_NOTIF_TOGGLE => {
            let enabled = !app.settings().notifications_enabled;
            EventResult::Updated(app.set_notifications_enabled(enabled))
        }
        ID_AUTO_BREAKS_TOGGLE => apply(
            app,
            SettingsUpdate {
                auto_start_breaks: Some(!app.settings().auto_start_breaks),
                ..SettingsUpdate::default()
            },
        ),
        ID_AUTO_WORK_TOGGLE => apply(
            app,
            SettingsUpdate {
                auto_start_work: Some(!app.settings().auto_start_work),
                ..SettingsUpdate::default()
            },
        ),
        ID_QUIT => EventResult::Quit,
        _ => match preset_update(id) {
            Some(update) => apply(app, update),
            None => EventResult::Continue,
        },
    }
}

fn apply(app: &mut App, update: SettingsUpdate) -> EventResult {
    match app.update_settings(&update) {
        Ok(outcome) => EventResult::Updated(outcome),
        Err(e) => EventResult::Rejected(e),
    }
}

/// Parses a preset item ID such as `work_30` into a settings update.
fn preset_update(id: &str) -> Option<SettingsUpdate> {
    let mut update = SettingsUpdate::default();
    if let Some(mins) = id.strip_prefix(PREFIX_WORK) {
        update.work_time_minutes = Some(mins.parse().ok()?);
    } else if let Some(mins) = id.strip_prefix(PREFIX_SHORT) {
        update.break_time_minutes = Some(mins.parse().ok()?);
    } else if let Some(mins) = id.strip_prefix(PREFIX_LONG) {
        update.long_break_minutes = Some(mins.parse().ok()?);
    } else if let Some(count) = id.strip_prefix(PREFIX_CYCLE) {
        update.pomodoros_until_long_break = Some(count.parse().ok()?);
    } else {
        return None;
    }
    Some(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pomotimer::clock::FixedClock;
    use pomotimer::models::Phase;
    use pomotimer::persistence::MemoryStore;

    fn create_test_app() -> App {
        App::new(
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
            Box::new(FixedClock::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())),
        )
    }

    #[test]
    fn test_controls() {
        let mut app = create_test_app();
        assert!(matches!(dispatch(&mut app, ID_START), EventResult::Updated(_)));
        assert!(app.state().is_running());

        dispatch(&mut app, ID_PAUSE);
        assert!(app.state().is_paused());
        dispatch(&mut app, ID_RESUME);
        assert!(app.state().is_running());

        dispatch(&mut app, ID_SKIP);
        assert_eq!(app.state().phase, Phase::ShortBreak);
        dispatch(&mut app, ID_RESET);
        assert_eq!(app.state().phase, Phase::Work);
        assert!(app.state().is_idle());
    }

    #[test]
    fn test_quit_and_unknown() {
        let mut app = create_test_app();
        assert!(matches!(dispatch(&mut app, ID_QUIT), EventResult::Quit));
        assert!(matches!(dispatch(&mut app, "status"), EventResult::Continue));
        assert!(matches!(dispatch(&mut app, "work_abc"), EventResult::Continue));
    }

    #[test]
    fn test_work_preset() {
        let mut app = create_test_app();
        match dispatch(&mut app, "work_45") {
            EventResult::Updated(outcome) => {
                assert_eq!(outcome.snapshot.timer.remaining_secs, 45 * 60)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(app.settings().work_time_minutes, 45);
    }

    #[test]
    fn test_break_and_cycle_presets() {
        let mut app = create_test_app();
        dispatch(&mut app, "short_10");
        dispatch(&mut app, "long_30");
        dispatch(&mut app, "cycle_2");
        assert_eq!(app.settings().break_time_minutes, 10);
        assert_eq!(app.settings().long_break_minutes, 30);
        assert_eq!(app.settings().pomodoros_until_long_break, 2);
    }

    #[test]
    fn test_preset_rejected_while_running() {
        let mut app = create_test_app();
        dispatch(&mut app, ID_START);
        assert!(matches!(
            dispatch(&mut app, "work_15"),
            EventResult::Rejected(SettingsError::TimerActive)
        ));
        assert_eq!(app.settings().work_time_minutes, 25);
        assert!(app.state().is_running());
    }

    #[test]
    fn test_toggles() {
        let mut app = create_test_app();
        dispatch(&mut app, ID_START);

        // Cue preferences work while running
        dispatch(&mut app, ID_SOUND_TOGGLE);
        dispatch(&mut app, ID_NOTIF_TOGGLE);
        assert!(!app.settings().beep_enabled);
        assert!(!app.settings().notifications_enabled);

        // Auto-start flags are timer settings
        assert!(matches!(
            dispatch(&mut app, ID_AUTO_WORK_TOGGLE),
            EventResult::Rejected(_)
        ));
        dispatch(&mut app, ID_RESET);
        dispatch(&mut app, ID_AUTO_WORK_TOGGLE);
        dispatch(&mut app, ID_AUTO_BREAKS_TOGGLE);
        assert!(app.settings().auto_start_work);
        assert!(!app.settings().auto_start_breaks);
    }

    #[test]
    fn test_new_session_clears_cycle() {
        let mut app = create_test_app();
        dispatch(&mut app, "work_1");
        dispatch(&mut app, ID_START);
        for _ in 0..60 {
            app.tick();
        }
        assert_eq!(app.completed_work_sessions(), 1);

        dispatch(&mut app, ID_NEW_SESSION);
        assert_eq!(app.completed_work_sessions(), 0);
        assert_eq!(app.stats().total_stats().total_pomodoros, 1);
    }
}
