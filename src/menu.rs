//! Menu building and updating for the tray dropdown.

use muda::accelerator::Accelerator;
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use pomotimer::models::{Phase, RunState, Snapshot, TimerState};
use pomotimer::settings::Settings;
use pomotimer::timer::format_time;
use std::collections::BTreeMap;
use thiserror::Error;

// Menu item IDs as constants
pub const ID_STATUS: &str = "status";
pub const ID_PROGRESS: &str = "progress";
pub const ID_CYCLE: &str = "cycle";
pub const ID_TODAY: &str = "today";
pub const ID_WEEK: &str = "week";
pub const ID_TOTALS: &str = "totals";
pub const ID_START: &str = "start";
pub const ID_PAUSE: &str = "pause";
pub const ID_RESUME: &str = "resume";
pub const ID_RESET: &str = "reset";
pub const ID_SKIP: &str = "skip";
pub const ID_NEW_SESSION: &str = "new_session";
pub const ID_AUTO_BREAKS_TOGGLE: &str = "auto_breaks_toggle";
pub const ID_AUTO_WORK_TOGGLE: &str = "auto_work_toggle";
pub const ID_SOUND_TOGGLE: &str = "sound_toggle";
pub const ID_NOTIF_TOGGLE: &str = "notif_toggle";
pub const ID_QUIT: &str = "quit";

// Prefixes of the preset items in the settings submenus
pub const PREFIX_WORK: &str = "work_";
pub const PREFIX_SHORT: &str = "short_";
pub const PREFIX_LONG: &str = "long_";
pub const PREFIX_CYCLE: &str = "cycle_";

const WORK_PRESETS: [u32; 6] = [15, 20, 25, 30, 45, 60];
const SHORT_PRESETS: [u32; 4] = [3, 5, 10, 15];
const LONG_PRESETS: [u32; 4] = [10, 15, 20, 30];
const CYCLE_PRESETS: [u32; 5] = [2, 3, 4, 5, 6];

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu error: {0}")]
    Muda(#[from] muda::Error),
}

/// A submenu of mutually exclusive presets.
pub struct PresetMenu {
    pub submenu: Submenu,
    pub checks: BTreeMap<u32, CheckMenuItem>,
}

impl PresetMenu {
    fn build(prefix: &str, presets: &[u32], unit: &str, current: u32) -> Result<Self, MenuError> {
        let submenu = Submenu::new("", true);
        let mut checks = BTreeMap::new();
        for &value in presets {
            let item = CheckMenuItem::with_id(
                MenuId::new(format!("{}{}", prefix, value)),
                format!("{} {}", value, unit),
                true,
                value == current,
                None::<Accelerator>,
            );
            submenu.append(&item)?;
            checks.insert(value, item);
        }
        Ok(Self { submenu, checks })
    }

    fn sync(&self, title: String, current: u32, enabled: bool) {
        self.submenu.set_text(title);
        self.submenu.set_enabled(enabled);
        for (&value, check) in &self.checks {
            check.set_checked(value == current);
        }
    }
}

/// Holds references to menu items that need dynamic updates.
pub struct MenuItems {
    pub status: MenuItem,
    pub progress: MenuItem,
    pub cycle: MenuItem,
    pub today: MenuItem,
    pub week: MenuItem,
    pub totals: MenuItem,
    pub start: MenuItem,
    pub pause: MenuItem,
    pub resume: MenuItem,
    pub reset: MenuItem,
    pub skip: MenuItem,
    pub new_session: MenuItem,
    pub work: PresetMenu,
    pub short_break: PresetMenu,
    pub long_break: PresetMenu,
    pub cycle_length: PresetMenu,
    pub auto_breaks_toggle: CheckMenuItem,
    pub auto_work_toggle: CheckMenuItem,
    pub sound_toggle: CheckMenuItem,
    pub notif_toggle: CheckMenuItem,
}

fn info_item(id: &str) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), "", false, None::<Accelerator>)
}

fn command_item(id: &str, text: &str) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), text, true, None::<Accelerator>)
}

fn toggle_item(id: &str, text: &str, checked: bool) -> CheckMenuItem {
    CheckMenuItem::with_id(MenuId::new(id), text, true, checked, None::<Accelerator>)
}

/// Builds the complete menu structure.
pub fn build_menu(snapshot: &Snapshot, settings: &Settings) -> Result<(Menu, MenuItems), MenuError> {
    let menu = Menu::new();

    let status = info_item(ID_STATUS);
    let progress = info_item(ID_PROGRESS);
    let cycle = info_item(ID_CYCLE);
    menu.append(&status)?;
    menu.append(&progress)?;
    menu.append(&cycle)?;
    menu.append(&PredefinedMenuItem::separator())?;

    let today = info_item(ID_TODAY);
    let week = info_item(ID_WEEK);
    let totals = info_item(ID_TOTALS);
    menu.append(&today)?;
    menu.append(&week)?;
    menu.append(&totals)?;
    menu.append(&PredefinedMenuItem::separator())?;

    // Control buttons
    let start = command_item(ID_START, "▶  Start");
    let pause = command_item(ID_PAUSE, "⏸  Pause");
    let resume = command_item(ID_RESUME, "▶  Resume");
    let reset = command_item(ID_RESET, "⏹  Reset");
    let skip = command_item(ID_SKIP, "⏭  Skip");
    menu.append(&start)?;
    menu.append(&pause)?;
    menu.append(&resume)?;
    menu.append(&reset)?;
    menu.append(&skip)?;
    menu.append(&PredefinedMenuItem::separator())?;

    // Settings submenu
    let settings_menu = Submenu::new("⚙  Settings", true);
    let work = PresetMenu::build(PREFIX_WORK, &WORK_PRESETS, "min", settings.work_time_minutes)?;
    let short_break = PresetMenu::build(
        PREFIX_SHORT,
        &SHORT_PRESETS,
        "min",
        settings.break_time_minutes,
    )?;
    let long_break =
        PresetMenu::build(PREFIX_LONG, &LONG_PRESETS, "min", settings.long_break_minutes)?;
    let cycle_length = PresetMenu::build(
        PREFIX_CYCLE,
        &CYCLE_PRESETS,
        "pomodoros",
        settings.pomodoros_until_long_break,
    )?;
    settings_menu.append(&work.submenu)?;
    settings_menu.append(&short_break.submenu)?;
    settings_menu.append(&long_break.submenu)?;
    settings_menu.append(&cycle_length.submenu)?;
    settings_menu.append(&PredefinedMenuItem::separator())?;

    let auto_breaks_toggle = toggle_item(
        ID_AUTO_BREAKS_TOGGLE,
        "Auto-start Breaks",
        settings.auto_start_breaks,
    );
    let auto_work_toggle = toggle_item(
        ID_AUTO_WORK_TOGGLE,
        "Auto-start Work",
        settings.auto_start_work,
    );
    let sound_toggle = toggle_item(ID_SOUND_TOGGLE, "Sound Enabled", settings.beep_enabled);
    let notif_toggle = toggle_item(
        ID_NOTIF_TOGGLE,
        "Notifications Enabled",
        settings.notifications_enabled,
    );
    settings_menu.append(&auto_breaks_toggle)?;
    settings_menu.append(&auto_work_toggle)?;
    settings_menu.append(&PredefinedMenuItem::separator())?;
    settings_menu.append(&sound_toggle)?;
    settings_menu.append(&notif_toggle)?;
    menu.append(&settings_menu)?;

    let new_session = command_item(ID_NEW_SESSION, "↺  New Session");
    menu.append(&new_session)?;
    menu.append(&PredefinedMenuItem::separator())?;

    let quit = command_item(ID_QUIT, "Quit Pomotimer");
    menu.append(&quit)?;

    let items = MenuItems {
        status,
        progress,
        cycle,
        today,
        week,
        totals,
        start,
        pause,
        resume,
        reset,
        skip,
        new_session,
        work,
        short_break,
        long_break,
        cycle_length,
        auto_breaks_toggle,
        auto_work_toggle,
        sound_toggle,
        notif_toggle,
    };
    update_menu_items(&items, snapshot, settings);

    Ok((menu, items))
}

/// Updates the menu items based on the current state.
pub fn update_menu_items(items: &MenuItems, snapshot: &Snapshot, settings: &Settings) {
    let timer = &snapshot.timer;

    // Update text items
    items.status.set_text(format_status(snapshot));
    items.progress.set_text(format_progress(timer));
    items.cycle.set_text(format_cycle(snapshot));
    items.today.set_text(format_today(snapshot));
    items.week.set_text(format_week(snapshot));
    items.totals.set_text(format_totals(snapshot));

    // Update enabled states
    items.start.set_enabled(timer.is_idle());
    items.pause.set_enabled(timer.is_running());
    items.resume.set_enabled(timer.is_paused());
    items.reset.set_enabled(!is_fresh(timer));
    items.skip.set_enabled(!timer.is_idle());

    // Timer settings only change while idle
    let editable = timer.is_idle();
    items.work.sync(
        format!("Work: {} min", settings.work_time_minutes),
        settings.work_time_minutes,
        editable,
    );
    items.short_break.sync(
        format!("Short Break: {} min", settings.break_time_minutes),
        settings.break_time_minutes,
        editable,
    );
    items.long_break.sync(
        format!("Long Break: {} min", settings.long_break_minutes),
        settings.long_break_minutes,
        editable,
    );
    items.cycle_length.sync(
        format!(
            "Long Break After: {} pomodoros",
            settings.pomodoros_until_long_break
        ),
        settings.pomodoros_until_long_break,
        editable,
    );
    items.auto_breaks_toggle.set_checked(settings.auto_start_breaks);
    items.auto_breaks_toggle.set_enabled(editable);
    items.auto_work_toggle.set_checked(settings.auto_start_work);
    items.auto_work_toggle.set_enabled(editable);
    items.sound_toggle.set_checked(settings.beep_enabled);
    items.notif_toggle.set_checked(settings.notifications_enabled);
}

/// True for an idle work phase with nothing elapsed.
fn is_fresh(timer: &TimerState) -> bool {
    timer.is_idle() && timer.phase == Phase::Work && timer.remaining_secs == timer.total_secs
}

/// Formats the status line for the menu.
pub fn format_status(snapshot: &Snapshot) -> String {
    let timer = &snapshot.timer;
    let time = format_time(timer.remaining_secs);
    match (timer.run, timer.phase) {
        (RunState::Idle, Phase::Work) => "Ready to focus".to_string(),
        (RunState::Idle, phase) => format!("Up next: {} ({})", phase.label(), time),
        (RunState::Paused, _) => format!("⏸  {} (paused)", time),
        (RunState::Running, Phase::Work) if snapshot.finishing => {
            format!("🔥  {} remaining", time)
        }
        (RunState::Running, Phase::Work) => format!("⏱  {} remaining", time),
        (RunState::Running, phase) => format!("☕  {} - {}", phase.label(), time),
    }
}

/// Formats the progress bar for the menu.
pub fn format_progress(timer: &TimerState) -> String {
    let pct = timer.progress_percent().clamp(0.0, 1.0);
    let filled = (pct * 20.0).round() as usize;
    let empty = 20 - filled;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(empty),
        (pct * 100.0).round() as u32
    )
}

/// Formats the cycle position as dots, e.g. `Cycle ●●○○ 2/4`.
pub fn format_cycle(snapshot: &Snapshot) -> String {
    let done = snapshot.position_in_cycle.min(snapshot.cycle_length) as usize;
    let open = snapshot.cycle_length as usize - done;
    format!(
        "Cycle {}{} {}/{}  •  Session {}",
        "●".repeat(done),
        "○".repeat(open),
        snapshot.position_in_cycle,
        snapshot.cycle_length,
        snapshot.completed_work_sessions
    )
}

/// Formats today's stats for the menu.
pub fn format_today(snapshot: &Snapshot) -> String {
    let count = snapshot.today.pomodoros;
    if count == 0 {
        return "Today: —  0 (0 min)".to_string();
    }

    let tomatoes = "🍅".repeat(count.min(10) as usize);
    let extra = if count > 10 {
        format!("+{}", count - 10)
    } else {
        String::new()
    };
    format!(
        "Today: {}{}  {} ({} min)",
        tomatoes, extra, count, snapshot.today.minutes
    )
}

pub fn format_week(snapshot: &Snapshot) -> String {
    format!(
        "This week: {} ({} min)",
        snapshot.week.pomodoros, snapshot.week.minutes
    )
}

pub fn format_totals(snapshot: &Snapshot) -> String {
    let totals = &snapshot.totals;
    if totals.streak_days > 0 {
        format!(
            "Total: {}  •  Streak: {}d",
            totals.total_pomodoros, totals.streak_days
        )
    } else {
        format!("Total: {}", totals.total_pomodoros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomotimer::models::{PeriodStats, TotalStats};

    fn snapshot(timer: TimerState) -> Snapshot {
        Snapshot {
            timer,
            finishing: false,
            completed_work_sessions: 0,
            position_in_cycle: 0,
            cycle_length: 4,
            today: PeriodStats::default(),
            week: PeriodStats::default(),
            totals: TotalStats::default(),
        }
    }

    fn running(phase: Phase, remaining_secs: u32, total_secs: u32) -> TimerState {
        TimerState {
            phase,
            remaining_secs,
            total_secs,
            run: RunState::Running,
        }
    }

    #[test]
    fn test_format_status_idle() {
        let snap = snapshot(TimerState::new(1500));
        assert_eq!(format_status(&snap), "Ready to focus");
    }

    #[test]
    fn test_format_status_upcoming_break() {
        let snap = snapshot(TimerState::idle(Phase::ShortBreak, 300));
        assert_eq!(format_status(&snap), "Up next: Short break (05:00)");
    }

    #[test]
    fn test_format_status_work_running() {
        let snap = snapshot(running(Phase::Work, 1432, 1500));
        assert_eq!(format_status(&snap), "⏱  23:52 remaining");
    }

    #[test]
    fn test_format_status_finishing() {
        let mut snap = snapshot(running(Phase::Work, 60, 1500));
        snap.finishing = true;
        assert_eq!(format_status(&snap), "🔥  01:00 remaining");
    }

    #[test]
    fn test_format_status_paused() {
        let mut timer = running(Phase::Work, 600, 1500);
        timer.run = RunState::Paused;
        assert_eq!(format_status(&snapshot(timer)), "⏸  10:00 (paused)");
    }

    #[test]
    fn test_format_status_breaks() {
        let short = snapshot(running(Phase::ShortBreak, 180, 300));
        assert_eq!(format_status(&short), "☕  Short break - 03:00");
        let long = snapshot(running(Phase::LongBreak, 600, 900));
        assert_eq!(format_status(&long), "☕  Long break - 10:00");
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(
            format_progress(&TimerState::new(1500)),
            "░░░░░░░░░░░░░░░░░░░░  0%"
        );
        assert_eq!(
            format_progress(&running(Phase::Work, 750, 1500)),
            "██████████░░░░░░░░░░  50%"
        );
        assert_eq!(
            format_progress(&running(Phase::Work, 0, 1500)),
            "████████████████████  100%"
        );
    }

    #[test]
    fn test_format_cycle() {
        let mut snap = snapshot(TimerState::new(1500));
        snap.position_in_cycle = 2;
        snap.completed_work_sessions = 6;
        assert_eq!(format_cycle(&snap), "Cycle ●●○○ 2/4  •  Session 6");
    }

    #[test]
    fn test_format_today() {
        let mut snap = snapshot(TimerState::new(1500));
        assert_eq!(format_today(&snap), "Today: —  0 (0 min)");

        snap.today = PeriodStats {
            pomodoros: 4,
            minutes: 100,
        };
        assert_eq!(format_today(&snap), "Today: 🍅🍅🍅🍅  4 (100 min)");

        snap.today = PeriodStats {
            pomodoros: 15,
            minutes: 375,
        };
        let result = format_today(&snap);
        assert!(result.contains("+5"));
        assert!(result.contains("375 min"));
    }

    #[test]
    fn test_format_totals() {
        let mut snap = snapshot(TimerState::new(1500));
        assert_eq!(format_totals(&snap), "Total: 0");

        snap.totals = TotalStats {
            total_pomodoros: 42,
            total_work_minutes: 1050,
            streak_days: 3,
        };
        assert_eq!(format_totals(&snap), "Total: 42  •  Streak: 3d");
        snap.week = PeriodStats {
            pomodoros: 7,
            minutes: 175,
        };
        assert_eq!(format_week(&snap), "This week: 7 (175 min)");
    }

    #[test]
    fn test_is_fresh() {
        assert!(is_fresh(&TimerState::new(1500)));
        assert!(!is_fresh(&TimerState::idle(Phase::ShortBreak, 300)));
        assert!(!is_fresh(&running(Phase::Work, 1500, 1500)));
    }
}
