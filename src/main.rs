//! Pomotimer - a tray Pomodoro timer.
//!
//! The timer, cycle and statistics live in the `pomotimer` library. This
//! binary renders them into a tray icon and menu, plays sounds and shows
//! notifications.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;
use muda::MenuEvent;
use tracing::{error, info, warn};
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

mod audio;
mod event;
mod menu;
mod notifications;
mod tray;

use audio::{AudioPlayer, Beep};
use event::EventResult;
use menu::MenuItems;
use pomotimer::app::{App, Cue, Outcome};
use pomotimer::clock::SystemClock;
use pomotimer::logging;
use pomotimer::models::Snapshot;
use pomotimer::persistence::{JsonFileStore, Paths};
use pomotimer::settings::SettingsUpdate;
use pomotimer::timer::{self, lock_app, TimerMessage};
use tray::IconKind;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "pomotimer", version, about = "A tray Pomodoro timer")]
struct Args {
    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Log to the console only
    #[arg(long)]
    no_log_file: bool,

    /// Directory for settings, statistics and logs
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Change a setting before starting, e.g. `--set work_time_minutes=50`
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

/// Application handler for the winit event loop.
struct Pomotimer {
    app: Arc<Mutex<App>>,
    tray: TrayIcon,
    icon: IconKind,
    menu_items: MenuItems,
    timer_rx: Receiver<TimerMessage>,
    audio: Option<AudioPlayer>,
}

impl Pomotimer {
    fn new(
        app: Arc<Mutex<App>>,
        tray: TrayIcon,
        icon: IconKind,
        menu_items: MenuItems,
        timer_rx: Receiver<TimerMessage>,
    ) -> Self {
        // Audio is created on the main thread to avoid Send issues
        let audio = match AudioPlayer::new() {
            Ok(player) => Some(player),
            Err(e) => {
                warn!("Audio unavailable: {}", e);
                None
            }
        };

        Self {
            app,
            tray,
            icon,
            menu_items,
            timer_rx,
            audio,
        }
    }

    fn render(&mut self, title: &str, snapshot: &Snapshot) {
        self.tray.set_title(Some(title));
        if let Err(e) = self.tray.set_tooltip(Some(menu::format_status(snapshot))) {
            warn!("Failed to update tooltip: {}", e);
        }

        let kind = IconKind {
            phase: snapshot.timer.phase,
            finishing: snapshot.finishing,
        };
        if kind != self.icon {
            match tray::phase_icon(kind) {
                Ok(icon) => {
                    if let Err(e) = self.tray.set_icon(Some(icon)) {
                        warn!("Failed to update icon: {}", e);
                    }
                    self.icon = kind;
                }
                Err(e) => warn!("{}", e),
            }
        }

        let settings = lock_app(&self.app).settings().clone();
        menu::update_menu_items(&self.menu_items, snapshot, &settings);
    }

    fn play_cue(&self, cue: Cue) {
        let settings = lock_app(&self.app).settings().clone();

        if settings.beep_enabled {
            if let Some(ref audio) = self.audio {
                let beep = Beep::from_settings(&settings);
                match cue {
                    Cue::Started { .. } => audio.play_start(beep),
                    Cue::WorkComplete { .. } | Cue::BreakComplete => audio.play_chime(beep),
                }
            }
        }

        if settings.notifications_enabled {
            match cue {
                Cue::WorkComplete {
                    completed_today,
                    next,
                    break_mins,
                } => notifications::notify_work_complete(completed_today, next, break_mins),
                Cue::BreakComplete => notifications::notify_break_complete(),
                Cue::Started { .. } => {}
            }
        }
    }

    fn report_save_failure(&self, message: String) {
        error!("Save failed: {}", message);
        notifications::notify_problem(format!("Could not save your data: {}", message));
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        if let Some(cue) = outcome.cue {
            self.play_cue(cue);
        }
        if let Some(e) = outcome.save_error {
            self.report_save_failure(e.to_string());
        }
        self.render_current();
    }

    /// Renders the app as it is now, not as a queued message saw it.
    fn render_current(&mut self) {
        let snapshot = lock_app(&self.app).snapshot();
        let title = timer::format_tray_title(&snapshot);
        self.render(&title, &snapshot);
    }

    fn process_timer_messages(&mut self) {
        let mut changed = false;
        // Process all pending timer messages
        while let Ok(msg) = self.timer_rx.try_recv() {
            match msg {
                TimerMessage::Cue(cue) => self.play_cue(cue),
                TimerMessage::SaveFailed(message) => self.report_save_failure(message),
                TimerMessage::StateChanged => changed = true,
            }
        }
        if changed {
            self.render_current();
        }
    }

    fn process_menu_events(&mut self, event_loop: &ActiveEventLoop) {
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            let result = {
                let mut app = lock_app(&self.app);
                event::dispatch(&mut app, event.id().as_ref())
            };

            match result {
                EventResult::Quit => {
                    info!("Quit requested");
                    event_loop.exit();
                    return;
                }
                EventResult::Updated(outcome) => self.apply_outcome(outcome),
                EventResult::Rejected(e) => {
                    notifications::notify_problem(e.to_string());
                    self.render_current();
                }
                EventResult::Continue => {}
            }
        }
    }
}

impl ApplicationHandler for Pomotimer {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Nothing to do on resume for a tray-only app
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + POLL_INTERVAL));

        // Process timer messages from the background thread
        self.process_timer_messages();

        // Process menu events
        self.process_menu_events(event_loop);
    }
}

fn settings_from_args(assignments: &[String]) -> Result<SettingsUpdate, Box<dyn std::error::Error>> {
    let mut update = SettingsUpdate::default();
    for assignment in assignments {
        update.set_from_str(assignment)?;
    }
    Ok(update)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let paths = Paths::resolve(args.data_dir.as_deref())?;
    let log_dir = if args.no_log_file {
        None
    } else {
        Some(paths.log_dir.as_path())
    };
    logging::init(args.debug, log_dir)?;
    info!("Starting Pomotimer {}", env!("CARGO_PKG_VERSION"));

    // Initialize app state
    let mut app = App::new(
        Box::new(JsonFileStore::new(&paths.config_file)),
        Box::new(JsonFileStore::new(&paths.stats_file)),
        Box::new(SystemClock),
    );

    let update = settings_from_args(&args.set)?;
    if !update.is_empty() {
        let outcome = app.update_settings(&update)?;
        if let Some(e) = outcome.save_error {
            warn!("Settings from the command line were not saved: {}", e);
        }
    }

    let snapshot = app.snapshot();
    let settings = app.settings().clone();
    let app = Arc::new(Mutex::new(app));

    // Create event loop (required for tray on macOS)
    let event_loop = EventLoop::new()?;

    let (built_menu, menu_items) = menu::build_menu(&snapshot, &settings)?;

    let icon_kind = IconKind {
        phase: snapshot.timer.phase,
        finishing: snapshot.finishing,
    };
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(built_menu))
        .with_icon(tray::phase_icon(icon_kind)?)
        .with_title(timer::format_tray_title(&snapshot))
        .with_tooltip("Pomotimer")
        .build()?;

    // Create channel for timer messages
    let (tx, rx) = mpsc::channel();
    timer::spawn_timer_loop(Arc::clone(&app), tx)?;

    let mut pomotimer = Pomotimer::new(app, tray, icon_kind, menu_items, rx);

    // Run event loop
    event_loop.run_app(&mut pomotimer)?;

    info!("Pomotimer stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "pomotimer",
            "--debug",
            "--set",
            "work_time_minutes=50",
            "--set",
            "auto_start_work=true",
        ]);
        assert!(args.debug);
        assert!(!args.no_log_file);
        assert_eq!(args.set.len(), 2);

        let update = settings_from_args(&args.set).unwrap();
        assert_eq!(update.work_time_minutes, Some(50));
        assert_eq!(update.auto_start_work, Some(true));
    }

    #[test]
    fn test_settings_from_args_rejects_unknown_key() {
        let args = vec!["colour=red".to_string()];
        assert!(settings_from_args(&args).is_err());
    }
}
