//! Timer tick loop and countdown formatting.

use crate::app::{App, Cue};
use crate::models::{Phase, RunState, Snapshot};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Message sent from the timer thread to the main thread.
#[derive(Debug, Clone)]
pub enum TimerMessage {
    /// A phase completed; play the cue before rendering the new state.
    Cue(Cue),
    /// Timer state has changed. Carries no state: a command may run between
    /// the tick and the render, so the receiver takes a fresh snapshot.
    StateChanged,
    /// Statistics could not be written after a completed work session.
    SaveFailed(String),
}

/// Locks the shared app. A panic while holding the lock leaves the state
/// consistent (every command completes before returning), so poisoning is
/// ignored.
pub fn lock_app(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ticks the app once per second while it is running and forwards the
/// results to the main thread. Returns when the receiver is gone.
///
/// The app lock is held for the whole tick, so ticks never overlap with each
/// other or with user commands.
pub fn run_timer_loop(app: Arc<Mutex<App>>, tx: Sender<TimerMessage>) {
    loop {
        thread::sleep(TICK_INTERVAL);

        let outcome = {
            let mut app = lock_app(&app);
            if !app.state().is_running() {
                continue;
            }
            app.tick()
        };

        let mut messages = Vec::with_capacity(3);
        if let Some(cue) = outcome.cue {
            messages.push(TimerMessage::Cue(cue));
        }
        if let Some(e) = outcome.save_error {
            messages.push(TimerMessage::SaveFailed(e.to_string()));
        }
        messages.push(TimerMessage::StateChanged);

        for message in messages {
            if tx.send(message).is_err() {
                debug!("Timer channel closed, stopping tick loop");
                return;
            }
        }
    }
}

/// Formats the tray title based on current timer state.
pub fn format_tray_title(snapshot: &Snapshot) -> String {
    let timer = &snapshot.timer;
    let icon = match (timer.run, timer.phase) {
        (RunState::Paused, _) => "⏸",
        (_, Phase::Work) => "🍅",
        (_, Phase::ShortBreak | Phase::LongBreak) => "☕",
    };

    // Breaks waiting to be started still show their length
    if timer.run == RunState::Idle
        && timer.phase == Phase::Work
        && timer.remaining_secs == timer.total_secs
    {
        return icon.to_string();
    }
    format!("{} {}", icon, format_time(timer.remaining_secs))
}

/// Formats time in MM:SS format. Minutes are not wrapped at 60.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Starts [`run_timer_loop`] on its own thread.
pub fn spawn_timer_loop(app: Arc<Mutex<App>>, tx: Sender<TimerMessage>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("timer".into())
        .spawn(move || run_timer_loop(app, tx))
        .map(|_| ())
        .map_err(|e| {
            error!("Could not start timer thread: {}", e);
            e
        })
}
