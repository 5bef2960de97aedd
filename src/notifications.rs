//! Desktop notifications for timer events.

use notify_rust::Notification;
use pomotimer::models::Phase;
use std::thread;
use tracing::warn;

/// Shows a notification when a work session is completed.
/// Runs in a background thread to avoid blocking.
pub fn notify_work_complete(completed_today: u32, next: Phase, break_mins: u32) {
    let (summary, body) = work_complete_text(completed_today, next, break_mins);
    show(summary, body);
}

/// Shows a notification when a break is completed.
pub fn notify_break_complete() {
    show(
        "Break Over! ☕".to_string(),
        "Ready to start another pomodoro?".to_string(),
    );
}

/// Surfaces a problem the user should know about, such as a rejected
/// settings change or a failed save.
pub fn notify_problem(message: String) {
    show("Pomotimer".to_string(), message);
}

fn show(summary: String, body: String) {
    thread::spawn(move || {
        if let Err(e) = Notification::new()
            .summary(&summary)
            .body(&body)
            .sound_name("default")
            .show()
        {
            warn!("Failed to show notification: {}", e);
        }
    });
}

fn work_complete_text(completed_today: u32, next: Phase, break_mins: u32) -> (String, String) {
    if next == Phase::LongBreak {
        return (
            "Long Break Time! 🎉".to_string(),
            format!(
                "You've earned a {} minute break. Great job staying focused!",
                break_mins
            ),
        );
    }

    let body = if completed_today == 1 {
        "Great work! You've completed 1 pomodoro today.\nTime for a break.".to_string()
    } else {
        format!(
            "Great work! You've completed {} pomodoros today.\nTime for a break.",
            completed_today
        )
    };
    ("Pomodoro Complete! 🍅".to_string(), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_complete_text_singular() {
        let (summary, body) = work_complete_text(1, Phase::ShortBreak, 5);
        assert_eq!(summary, "Pomodoro Complete! 🍅");
        assert!(body.contains("1 pomodoro today"));
    }

    #[test]
    fn test_work_complete_text_plural() {
        let (_, body) = work_complete_text(5, Phase::ShortBreak, 5);
        assert!(body.contains("5 pomodoros today"));
    }

    #[test]
    fn test_work_complete_text_long_break() {
        let (summary, body) = work_complete_text(4, Phase::LongBreak, 15);
        assert_eq!(summary, "Long Break Time! 🎉");
        assert!(body.contains("15 minute break"));
    }

    // Notification tests interact with the system and may hang waiting for
    // user interaction. Run with `cargo test -- --ignored` to execute them.

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_work_notification() {
        notify_work_complete(1, Phase::ShortBreak, 5);
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_break_notification() {
        notify_break_complete();
    }
}
