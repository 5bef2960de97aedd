//! Pomotimer core: the Pomodoro phase state machine, cycle counting,
//! persisted statistics and validated settings.
//!
//! The core never renders anything and never schedules itself. A
//! presentation layer owns an [`app::App`], calls [`app::App::tick`] once
//! per second while it runs (see [`timer::run_timer_loop`]) and re-renders
//! from the returned [`models::Snapshot`].

pub mod app;
pub mod clock;
pub mod cycle;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod settings;
pub mod stats;
pub mod timer;
