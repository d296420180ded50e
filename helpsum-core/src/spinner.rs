//! The "thinking" status line shown while the model is working.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// A background-animated spinner on stderr.
///
/// Rendering happens on indicatif's steady-tick thread; the primary flow only
/// ever flips the finished flag. Stop is idempotent: no frame is rendered
/// after the first stop.
#[derive(Clone)]
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Begins rendering at a fixed interval on the tick thread.
    pub fn start(&self) {
        self.bar.enable_steady_tick(TICK_INTERVAL);
    }

    /// A spinner that never draws. Used by tests to observe lifecycle
    /// transitions without touching the terminal.
    pub fn hidden(message: &str) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Clears the status line and stops the tick thread. Safe to call more
    /// than once; only the first call has an effect.
    pub fn stop(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.bar.is_finished()
    }

    /// Scoped handle that guarantees the spinner is stopped when dropped,
    /// whatever path control flow takes out of the enclosing block.
    pub fn guard(&self) -> SpinnerGuard {
        SpinnerGuard {
            spinner: self.clone(),
        }
    }
}

pub struct SpinnerGuard {
    spinner: Spinner,
}

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        self.spinner.stop();
    }
}
