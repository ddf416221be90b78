//! User-facing progress and error messages.

use async_trait::async_trait;
use std::time::Duration;

/// Severity of a display update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayLevel {
    /// Progress; the operation continues.
    Continue,
    /// The operation stopped and the user should be told why.
    Abort,
}

/// Shows status messages and blocking countdowns to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Shows `message` at `level`.
    fn update_display(&self, level: DisplayLevel, message: &str);

    /// Shows `message` with the remaining time and returns once `wait` has elapsed.
    async fn countdown(&self, message: &str, wait: Duration);
}

/// A [`Notifier`] that reports through `tracing` and sleeps on the tokio timer.
///
/// The countdown logs the remaining time every `tick`.
#[derive(Debug, Clone)]
pub struct TracingNotifier {
    tick: Duration,
}

impl TracingNotifier {
    pub fn new() -> Self {
        Self {
            tick: Duration::from_secs(15),
        }
    }

    /// Sets how often the countdown reports the remaining time.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }
}

impl Default for TracingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    fn update_display(&self, level: DisplayLevel, message: &str) {
        match level {
            DisplayLevel::Continue => tracing::info!("{message}"),
            DisplayLevel::Abort => tracing::error!("{message}"),
        }
    }

    async fn countdown(&self, message: &str, wait: Duration) {
        let mut remaining = wait;
        while !remaining.is_zero() {
            tracing::info!(remaining_secs = remaining.as_secs(), "{message}{}", format_remaining(remaining));
            let step = remaining.min(self.tick);
            tokio::time::sleep(step).await;
            remaining -= step;
        }
    }
}

/// Formats a wait as `"M:SS"` for countdown messages.
fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
