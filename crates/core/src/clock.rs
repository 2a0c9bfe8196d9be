//! Elapsed-time tracking for the active round.

use std::time::Duration;

use tokio::time::Instant;

/// Pausable stopwatch measuring a round against the monotonic clock.
///
/// Time accumulates from real instants rather than counted ticks, so the
/// reading never drifts from wall-clock time; periodic ticks only refresh
/// whoever displays it.
#[derive(Debug, Clone, Default)]
pub struct RoundClock {
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl RoundClock {
    /// A stopped clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin accumulating. No-op when already running.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Stop accumulating and return the frozen reading.
    pub fn stop(&mut self) -> Duration {
        if let Some(started_at) = self.started_at.take() {
            self.accumulated += started_at.elapsed();
        }
        self.accumulated
    }

    /// Stop and return to zero.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = None;
    }

    /// Whether the clock is currently accumulating.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Current reading, live while running and frozen once stopped.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started_at) => self.accumulated + started_at.elapsed(),
            None => self.accumulated,
        }
    }
}
