// Named timers owned by one battle view. Dropping or stopping them guarantees no further ticks.

use std::future;
use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// A fixed-period timer with an explicit start/stop lifecycle.
///
/// While stopped, [`PeriodicTask::tick`] never resolves, so it can sit in a `select!`
/// branch unconditionally.
pub struct PeriodicTask {
    name: &'static str,
    period: Duration,
    interval: Option<Interval>,
}

impl PeriodicTask {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            interval: None,
        }
    }

    /// Starts ticking one period from now. No-op when already running.
    pub fn start(&mut self) {
        if self.interval.is_some() {
            return;
        }
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        // Late ticks collapse into one instead of bursting.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
        debug!(
            task = self.name,
            period_ms = self.period.as_millis() as u64,
            "periodic task started"
        );
    }

    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            debug!(task = self.name, "periodic task stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Waits for the next tick and returns its scheduled instant.
    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(interval) => interval.tick().await,
            None => future::pending().await,
        }
    }
}

/// Deferred "off" transition: every restart pushes the deadline out by the full delay.
pub struct Debounce {
    name: &'static str,
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(name: &'static str, delay: Duration) -> Self {
        Self {
            name,
            delay,
            deadline: None,
        }
    }

    pub fn restart(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
        debug!(
            task = self.name,
            delay_ms = self.delay.as_millis() as u64,
            "debounce restarted"
        );
    }

    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            debug!(task = self.name, "debounce cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the armed deadline passes, disarming the debounce.
    /// Never resolves while disarmed.
    pub async fn expired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => future::pending().await,
        }
    }
}
