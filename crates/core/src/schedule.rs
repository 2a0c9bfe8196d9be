//! Cancellable timed callbacks owned by a round.
//!
//! Callbacks never touch round state directly. They post an event onto the
//! channel drained by the single loop that owns the engine, so a callback
//! always runs between, never during, user-driven transitions.

use std::time::Duration;

use tokio::{
    runtime::Handle,
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

/// Handle to a spawned timer task. Cancelling or dropping it aborts the task.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Deliver `event` once after `delay`, timed on `runtime`.
    pub fn after<T>(
        runtime: &Handle,
        delay: Duration,
        sender: UnboundedSender<T>,
        event: T,
    ) -> Self
    where
        T: Send + 'static,
    {
        let handle = runtime.spawn(async move {
            time::sleep(delay).await;
            let _ = sender.send(event);
        });
        Self { handle }
    }

    /// Deliver an event built by `make` every `period`, starting one period from now.
    pub fn every<T, F>(
        runtime: &Handle,
        period: Duration,
        sender: UnboundedSender<T>,
        make: F,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if sender.send(make()).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Abort the task; an event it has not yet sent is never delivered.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{sync::mpsc, time::Instant};

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let rt = Handle::current();
        let started = Instant::now();
        let _task = ScheduledTask::after(&rt, Duration::from_millis(800), tx, "flip");

        assert_eq!(rx.recv().await, Some("flip"));
        assert!(started.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let rt = Handle::current();
        let task = ScheduledTask::after(&rt, Duration::from_millis(800), tx.clone(), 1);
        task.cancel();
        let _later = ScheduledTask::after(&rt, Duration::from_millis(1_000), tx, 2);

        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u8>();
        let rt = Handle::current();
        drop(ScheduledTask::after(&rt, Duration::from_millis(10), tx, 7));
        time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn repeats_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let rt = Handle::current();
        let ticker = ScheduledTask::every(&rt, Duration::from_millis(10), tx, || ());
        time::sleep(Duration::from_millis(35)).await;
        let mut ticks = 0;
        while rx.try_recv().is_ok() {
            ticks += 1;
        }
        assert!((2..=3).contains(&ticks), "unexpected tick count {ticks}");

        ticker.cancel();
        time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
