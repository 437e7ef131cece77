//! Handles for periodic background tasks
//!
//! Every periodic unit runs on its own tokio task and watches a stop flag.
//! The flag is checked between iterations only, so a running arrival
//! sequence or lock hold always completes before the task exits.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Receiving side of a cooperative stop request
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once a stop has been requested or the handle is gone
    pub async fn stopped(&mut self) {
        // An error means the sender was dropped, which also ends the task
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    /// Wait for the next tick of `interval`; returns false when stopping instead
    pub async fn tick(&mut self, interval: &mut tokio::time::Interval) -> bool {
        if self.is_stopped() {
            return false;
        }
        let interrupted = tokio::select! {
            _ = interval.tick() => false,
            _ = self.stopped() => true,
        };
        !interrupted && !self.is_stopped()
    }
}

/// Owner of a spawned periodic task
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `body` on the tokio runtime with a fresh stop signal
    pub fn spawn<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(StopSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let (stop_tx, rx) = watch::channel(false);
        let join = tokio::spawn(body(StopSignal { rx }));
        tracing::info!("Task {} started", name);
        Self {
            name,
            stop_tx,
            join,
        }
    }

    /// Task name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the task to stop after its current iteration
    pub fn request_stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Whether the task has exited
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Request a stop and wait for the task to exit
    pub async fn stop(self) {
        self.request_stop();
        if let Err(e) = self.join.await {
            tracing::error!("Task {} ended abnormally: {}", self.name, e);
        } else {
            tracing::info!("Task {} stopped", self.name);
        }
    }
}

/// Build a tick interval that does not burst after a slow iteration
pub fn tick_interval(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval
}
