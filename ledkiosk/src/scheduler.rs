//! Fixed-delay poll scheduler
//!
//! One spawned task runs the cycle, waits for it to settle, then sleeps for
//! the poll interval. A cycle never overlaps the next one, whatever its
//! duration, and a restart waits for the cycle the stopped loop still has
//! in flight. Cancellation only interrupts the sleep: a cycle already in
//! flight runs to completion.

use crate::pipeline::Cycle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives a [`Cycle`] at a fixed delay until stopped
pub struct PollScheduler {
    cycle: Arc<dyn Cycle>,
    interval: Duration,
    // Held for the duration of each cycle, across restarts
    gate: Arc<Mutex<()>>,
    running: Option<Running>,
}

struct Running {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollScheduler {
    pub fn new(cycle: Arc<dyn Cycle>, interval: Duration) -> Self {
        Self {
            cycle,
            interval,
            gate: Arc::new(Mutex::new(())),
            running: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts ticking; the first cycle runs immediately
    ///
    /// Does nothing if already running.
    pub fn start(&mut self) {
        if self.is_running() {
            info!("Poll scheduler already running");
            return;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            self.cycle.clone(),
            self.interval,
            self.gate.clone(),
            token.clone(),
        ));
        self.running = Some(Running { token, handle });
        info!(interval_ms = self.interval.as_millis() as u64, "⏱️ Poll scheduler started");
    }

    /// Cancels every future tick
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.token.cancel();
            info!("Poll scheduler stopped");
        }
    }

    /// Stops and waits for the in-flight cycle, if any, to settle
    pub async fn shutdown(&mut self) {
        if let Some(running) = self.running.take() {
            running.token.cancel();
            let _ = running.handle.await;
            info!("Poll scheduler shut down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.token.is_cancelled() && !r.handle.is_finished())
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.token.cancel();
        }
    }
}

async fn run_loop(
    cycle: Arc<dyn Cycle>,
    interval: Duration,
    gate: Arc<Mutex<()>>,
    token: CancellationToken,
) {
    loop {
        {
            let _running = gate.lock().await;
            if token.is_cancelled() {
                break;
            }
            match cycle.run_cycle().await {
                Ok(outcome) => debug!(outcome = outcome.label(), "Cycle completed"),
                Err(e) => warn!(kind = e.label(), "Cycle failed: {}", e),
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Poll loop exited");
}
