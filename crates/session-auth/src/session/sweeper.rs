//! Background removal of expired sessions

use crate::session::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a task that sweeps a registry on a fixed cadence.
///
/// The task stops on [`SessionSweeper::shutdown`] and is aborted when the
/// handle is dropped.
pub struct SessionSweeper {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl SessionSweeper {
    /// Start sweeping `registry` every `interval`. Must be called within a tokio runtime.
    pub fn spawn(registry: Arc<SessionRegistry>, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            tracing::debug!(?interval, "Session sweeper started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        registry.sweep();
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Session sweeper stopped");
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SessionSweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
