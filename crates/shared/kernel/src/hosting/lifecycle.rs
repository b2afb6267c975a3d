use std::sync::Arc;
use tokio::sync::watch;

/// Observable phase of the running host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    Starting,
    Running,
    /// Shutdown was requested; health reports failure from here on.
    Stopping,
}

/// Cheap-to-clone handle on the host phase.
///
/// Every clone observes and drives the same phase. Transitions only move forward:
/// `Starting → Running → Stopping`.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<HostPhase>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self { tx: Arc::new(watch::Sender::new(HostPhase::Starting)) }
    }

    #[must_use]
    pub fn phase(&self) -> HostPhase {
        *self.tx.borrow()
    }

    /// Marks the host as serving. No-op unless currently `Starting`.
    pub fn set_running(&self) -> bool {
        self.tx.send_if_modified(|phase| {
            if *phase == HostPhase::Starting {
                *phase = HostPhase::Running;
                true
            } else {
                false
            }
        })
    }

    /// Requests shutdown. Returns `true` only for the call that made the transition.
    pub fn stop(&self) -> bool {
        self.tx.send_if_modified(|phase| {
            if *phase == HostPhase::Stopping {
                false
            } else {
                *phase = HostPhase::Stopping;
                true
            }
        })
    }

    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.phase() == HostPhase::Stopping
    }

    /// Resolves once shutdown has been requested.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so waiting cannot fail.
        let _ = rx.wait_for(|phase| *phase == HostPhase::Stopping).await;
    }
}
