use tokio::sync::watch;

/// Cancellation token handed to the polling loop. Dropping every
/// [`ShutdownTrigger`] counts as a stop request, so a lost signal listener
/// can never leave the loop running without its sleep.
#[derive(Clone)]
pub struct Shutdown {
    stop_rx: watch::Receiver<bool>,
}

#[derive(Clone)]
pub struct ShutdownTrigger {
    stop_tx: watch::Sender<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (stop_tx, stop_rx) = watch::channel(false);
    (ShutdownTrigger { stop_tx }, Shutdown { stop_rx })
}

impl Shutdown {
    /// True once a stop was requested or no trigger is left to request one.
    pub fn is_triggered(&self) -> bool {
        *self.stop_rx.borrow() || self.stop_rx.has_changed().is_err()
    }

    pub async fn wait(mut self) {
        // Err means the sender side is gone, which is a stop as well
        let _ = self.stop_rx.wait_for(|stop| *stop).await;
    }
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Fires `trigger` on Ctrl-C, or SIGTERM on unix.
pub async fn stop_on_signal(trigger: ShutdownTrigger) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(target: "shutdown", error = %err, "SIGTERM handler unavailable, Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    let _ = tokio::signal::ctrl_c().await;

    tracing::info!(target: "shutdown", "🛑 stop signal received");
    trigger.trigger();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_returns_after_trigger() {
        let (trigger, shutdown) = channel();
        assert!(!shutdown.is_triggered());

        trigger.trigger();
        assert!(shutdown.is_triggered());

        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .expect("wait should resolve once triggered");
    }

    #[tokio::test]
    async fn dropped_trigger_counts_as_stop() {
        let (trigger, shutdown) = channel();
        drop(trigger);

        assert!(shutdown.is_triggered());
        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .expect("wait should resolve when the sender is gone");
    }

    #[tokio::test]
    async fn cloned_trigger_keeps_token_alive() {
        let (trigger, shutdown) = channel();
        let spare = trigger.clone();
        drop(trigger);

        assert!(!shutdown.is_triggered());
        spare.trigger();
        assert!(shutdown.is_triggered());
    }
}
