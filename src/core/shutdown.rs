//! Shutdown coordination
//!
//! Signal handlers feed a broadcast channel; long waits race against it so a
//! run can stop between admission decisions instead of being killed mid-call.

use std::time::Duration;
use tokio::sync::broadcast;

/// Coordinates graceful shutdown across the application
pub struct ShutdownCoordinator {
    pub shutdown_tx: broadcast::Sender<()>,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        (Self { shutdown_tx }, shutdown_rx)
    }

    /// Trigger shutdown
    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run a future with process signals wired to its shutdown receiver
    pub async fn guard<F, Fut, R, E>(future_fn: F) -> Result<R, E>
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = Result<R, E>>,
    {
        let (coordinator, shutdown_rx) = Self::new();
        setup_signal_handlers(coordinator.shutdown_tx.clone());
        future_fn(shutdown_rx).await
    }
}

/// Sleep for `duration` unless shutdown is signalled first
///
/// Returns `true` when the wait was cut short by a shutdown request. A closed
/// channel means nobody can request shutdown any more, so the full wait runs.
pub async fn wait_or_shutdown(duration: Duration, shutdown_rx: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        signal = shutdown_rx.recv() => match signal {
            Err(broadcast::error::RecvError::Closed) => {
                tokio::time::sleep(duration).await;
                false
            }
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => true,
        },
    }
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use tokio::signal::unix::{signal, SignalKind};
        let signal_count = Arc::new(AtomicUsize::new(0));
        let signals = [
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ];

        for kind in signals {
            let tx = shutdown_tx.clone();
            let sig_ctr = signal_count.clone();

            tokio::spawn(async move {
                if let Ok(mut sig) = signal(kind) {
                    while sig.recv().await.is_some() {
                        let prev = sig_ctr.fetch_add(1, Ordering::AcqRel);
                        let _ = tx.send(());
                        if prev >= 1 {
                            log::warn!("Second signal received; exiting without waiting");
                            std::process::exit(130);
                        }
                        log::warn!("Shutdown requested; stopping after the current admission decision");
                    }
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            let mut received = 0usize;
            while tokio::signal::ctrl_c().await.is_ok() {
                received += 1;
                let _ = shutdown_tx.send(());
                if received > 1 {
                    std::process::exit(130);
                }
            }
        });
    }
}
