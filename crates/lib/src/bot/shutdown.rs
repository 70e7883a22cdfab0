//! Cooperative shutdown: a watch flag flipped once, observed by the loop between steps.

use tokio::sync::watch;

/// Flips the shutdown flag.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

/// Observes the shutdown flag. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

/// Create a connected trigger/observer pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), Shutdown(rx))
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // send_replace works even when every receiver is gone.
        self.0.send_replace(true);
    }
}

impl Shutdown {
    /// An observer that never fires (one-shot commands, tests).
    pub fn never() -> Self {
        // Sender dropped untriggered: `triggered` pends forever.
        let (_, rx) = watch::channel(false);
        Self(rx)
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown has been triggered. Pends forever if the trigger is dropped untriggered.
    pub async fn triggered(&mut self) {
        let closed = self.0.wait_for(|v| *v).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, stopping after the current step");
}
