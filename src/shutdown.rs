use tokio::sync::broadcast;
use tracing::warn;

use crate::controller::{RunLifecycle, StopReason};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;

/// Broadcast channel size for shutdown notifications (single signal fan-out).
const SHUTDOWN_CHANNEL_CAPACITY: usize = 1;

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    broadcast::channel::<()>(SHUTDOWN_CHANNEL_CAPACITY)
}

/// Turns Ctrl+C or SIGTERM into a stop request. The task ends once a stop
/// was accepted or when `shutdown_tx` fires; signals the run cannot react to
/// yet (pre-flight) are logged and the handler keeps listening.
pub fn setup_signal_stop_handler(
    shutdown_tx: &ShutdownSender,
    lifecycle: RunLifecycle,
) -> tokio::task::JoinHandle<()> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        loop {
            #[cfg(unix)]
            let stopped = tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = tokio::signal::ctrl_c() => lifecycle.request_stop(StopReason::Interrupted),
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => lifecycle.request_stop(StopReason::Interrupted),
            };

            #[cfg(not(unix))]
            let stopped = tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = tokio::signal::ctrl_c() => lifecycle.request_stop(StopReason::Interrupted),
            };

            if stopped {
                break;
            }
            warn!(
                "Stop signal ignored while the run is {:?}.",
                lifecycle.state()
            );
        }
    })
}
