use anyhow::Result;
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::DueSignal;

/// Detects signals asking the process to stop. Returns once shutdown has been requested by any
/// means, including other parts of the tracker.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C");
            cancelation.cancel();
        },
        _ = terminate() => {
            info!("Received termination signal");
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}

async fn terminate() {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!("Can't listen for SIGTERM {e:?}");
                    std::future::pending::<()>().await;
                }
            }
        } else {
            std::future::pending::<()>().await;
        }
    }
}

/// Turns SIGUSR1 into [DueSignal::Manual]. This is what `quartercheck prompt` sends. Only
/// available on Unix, elsewhere the `:p` input command is the manual trigger.
pub async fn forward_manual_triggers(
    sender: mpsc::Sender<DueSignal>,
    cancelation: CancellationToken,
) -> Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use tokio::signal::unix::{signal, SignalKind};
            let mut triggers = signal(SignalKind::user_defined1())?;
            loop {
                select! {
                    _ = cancelation.cancelled() => return Ok(()),
                    received = triggers.recv() => {
                        if received.is_none() {
                            return Ok(());
                        }
                        info!("Received manual trigger");
                        if sender.send(DueSignal::Manual).await.is_err() {
                            return Ok(());
                        }
                    }
                }
            }
        } else {
            drop(sender);
            cancelation.cancelled().await;
            Ok(())
        }
    }
}
