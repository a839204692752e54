use std::time::Duration;

use anyhow::Result;
use chrono::Timelike;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::utils::clock::Clock;

use super::DueSignal;

pub const INTERVAL_MINUTES: u32 = 15;

/// Pause after each signal so the same boundary can't fire twice.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Seconds until the next quarter hour. Anything within a boundary minute counts as being on the
/// boundary.
pub fn seconds_until_boundary(now: &impl Timelike) -> u64 {
    let minutes = now.minute() % INTERVAL_MINUTES;
    if minutes == 0 {
        return 0;
    }
    u64::from((INTERVAL_MINUTES - minutes) * 60 - now.second())
}

/// Emits [DueSignal::Scheduled] on every quarter hour of the wall clock.
pub struct QuarterHourTimer {
    next: mpsc::Sender<DueSignal>,
    shutdown: CancellationToken,
    cooldown: Duration,
    clock: Box<dyn Clock>,
}

impl QuarterHourTimer {
    pub fn new(
        next: mpsc::Sender<DueSignal>,
        shutdown: CancellationToken,
        cooldown: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            shutdown,
            cooldown,
            clock,
        }
    }

    /// Sleeps through `duration` unless shutdown comes first. Returns whether to keep going.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.cancelled() => false,
            _ = self.clock.sleep(duration) => true,
        }
    }

    /// Executes the timer loop.
    pub async fn run(self) -> Result<()> {
        loop {
            let wait = seconds_until_boundary(&self.clock.time());
            debug!("Next check-in due in {wait}s");
            if wait > 0 && !self.pause(Duration::from_secs(wait)).await {
                break;
            }
            if self.shutdown.is_cancelled() {
                break;
            }

            if self.next.send(DueSignal::Scheduled).await.is_err() {
                info!("Due signal receiver is gone, stopping timer");
                break;
            }
            debug!("Sent scheduled due signal");

            if !self.pause(self.cooldown).await {
                break;
            }
        }
        info!("Timer stopped");
        Ok(())
    }
}
