use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};

/// Represents an entity responsible for providing wall clock time across the application. Quarter
/// hour boundaries are local, so this hands out local time. Swappable for testing.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Local>;

    async fn sleep(&self, duration: Duration);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that starts at a fixed moment and moves forward together with tokio time. Combined with
/// paused tokio time this gives deterministic wall clock readings.
#[cfg(test)]
#[derive(Clone)]
pub struct TestClock {
    start_time: DateTime<Local>,
    reference: tokio::time::Instant,
}

#[cfg(test)]
impl TestClock {
    pub fn starting_at(start_time: chrono::NaiveDateTime) -> Self {
        use chrono::TimeZone;
        Self {
            start_time: Local
                .from_local_datetime(&start_time)
                .earliest()
                .expect("test start time should exist in local time"),
            reference: tokio::time::Instant::now(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Clock for TestClock {
    fn time(&self) -> DateTime<Local> {
        self.start_time + self.reference.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
