use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use coordinator::PromptCoordinator;
use dispatcher::Dispatcher;
use storage::log_store::{JsonLogStore, DEFAULT_LOG_FILE};
use surface::{spawn_input_reader, TerminalSurface};
use timer::{QuarterHourTimer, DEFAULT_COOLDOWN};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::utils::clock::{Clock, DefaultClock};

pub mod coordinator;
pub mod dispatcher;
pub mod session;
pub mod signals;
pub mod storage;
pub mod surface;
pub mod timer;

const DUE_CHANNEL_CAPACITY: usize = 10;

/// Reason a check-in is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueSignal {
    /// Shown right after launch.
    Startup,
    /// A quarter hour boundary was reached.
    Scheduled,
    /// Requested by the user.
    Manual,
}

impl DueSignal {
    pub fn describe(&self) -> &'static str {
        match self {
            DueSignal::Startup => "on launch",
            DueSignal::Scheduled => "scheduled",
            DueSignal::Manual => "on request",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub log_file: PathBuf,
    pub initial_prompt: bool,
    pub cooldown: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            initial_prompt: true,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Represents the starting point for the tracker. The dispatcher runs on the calling task and
/// owns all interaction; the timer is spawned and can only reach it through the due channel.
pub async fn start_tracker(config: TrackerConfig) -> Result<()> {
    info!("Starting tracker with {config:?}");
    let (sender, receiver) = mpsc::channel::<DueSignal>(DUE_CHANNEL_CAPACITY);
    let shutdown_token = CancellationToken::new();

    let store = JsonLogStore::new(config.log_file.clone(), Box::new(DefaultClock));
    let coordinator = PromptCoordinator::load(store, Box::new(DefaultClock)).await;

    if config.initial_prompt {
        sender.send(DueSignal::Startup).await?;
    }

    let timer = create_timer(sender.clone(), &shutdown_token, config.cooldown, DefaultClock);
    let timer_handle = tokio::spawn(timer.run());

    let dispatcher = Dispatcher::new(
        coordinator,
        TerminalSurface::stdout(Box::new(DefaultClock)),
        receiver,
        shutdown_token.clone(),
    );

    let (_, trigger_result, dispatch_result) = tokio::join!(
        signals::detect_shutdown(shutdown_token.clone()),
        signals::forward_manual_triggers(sender, shutdown_token.clone()),
        dispatcher.run(spawn_input_reader()?),
    );
    // The dispatcher may have ended on its own, make sure everyone else stops too.
    shutdown_token.cancel();

    if let Err(trigger_result) = trigger_result {
        error!("Manual trigger listener got an error {:?}", trigger_result);
    }

    if let Err(dispatch_result) = dispatch_result {
        error!("Dispatcher got an error {:?}", dispatch_result);
    }

    match timer_handle.await {
        Ok(Err(timer_result)) => error!("Timer got an error {:?}", timer_result),
        Err(join_error) => error!("Timer task failed {:?}", join_error),
        Ok(Ok(())) => {}
    }

    info!("Tracker stopped");
    Ok(())
}

fn create_timer(
    sender: mpsc::Sender<DueSignal>,
    shutdown_token: &CancellationToken,
    cooldown: Duration,
    clock: impl Clock,
) -> QuarterHourTimer {
    QuarterHourTimer::new(sender, shutdown_token.clone(), cooldown, Box::new(clock))
}

#[cfg(test)]
mod tracker_tests {
    use std::{fs, time::Duration};

    use anyhow::Result;
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::tempdir;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;
    use tokio_util::sync::CancellationToken;

    use crate::{
        tracker::{
            coordinator::PromptCoordinator,
            create_timer,
            dispatcher::Dispatcher,
            storage::log_store::{JsonLogStore, LogStore, DEFAULT_LOG_FILE},
            surface::TerminalSurface,
            DueSignal,
        },
        utils::{clock::TestClock, logging::TEST_LOGGING},
    };

    /// Wires the real timer, dispatcher, terminal surface and JSON store together, with the wall
    /// clock starting just before a quarter hour.
    #[tokio::test(start_paused = true)]
    async fn smoke_test_tracker() -> Result<()> {
        *TEST_LOGGING;
        let clock = TestClock::starting_at(
            NaiveDate::from_ymd_opt(2018, 7, 4)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(10, 14, 30).unwrap()),
        );
        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_LOG_FILE);
        fs::write(
            &path,
            r#"{"2018-07-04 10:00": {"top3": "A, B, C", "past_15": "x", "next_15": "y"}}"#,
        )?;

        let shutdown = CancellationToken::new();
        let (sender, receiver) = mpsc::channel::<DueSignal>(10);
        let (input, input_receiver) = mpsc::channel::<String>(10);

        let store = JsonLogStore::new(path.clone(), Box::new(clock.clone()));
        let coordinator = PromptCoordinator::load(store, Box::new(clock.clone())).await;
        let timer = create_timer(sender, &shutdown, Duration::from_secs(60), clock.clone());
        let dispatcher = Dispatcher::new(
            coordinator,
            TerminalSurface::new(Vec::new(), Box::new(clock.clone())),
            receiver,
            shutdown.clone(),
        );

        let (timer_result, dispatch_result, _) = tokio::join!(
            timer.run(),
            dispatcher.run(ReceiverStream::new(input_receiver)),
            async {
                // Past the 10:15 boundary, the session is open by now.
                tokio::time::sleep(Duration::from_secs(45)).await;
                for line in ["", "wrote tests", "review"] {
                    input.send(line.to_string()).await.unwrap();
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
                shutdown.cancel();
            },
        );

        timer_result?;
        dispatch_result?;

        let document = JsonLogStore::new(path, Box::new(clock)).load().await;
        assert_eq!(document.priorities.len(), 1);
        assert_eq!(document.actions.len(), 2);
        assert_eq!(document.actions[1].time, "2018-07-04 10:15");
        assert_eq!(document.actions[1].past_15, "wrote tests");

        let backups = fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".backup."))
            .count();
        assert_eq!(backups, 1);
        Ok(())
    }
}
