use anyhow::Result;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{
    coordinator::PromptCoordinator,
    session::Progress,
    storage::log_store::LogStore,
    surface::{Surface, HELP},
    DueSignal,
};

/// What a line typed by the user means.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Prompt,
    Close,
    Quit,
    Help,
    Answer(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            ":p" | ":prompt" => Command::Prompt,
            ":c" | ":close" => Command::Close,
            ":q" | ":quit" => Command::Quit,
            ":h" | ":help" => Command::Help,
            _ => Command::Answer(line),
        }
    }
}

/// The UI-owning event loop. Everything that touches the session, the surface or the log happens
/// here; other tasks only reach it through the due signal channel.
pub struct Dispatcher<S: LogStore, U: Surface> {
    coordinator: PromptCoordinator<S>,
    surface: U,
    due: mpsc::Receiver<DueSignal>,
    shutdown: CancellationToken,
}

impl<S: LogStore, U: Surface> Dispatcher<S, U> {
    pub fn new(
        coordinator: PromptCoordinator<S>,
        surface: U,
        due: mpsc::Receiver<DueSignal>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            coordinator,
            surface,
            due,
            shutdown,
        }
    }

    /// Runs until shutdown is requested or the input ends.
    pub async fn run(mut self, mut input: impl Stream<Item = String> + Unpin) -> Result<()> {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(signal) = self.due.recv() => self.open(signal),
                line = input.next() => match line {
                    Some(line) => self.handle_line(&line).await,
                    None => {
                        info!("Input closed, shutting down");
                        self.shutdown.cancel();
                        break;
                    }
                },
            }
        }

        self.due.close();
        Ok(())
    }

    /// Opens a new session. If it can't be shown, it is replaced once more with a fresh one.
    fn open(&mut self, signal: DueSignal) {
        debug!("Received due signal {signal:?}");
        let session = self.coordinator.open(signal);
        let Err(e) = self.surface.present(session) else {
            return;
        };

        warn!("Failed to present session, recreating it: {e:?}");
        let session = self.coordinator.open(signal);
        if let Err(e) = self.surface.present(session) {
            error!("Failed to present recreated session {e:?}");
        }
    }

    async fn handle_line(&mut self, line: &str) {
        let result = match Command::parse(line) {
            Command::Prompt => {
                self.open(DueSignal::Manual);
                Ok(())
            }
            Command::Close => match self.coordinator.close() {
                Some(_) => self.surface.closed(),
                None => self.surface.notify("No check-in is open."),
            },
            Command::Quit => {
                info!("Quit requested");
                self.shutdown.cancel();
                Ok(())
            }
            Command::Help => self.surface.notify(HELP),
            Command::Answer(answer) => self.answer(answer).await,
        };

        if let Err(e) = result {
            error!("Surface error {e:?}");
        }
    }

    async fn answer(&mut self, answer: &str) -> Result<()> {
        let Some(session) = self.coordinator.session_mut() else {
            return self
                .surface
                .notify("No check-in is open. Type :p to start one.");
        };

        if session.enter(answer) != Progress::Complete {
            return self.surface.present(session);
        }

        match self.coordinator.submit().await {
            Ok(Some(outcome)) => self.surface.saved(&outcome),
            Ok(None) => Ok(()),
            Err(e) => {
                error!("Failed to save the log {e:?}");
                self.surface
                    .error(&format!("Could not save the log, it will be retried on the next check-in: {e}"))
            }
        }
    }
}
