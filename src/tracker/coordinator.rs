use anyhow::Result;
use tracing::{debug, info, info_span, Instrument};

use crate::utils::{clock::Clock, time::entry_timestamp};

use super::{
    session::FormSession,
    storage::{
        entities::{Document, SubmitOutcome},
        log_store::LogStore,
    },
    DueSignal,
};

/// Owns the log and the single live [FormSession]. Any due signal replaces the open session with
/// a fresh one, so a session's timestamp always matches the moment it was shown.
pub struct PromptCoordinator<S: LogStore> {
    store: S,
    document: Document,
    session: Option<FormSession>,
    clock: Box<dyn Clock>,
}

impl<S: LogStore> PromptCoordinator<S> {
    pub async fn load(store: S, clock: Box<dyn Clock>) -> Self {
        let document = store.load().await;
        info!(
            "Loaded {} actions and {} priorities",
            document.actions.len(),
            document.priorities.len()
        );
        Self {
            store,
            document,
            session: None,
            clock,
        }
    }

    #[cfg(test)]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&FormSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut FormSession> {
        self.session.as_mut()
    }

    /// Starts a new session, discarding the open one if there is any.
    pub fn open(&mut self, signal: DueSignal) -> &FormSession {
        if let Some(previous) = self.session.take() {
            debug!(
                "Discarding session from {} to open a new one",
                previous.timestamp()
            );
        }

        let timestamp = entry_timestamp(&self.clock.time());
        info!("Opening session {timestamp} ({signal:?})");
        self.session.insert(FormSession::new(
            timestamp,
            signal,
            self.document.latest_priorities(),
        ))
    }

    /// Discards the open session without saving anything.
    pub fn close(&mut self) -> Option<FormSession> {
        let session = self.session.take();
        if let Some(session) = &session {
            info!("Closed session {} without saving", session.timestamp());
        }
        session
    }

    /// Appends the open session's entries and persists the log. The session is closed even if
    /// saving fails; its entries stay in memory and go out with the next successful save.
    pub async fn submit(&mut self) -> Result<Option<SubmitOutcome>> {
        let Some(session) = self.session.take() else {
            return Ok(None);
        };

        let span = info_span!("Submitting session", timestamp = session.timestamp());
        let outcome = session.outcome(self.document.latest_priorities());
        self.document.record(outcome.clone());
        self.store.save(&self.document).instrument(span).await?;
        info!(
            "Saved session {} (priorities changed: {})",
            session.timestamp(),
            outcome.priority.is_some()
        );

        Ok(Some(outcome))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use crate::{
        tracker::{
            session::Progress,
            storage::{
                entities::{Document, PriorityEntry},
                log_store::LogStore,
            },
            DueSignal,
        },
        utils::clock::TestClock,
    };

    use super::PromptCoordinator;

    pub const TEST_START_DATE: NaiveDateTime = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
    );

    /// Keeps the last saved document in memory.
    #[derive(Clone, Default)]
    pub struct MemoryStore {
        pub initial: Document,
        pub saved: Arc<Mutex<Vec<Document>>>,
        pub failing: bool,
    }

    impl MemoryStore {
        pub fn with(initial: Document) -> Self {
            Self {
                initial,
                ..Default::default()
            }
        }

        pub fn saves(&self) -> Vec<Document> {
            self.saved.lock().unwrap().clone()
        }
    }

    impl LogStore for MemoryStore {
        async fn load(&self) -> Document {
            self.initial.clone()
        }

        async fn save(&self, document: &Document) -> Result<()> {
            if self.failing {
                return Err(anyhow!("disk full"));
            }
            self.saved.lock().unwrap().push(document.clone());
            Ok(())
        }
    }

    fn with_priorities(text: &str) -> Document {
        Document {
            priorities: vec![PriorityEntry {
                time: "2024-01-01 09:00".into(),
                text: text.into(),
            }],
            actions: vec![],
        }
    }

    async fn coordinator(store: MemoryStore) -> PromptCoordinator<MemoryStore> {
        PromptCoordinator::load(store, Box::new(TestClock::starting_at(TEST_START_DATE))).await
    }

    fn answer(coordinator: &mut PromptCoordinator<MemoryStore>, answers: [&str; 3]) {
        let session = coordinator.session_mut().unwrap();
        for text in answers {
            session.enter(text);
        }
        assert_eq!(session.progress(), Progress::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_prefills_latest_priorities() {
        let mut coordinator = coordinator(MemoryStore::with(with_priorities("A, B, C"))).await;

        let session = coordinator.open(DueSignal::Startup);

        assert_eq!(session.timestamp(), "2024-01-01 10:15");
        assert_eq!(
            session.text(crate::tracker::session::Field::Priorities),
            "A, B, C"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_unchanged_priorities_adds_only_action() -> Result<()> {
        let store = MemoryStore::with(with_priorities("A, B, C"));
        let mut coordinator = coordinator(store.clone()).await;
        coordinator.open(DueSignal::Scheduled);
        answer(&mut coordinator, ["", "x", "y"]);

        let outcome = coordinator.submit().await?.unwrap();

        assert_eq!(outcome.priority, None);
        let saves = store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].priorities.len(), 1);
        assert_eq!(saves[0].actions.len(), 1);
        assert_eq!(saves[0].actions[0].time, "2024-01-01 10:15");
        assert!(coordinator.session().is_none());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_changed_priorities_adds_both() -> Result<()> {
        let store = MemoryStore::with(with_priorities("A, B, C"));
        let mut coordinator = coordinator(store.clone()).await;
        coordinator.open(DueSignal::Scheduled);
        answer(&mut coordinator, ["D, E, F", "x", "y"]);

        coordinator.submit().await?;

        let saved = store.saves().pop().unwrap();
        assert_eq!(saved.priorities.len(), 2);
        assert_eq!(saved.priorities[1].time, saved.actions[0].time);
        assert_eq!(saved.latest_priorities(), "D, E, F");
        assert_eq!(coordinator.document(), &saved);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_due_signals_keep_one_session() {
        let mut coordinator = coordinator(MemoryStore::default()).await;

        coordinator.open(DueSignal::Scheduled);
        coordinator.session_mut().unwrap().enter("half typed");
        coordinator.open(DueSignal::Scheduled);
        coordinator.open(DueSignal::Manual);

        let session = coordinator.session().unwrap();
        assert_eq!(session.origin(), DueSignal::Manual);
        assert_eq!(
            session.progress(),
            Progress::Awaiting(crate::tracker::session::Field::Priorities)
        );
        assert_eq!(coordinator.close().map(|s| s.origin()), Some(DueSignal::Manual));
        assert!(coordinator.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_does_not_save() -> Result<()> {
        let store = MemoryStore::default();
        let mut coordinator = coordinator(store.clone()).await;
        coordinator.open(DueSignal::Scheduled);
        answer(&mut coordinator, ["A", "x", "y"]);

        coordinator.close();

        assert_eq!(coordinator.submit().await?, None);
        assert!(store.saves().is_empty());
        assert_eq!(coordinator.document(), &Document::default());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_keeps_entries_in_memory() -> Result<()> {
        let store = MemoryStore {
            failing: true,
            ..Default::default()
        };
        let mut coordinator = coordinator(store).await;
        coordinator.open(DueSignal::Scheduled);
        answer(&mut coordinator, ["A", "x", "y"]);

        assert!(coordinator.submit().await.is_err());

        assert_eq!(coordinator.document().actions.len(), 1);
        assert_eq!(coordinator.document().latest_priorities(), "A");
        assert!(coordinator.session().is_none());
        Ok(())
    }
}
