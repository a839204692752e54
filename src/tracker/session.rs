use super::{
    storage::entities::{ActionEntry, PriorityEntry, SubmitOutcome},
    DueSignal,
};

/// Fields of the form in the order they are asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Priorities,
    Past,
    Next,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Priorities => "Your top 3 current priorities",
            Field::Past => "What did you get done in the past 15 minutes?",
            Field::Next => "What's your aim for the next 15 minutes?",
        }
    }

    fn following(self) -> Option<Field> {
        match self {
            Field::Priorities => Some(Field::Past),
            Field::Past => Some(Field::Next),
            Field::Next => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Waiting for an answer to this field.
    Awaiting(Field),
    /// Every field has an answer, the session can be submitted.
    Complete,
}

/// One open check-in form. The timestamp is fixed when the session is created and is shared by
/// every entry the session produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSession {
    timestamp: String,
    origin: DueSignal,
    priorities: String,
    past: String,
    next: String,
    progress: Progress,
}

impl FormSession {
    pub fn new(timestamp: String, origin: DueSignal, prefilled_priorities: &str) -> Self {
        Self {
            timestamp,
            origin,
            priorities: prefilled_priorities.to_owned(),
            past: String::new(),
            next: String::new(),
            progress: Progress::Awaiting(Field::Priorities),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn origin(&self) -> DueSignal {
        self.origin
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn text(&self, field: Field) -> &str {
        match field {
            Field::Priorities => &self.priorities,
            Field::Past => &self.past,
            Field::Next => &self.next,
        }
    }

    /// Records an answer for the field currently asked for. An empty answer to the priorities
    /// field keeps the pre-filled text.
    pub fn enter(&mut self, answer: &str) -> Progress {
        let Progress::Awaiting(field) = self.progress else {
            return Progress::Complete;
        };

        match field {
            Field::Priorities if answer.trim().is_empty() => {}
            Field::Priorities => self.priorities = answer.to_owned(),
            Field::Past => self.past = answer.to_owned(),
            Field::Next => self.next = answer.to_owned(),
        }

        self.progress = field
            .following()
            .map_or(Progress::Complete, Progress::Awaiting);
        self.progress
    }

    /// Entries to append on submission. A priority entry is only produced when the priorities
    /// differ from `latest_priorities`.
    pub fn outcome(&self, latest_priorities: &str) -> SubmitOutcome {
        let priorities = self.priorities.trim();

        SubmitOutcome {
            action: ActionEntry {
                time: self.timestamp.clone(),
                past_15: self.past.trim().to_owned(),
                next_15: self.next.trim().to_owned(),
            },
            priority: (priorities != latest_priorities).then(|| PriorityEntry {
                time: self.timestamp.clone(),
                text: priorities.to_owned(),
            }),
        }
    }
}
