use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Answers given in one submitted check-in.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct ActionEntry {
    pub time: String,
    #[serde(default, deserialize_with = "text_field::deserialize")]
    pub past_15: String,
    #[serde(default, deserialize_with = "text_field::deserialize")]
    pub next_15: String,
}

/// Top 3 priorities as stated at `time`. Only recorded when they change.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct PriorityEntry {
    pub time: String,
    #[serde(default, deserialize_with = "text_field::deserialize")]
    pub text: String,
}

/// Strings are taken verbatim, `null` is empty, anything else keeps its JSON text so nothing is
/// lost.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

mod text_field {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(super::value_text(&Value::deserialize(deserializer)?))
    }
}

/// Everything that was ever logged. Both lists are append-only.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct Document {
    pub priorities: Vec<PriorityEntry>,
    pub actions: Vec<ActionEntry>,
}

/// Entries produced by a single submitted session. They always share the session timestamp.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SubmitOutcome {
    pub action: ActionEntry,
    pub priority: Option<PriorityEntry>,
}

impl Document {
    /// Text of the priority entry with the greatest `time`. On equal times the later entry in the
    /// list wins.
    pub fn latest_priorities(&self) -> &str {
        self.priorities
            .iter()
            .fold(None::<&PriorityEntry>, |latest, entry| match latest {
                Some(latest) if latest.time > entry.time => Some(latest),
                _ => Some(entry),
            })
            .map(|entry| entry.text.as_str())
            .unwrap_or_default()
    }

    pub fn record(&mut self, outcome: SubmitOutcome) {
        self.actions.push(outcome.action);
        if let Some(priority) = outcome.priority {
            self.priorities.push(priority);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionEntry, Document, PriorityEntry, SubmitOutcome};

    fn priority(time: &str, text: &str) -> PriorityEntry {
        PriorityEntry {
            time: time.into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_latest_priorities_picks_greatest_time() {
        let document = Document {
            priorities: vec![
                priority("2024-01-01 09:00", "old"),
                priority("2024-01-01 10:00", "new"),
            ],
            actions: vec![],
        };
        assert_eq!(document.latest_priorities(), "new");
    }

    #[test]
    fn test_latest_priorities_ignores_list_order() {
        let document = Document {
            priorities: vec![
                priority("2024-01-02 08:00", "newest"),
                priority("2024-01-01 10:00", "older"),
            ],
            actions: vec![],
        };
        assert_eq!(document.latest_priorities(), "newest");
    }

    #[test]
    fn test_latest_priorities_tie_prefers_last() {
        let document = Document {
            priorities: vec![
                priority("2024-01-01 10:00", "first"),
                priority("2024-01-01 10:00", "second"),
                priority("2024-01-01 09:00", "earlier"),
            ],
            actions: vec![],
        };
        assert_eq!(document.latest_priorities(), "second");
    }

    #[test]
    fn test_latest_priorities_empty() {
        assert_eq!(Document::default().latest_priorities(), "");
    }

    #[test]
    fn test_record_appends() {
        let mut document = Document::default();
        document.record(SubmitOutcome {
            action: ActionEntry {
                time: "2024-01-01 10:00".into(),
                past_15: "x".into(),
                next_15: "y".into(),
            },
            priority: None,
        });
        document.record(SubmitOutcome {
            action: ActionEntry {
                time: "2024-01-01 10:15".into(),
                past_15: "y".into(),
                next_15: "z".into(),
            },
            priority: Some(priority("2024-01-01 10:15", "A")),
        });

        assert_eq!(document.actions.len(), 2);
        assert_eq!(document.actions[0].time, "2024-01-01 10:00");
        assert_eq!(document.priorities, vec![priority("2024-01-01 10:15", "A")]);
    }

    #[test]
    fn test_text_fields_accept_null_and_non_strings() {
        let action: ActionEntry = serde_json::from_value(serde_json::json!({
            "time": "2024-01-01 10:00",
            "past_15": null,
            "next_15": 7
        }))
        .unwrap();
        assert_eq!(action.past_15, "");
        assert_eq!(action.next_15, "7");

        let priority: PriorityEntry =
            serde_json::from_value(serde_json::json!({"time": "2024-01-01 10:00"})).unwrap();
        assert_eq!(priority.text, "");
    }

    #[test]
    fn test_serialized_shape() {
        let document = Document {
            priorities: vec![priority("2024-01-01 10:00", "A")],
            actions: vec![ActionEntry {
                time: "2024-01-01 10:00".into(),
                past_15: "x".into(),
                next_15: "y".into(),
            }],
        };
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "priorities": [{"time": "2024-01-01 10:00", "text": "A"}],
                "actions": [{"time": "2024-01-01 10:00", "past_15": "x", "next_15": "y"}],
            })
        );
    }
}
