//! Conversion of whatever JSON was found on disk into a [Document].
//!
//! The legacy format is a flat object keyed by timestamp:
//! `{"2024-01-01 10:00": {"top3": "..", "past_15": "..", "next_15": ".."}}`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::entities::{value_text, ActionEntry, Document, PriorityEntry};

const PRIORITIES_KEY: &str = "priorities";
const ACTIONS_KEY: &str = "actions";
const LEGACY_PRIORITIES_KEY: &str = "top3";
const LEGACY_PAST_KEY: &str = "past_15";
const LEGACY_NEXT_KEY: &str = "next_15";

#[derive(Debug, PartialEq, Eq)]
pub enum Migration {
    /// Already in the `{priorities, actions}` shape.
    Current(Document),
    /// In the current shape, but some entries could not be read and were left out. The original
    /// should be backed up before it is overwritten.
    Repaired(Document),
    /// Converted from the timestamp keyed map. The original should be backed up.
    Legacy(Document),
    /// Not an object at all. Treated as an empty document; the original should be backed up.
    Unrecognized,
}

impl Migration {
    pub fn needs_backup(&self) -> bool {
        !matches!(self, Migration::Current(_))
    }

    pub fn into_document(self) -> Document {
        match self {
            Migration::Current(document)
            | Migration::Repaired(document)
            | Migration::Legacy(document) => document,
            Migration::Unrecognized => Document::default(),
        }
    }
}

pub fn migrate(value: Value) -> Migration {
    match value {
        Value::Object(map) if map.contains_key(PRIORITIES_KEY) && map.contains_key(ACTIONS_KEY) => {
            read_current(map)
        }
        Value::Object(map) => Migration::Legacy(read_legacy(map)),
        _ => Migration::Unrecognized,
    }
}

fn read_current(mut map: Map<String, Value>) -> Migration {
    let (priorities, priorities_intact) = read_entries(map.remove(PRIORITIES_KEY), PRIORITIES_KEY);
    let (actions, actions_intact) = read_entries(map.remove(ACTIONS_KEY), ACTIONS_KEY);
    let document = Document {
        priorities,
        actions,
    };

    if priorities_intact && actions_intact {
        Migration::Current(document)
    } else {
        Migration::Repaired(document)
    }
}

/// Keeps every entry that parses, malformed ones are dropped. The flag tells whether nothing was
/// dropped.
fn read_entries<T: DeserializeOwned>(value: Option<Value>, list: &str) -> (Vec<T>, bool) {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return (vec![], true),
        Some(other) => {
            warn!("Expected a list of {list}, found {other}");
            return (vec![], false);
        }
    };

    let total = items.len();
    let entries = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed entry in {list} {item}: {e}");
                None
            }
        })
        .collect::<Vec<_>>();
    let intact = entries.len() == total;
    (entries, intact)
}

fn read_legacy(map: Map<String, Value>) -> Document {
    let mut document = Document::default();

    for (time, entry) in map {
        let Value::Object(entry) = entry else {
            warn!("Skipping legacy entry {time} that is not an object");
            continue;
        };

        if let Some(top3) = entry.get(LEGACY_PRIORITIES_KEY) {
            document.priorities.push(PriorityEntry {
                time: time.clone(),
                text: value_text(top3),
            });
        }

        document.actions.push(ActionEntry {
            past_15: entry.get(LEGACY_PAST_KEY).map(value_text).unwrap_or_default(),
            next_15: entry.get(LEGACY_NEXT_KEY).map(value_text).unwrap_or_default(),
            time,
        });
    }

    document
}
