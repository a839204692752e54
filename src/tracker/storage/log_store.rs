use std::{future::Future, path::PathBuf};

use anyhow::Result;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use tracing::{debug, error, info, warn};

use crate::{
    fs::operations::{copy_to_backup, overwrite_locked, read_locked},
    utils::{clock::Clock, time::backup_stamp},
};

use super::{
    entities::Document,
    migration::migrate,
};

/// Default location of the log, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "productivity_log.json";

/// Interface for abstracting persistence of the productivity log.
pub trait LogStore {
    /// Never fails: anything that can't be read is treated as an empty log.
    fn load(&self) -> impl Future<Output = Document>;

    /// Overwrites the whole log with `document`.
    fn save(&self, document: &Document) -> impl Future<Output = Result<()>>;
}

/// The main realization of [LogStore]: a single pretty printed JSON file.
pub struct JsonLogStore {
    path: PathBuf,
    clock: Box<dyn Clock>,
}

impl JsonLogStore {
    pub fn new(path: PathBuf, clock: Box<dyn Clock>) -> Self {
        Self { path, clock }
    }

    async fn backup(&self) {
        let stamp = backup_stamp(&self.clock.time());
        match copy_to_backup(&self.path, &stamp).await {
            Ok(backup) => info!("Created backup of original data file {backup:?}"),
            Err(e) => warn!("Failed to create backup of {:?}: {e:?}", self.path),
        }
    }

    async fn read(&self) -> Result<Option<Value>> {
        let Some(contents) = read_locked(&self.path).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

impl LogStore for JsonLogStore {
    async fn load(&self) -> Document {
        let value = match self.read().await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("No log at {:?}, starting empty", self.path);
                return Document::default();
            }
            Err(e) => {
                error!("Error loading data from {:?}: {e:?}", self.path);
                // The next save would overwrite whatever is there.
                self.backup().await;
                return Document::default();
            }
        };

        let migration = migrate(value);
        if !migration.needs_backup() {
            return migration.into_document();
        }

        info!(
            "Log at {:?} is in an old format or has unreadable entries, rewriting it",
            self.path
        );
        self.backup().await;
        let document = migration.into_document();
        if let Err(e) = self.save(&document).await {
            warn!("Failed to write migrated log {:?}: {e:?}", self.path);
        }
        document
    }

    async fn save(&self, document: &Document) -> Result<()> {
        let contents = to_pretty_json(document)?;
        overwrite_locked(&self.path, &contents).await?;
        debug!(
            "Saved {} actions and {} priorities to {:?}",
            document.actions.len(),
            document.priorities.len(),
            self.path
        );
        Ok(())
    }
}

/// Four space indentation, same as the files written by earlier versions.
fn to_pretty_json(document: &Document) -> Result<Vec<u8>> {
    let mut contents = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut contents, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut serializer)?;
    Ok(contents)
}
