//! Durable record of accepted candidates across runs
//!
//! The checkpoint file is small JSON:
//!
//! ```json
//! { "collected_users": ["alice", "bob"], "resumes_collected": 2, "last_updated": "2024-06-01T12:00:00Z" }
//! ```

use crate::persist::write_json_atomic;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to read checkpoint {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Checkpoint {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write checkpoint {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Accepted logins and the cumulative accepted count
///
/// `resumes_collected` only ever grows, and only when a login is added for
/// the first time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub collected_users: BTreeSet<String>,
    #[serde(default)]
    pub resumes_collected: u64,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, login: &str) -> bool {
        self.collected_users.contains(login)
    }

    /// Records an accepted login
    ///
    /// Returns false, leaving the count alone, if the login was already known.
    pub fn record_accepted(&mut self, login: &str) -> bool {
        let inserted = self.collected_users.insert(login.to_string());
        if inserted {
            self.resumes_collected += 1;
        }
        inserted
    }

    /// Stamps `last_updated`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
}

/// Where checkpoints are loaded from and saved to
pub trait CheckpointStore: Send {
    /// Returns the stored checkpoint, or an empty one if none exists yet
    fn load(&self) -> Result<Checkpoint, CheckpointError>;

    fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;
}

/// JSON file checkpoint, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Result<Checkpoint, CheckpointError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Checkpoint::new()),
            Err(source) => {
                return Err(CheckpointError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut checkpoint: Checkpoint =
            serde_json::from_str(&content).map_err(|source| CheckpointError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        // An older file may carry a count below its login list
        let known = checkpoint.collected_users.len() as u64;
        if checkpoint.resumes_collected < known {
            checkpoint.resumes_collected = known;
        }
        Ok(checkpoint)
    }

    fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        write_json_atomic(&self.path, checkpoint).map_err(|source| CheckpointError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
