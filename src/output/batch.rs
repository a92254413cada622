//! JSON batch files
//!
//! Batches are written into the output directory as
//! `batch_partial_<timestamp>.json` during the run and `batch_<timestamp>.json`
//! at the end. The timestamp has millisecond resolution; a numeric suffix
//! keeps two batches written in the same millisecond apart.

use crate::classify::ProfileRecord;
use crate::output::traits::{BatchMetadata, BatchSink, OutputError, OutputResult};
use crate::persist::write_json_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PARTIAL_PREFIX: &str = "batch_partial";
pub const FINAL_PREFIX: &str = "batch";

/// A batch file as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDocument {
    pub metadata: BatchMetadata,
    pub resumes: Vec<ProfileRecord>,
}

#[derive(Serialize)]
struct BatchView<'a> {
    metadata: &'a BatchMetadata,
    resumes: &'a [ProfileRecord],
}

/// `<prefix>_<YYYYmmdd_HHMMSS_mmm>.json`
pub fn batch_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.json", prefix, at.format("%Y%m%d_%H%M%S_%3f"))
}

/// Reads a batch file back
///
/// # Arguments
///
/// * `path` - A partial or final batch file
///
/// # Returns
///
/// * `Ok(BatchDocument)` - Metadata and records
/// * `Err(OutputError)` - The file is missing or is not a batch document
pub fn read_batch(path: &Path) -> OutputResult<BatchDocument> {
    let content = std::fs::read_to_string(path).map_err(|source| OutputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| OutputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes batches as pretty-printed JSON files in one directory
#[derive(Debug, Clone)]
pub struct JsonBatchWriter {
    dir: PathBuf,
}

impl JsonBatchWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free path for a batch with `prefix` written at `at`
    fn available_path(&self, prefix: &str, at: DateTime<Utc>) -> PathBuf {
        let name = batch_file_name(prefix, at);
        let candidate = self.dir.join(&name);
        if !candidate.exists() {
            return candidate;
        }
        let stem = name.trim_end_matches(".json");
        (1u32..)
            .map(|n| self.dir.join(format!("{stem}_{n}.json")))
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }

    fn write(
        &self,
        prefix: &str,
        records: &[ProfileRecord],
        metadata: &BatchMetadata,
    ) -> OutputResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.available_path(prefix, Utc::now());
        let view = BatchView {
            metadata,
            resumes: records,
        };
        write_json_atomic(&path, &view).map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), count = records.len(), "Batch written");
        Ok(path)
    }
}

impl BatchSink for JsonBatchWriter {
    fn write_partial(
        &mut self,
        records: &[ProfileRecord],
        metadata: &BatchMetadata,
    ) -> OutputResult<PathBuf> {
        self.write(PARTIAL_PREFIX, records, metadata)
    }

    fn write_final(
        &mut self,
        records: &[ProfileRecord],
        metadata: &BatchMetadata,
    ) -> OutputResult<PathBuf> {
        self.write(FINAL_PREFIX, records, metadata)
    }
}
