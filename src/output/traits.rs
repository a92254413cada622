//! Batch sink trait and associated types
//!
//! This module defines the interface the collector writes batches through
//! and the metadata stamped into every batch.

use crate::classify::ProfileRecord;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write batch {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read batch {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse batch {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Metadata block at the top of every batch file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMetadata {
    /// Number of records in the batch
    pub count: usize,

    /// RFC 3339 time the batch was written
    pub collected_at: String,

    /// Candidates that failed to fetch so far in this run
    pub errors: u64,

    /// Configured query list
    pub search_queries: Vec<String>,

    /// Seconds since the run started
    pub collection_time_seconds: f64,

    /// Cumulative accepted count the run is aiming for
    pub target_count: u64,

    /// Candidates rejected by the classifier so far in this run
    pub rejected: u64,

    /// SHA-256 of the configuration file, when one was used
    pub config_hash: Option<String>,
}

/// Destination for partial and final batches
///
/// Every call receives the full set of records accepted in this run, never a
/// diff against the previous write.
pub trait BatchSink: Send {
    /// Writes an intermediate snapshot and returns where it went
    fn write_partial(
        &mut self,
        records: &[ProfileRecord],
        metadata: &BatchMetadata,
    ) -> OutputResult<PathBuf>;

    /// Writes the end-of-run snapshot and returns where it went
    fn write_final(
        &mut self,
        records: &[ProfileRecord],
        metadata: &BatchMetadata,
    ) -> OutputResult<PathBuf>;
}
