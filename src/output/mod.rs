//! Output module for batch files and run summaries
//!
//! This module handles:
//! - Writing partial and final JSON batches of accepted records
//! - Reading batches back
//! - Printing the end-of-run summary

mod batch;
mod summary;
mod traits;

pub use batch::{
    batch_file_name, read_batch, BatchDocument, JsonBatchWriter, FINAL_PREFIX, PARTIAL_PREFIX,
};
pub use summary::{print_summary, RunSummary};
pub use traits::{BatchMetadata, BatchSink, OutputError, OutputResult};
