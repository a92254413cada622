//! State module for tracking collection progress
//!
//! # Components
//!
//! - `CollectorPhase`: where the collector is in its search/fetch/classify loop
//! - `Checkpoint`: accepted logins and the cumulative accepted count, persisted
//!   between runs through a `CheckpointStore`

mod checkpoint;
mod phase;

// Re-export main types
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore, JsonCheckpointStore};
pub use phase::CollectorPhase;
