//! Collector module - orchestrates a collection run
//!
//! This module contains:
//! - The run loop tying search, fetch, classification, and persistence together
//! - Shared progress counters and the periodic progress reporter

mod orchestrator;
mod progress;

pub use orchestrator::Collector;
pub use progress::{spawn_reporter, ProgressCounters, ProgressSnapshot};
