//! Configuration module for Resume-Harvester
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so a run without any file
//! behaves like the stock collector.
//!
//! # Example
//!
//! ```no_run
//! use resume_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("collector.toml")).unwrap();
//! println!("Searching {} queries", config.search.queries.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_queries, ApiConfig, ClassifierConfig, Config, ExperienceConfig, OutputConfig,
    ProficiencyConfig, ProgressConfig, SearchConfig, TierRule,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, discover_config_path, load_config, load_config_with_hash, resolve_config,
    DEFAULT_CONFIG_FILE,
};
pub use validation::validate;
