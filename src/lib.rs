//! Resume-Harvester: a rate-limit-aware GitHub profile collector
//!
//! This crate searches GitHub users, classifies their public profiles into
//! resume records, and persists the results as checkpointed JSON batches so an
//! interrupted run can pick up where it left off.

pub mod api;
pub mod classify;
pub mod collector;
pub mod config;
pub mod output;
pub mod persist;
pub mod search;
pub mod state;

use thiserror::Error;

/// Environment variable holding the GitHub access token
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable that overrides the configuration file location
pub const CONFIG_ENV: &str = "RESUME_HARVESTER_CONFIG";

/// Main error type for Resume-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{var} environment variable not set")]
    MissingCredential { var: &'static str },

    #[error("GitHub API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] state::CheckpointError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Aborting run after {count} consecutive API failures")]
    TooManyConsecutiveErrors { count: u32 },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CollectorPhase,
        to: state::CollectorPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Resume-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use classify::{Classification, Classifier, ProfileRecord};
pub use collector::Collector;
pub use config::Config;
pub use output::RunSummary;
pub use state::{Checkpoint, CollectorPhase};
