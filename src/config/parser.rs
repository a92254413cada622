use crate::config::types::Config;
use crate::config::validation::validate;
use crate::{ConfigError, CONFIG_ENV};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Configuration file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "collector.toml";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use resume_harvester::config::load_config;
///
/// let config = load_config(Path::new("collector.toml")).unwrap();
/// println!("Max pages per query: {}", config.search.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stamped into the final batch so results can be traced back to
/// the thresholds that produced them.
///
/// # Arguments
///
/// * `path` - Path to the configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok((Config, String))` - Validated configuration and its hash
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Finds the configuration file to use, if any
///
/// `RESUME_HARVESTER_CONFIG` wins when set; otherwise `collector.toml` in the
/// working directory is used if it exists.
pub fn discover_config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.is_file().then_some(local)
}

/// Loads the configuration at `path`, or the validated defaults when `path` is `None`
///
/// # Arguments
///
/// * `path` - Configuration file found by [`discover_config_path`], if any
///
/// # Returns
///
/// * `Ok((Config, Some(hash)))` - Loaded from a file
/// * `Ok((Config, None))` - No file; defaults in effect
/// * `Err(ConfigError)` - The file could not be loaded or failed validation
pub fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            Ok((config, Some(hash)))
        }
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok((config, None))
        }
    }
}
