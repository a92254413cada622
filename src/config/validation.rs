use crate::config::types::{
    ApiConfig, ClassifierConfig, Config, ExperienceConfig, OutputConfig, ProficiencyConfig,
    SearchConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_search_config(&config.search)?;
    validate_classifier_config(&config.classifier)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_consecutive_errors == 0 {
        return Err(ConfigError::Validation(
            "max-consecutive-errors must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates search configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.queries.is_empty() {
        return Err(ConfigError::Validation(
            "search.queries must contain at least one query".to_string(),
        ));
    }

    if let Some(blank) = config.queries.iter().position(|q| q.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "search.queries[{}] is empty",
            blank
        )));
    }

    if config.per_page < 1 || config.per_page > 100 {
        return Err(ConfigError::Validation(format!(
            "per-page must be between 1 and 100, got {}",
            config.per_page
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.repos_per_profile < 1 || config.repos_per_profile > 100 {
        return Err(ConfigError::Validation(format!(
            "repos-per-profile must be between 1 and 100, got {}",
            config.repos_per_profile
        )));
    }

    Ok(())
}

/// Validates classifier thresholds
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    if config.max_skills == 0 {
        return Err(ConfigError::Validation(
            "max-skills must be >= 1".to_string(),
        ));
    }

    validate_proficiency(&config.proficiency)?;
    validate_experience(&config.experience)?;
    Ok(())
}

fn validate_proficiency(config: &ProficiencyConfig) -> Result<(), ConfigError> {
    let weights = [
        config.repo_weight,
        config.star_weight,
        config.diversity_weight,
    ];
    if weights.iter().any(|w| *w < 0.0) {
        return Err(ConfigError::Validation(
            "proficiency weights must be non-negative".to_string(),
        ));
    }

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > 1e-6 {
        return Err(ConfigError::Validation(format!(
            "proficiency weights must sum to 1.0, got {:.4}",
            sum
        )));
    }

    if config.repo_saturation <= 0.0
        || config.star_saturation <= 0.0
        || config.diversity_saturation <= 0.0
    {
        return Err(ConfigError::Validation(
            "proficiency saturation points must be > 0".to_string(),
        ));
    }

    let cutoffs = [
        config.expert_cutoff,
        config.advanced_cutoff,
        config.intermediate_cutoff,
        config.beginner_cutoff,
    ];
    if cutoffs.windows(2).any(|pair| pair[0] < pair[1]) {
        return Err(ConfigError::Validation(
            "proficiency cutoffs must be non-increasing from expert to beginner".to_string(),
        ));
    }

    Ok(())
}

fn validate_experience(config: &ExperienceConfig) -> Result<(), ConfigError> {
    let tiers = [config.junior, config.mid, config.senior, config.expert];

    if tiers.iter().any(|t| t.min_years < 0.0) {
        return Err(ConfigError::Validation(
            "experience min-years must be non-negative".to_string(),
        ));
    }

    if tiers
        .windows(2)
        .any(|pair| pair[1].min_years < pair[0].min_years)
    {
        return Err(ConfigError::Validation(
            "experience tiers must not require fewer years than the tier below".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-path cannot be empty".to_string(),
        ));
    }

    if config.batch_save_interval < 1 {
        return Err(ConfigError::Validation(
            "batch-save-interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}
