use crate::classify::record::{ExperienceLevel, ProficiencyTier};
use crate::config::{ExperienceConfig, ProficiencyConfig, TierRule};
use chrono::{DateTime, Utc};

const DAYS_PER_YEAR: f64 = 365.25;

/// Weighted, saturating score in `[0, 1]`
///
/// # Arguments
///
/// * `config` - Weights and saturation points
/// * `public_repos` - Public repository count from the profile
/// * `total_stars` - Stars summed over the fetched repositories
/// * `distinct_skills` - Length of the extracted skill list
pub fn proficiency_score(
    config: &ProficiencyConfig,
    public_repos: u32,
    total_stars: u64,
    distinct_skills: usize,
) -> f64 {
    let saturate = |value: f64, point: f64| (value / point).min(1.0);
    config.repo_weight * saturate(f64::from(public_repos), config.repo_saturation)
        + config.star_weight * saturate(total_stars as f64, config.star_saturation)
        + config.diversity_weight * saturate(distinct_skills as f64, config.diversity_saturation)
}

pub fn proficiency_tier(config: &ProficiencyConfig, score: f64) -> ProficiencyTier {
    if score >= config.expert_cutoff {
        ProficiencyTier::Expert
    } else if score >= config.advanced_cutoff {
        ProficiencyTier::Advanced
    } else if score >= config.intermediate_cutoff {
        ProficiencyTier::Intermediate
    } else if score >= config.beginner_cutoff {
        ProficiencyTier::Beginner
    } else {
        ProficiencyTier::Novice
    }
}

/// Account age in years (days / 365.25), or `None` if `created_at` is not RFC 3339
///
/// Timestamps in the future count as age zero.
pub fn account_age_years(created_at: Option<&str>, now: DateTime<Utc>) -> Option<f64> {
    let created = DateTime::parse_from_rfc3339(created_at?.trim()).ok()?;
    let days = (now - created.with_timezone(&Utc)).num_seconds() as f64 / 86_400.0;
    Some((days / DAYS_PER_YEAR).max(0.0))
}

/// First tier, from expert down, whose minima are all met
///
/// # Returns
///
/// * `ExperienceLevel::Unknown` - `age_years` is `None`
/// * `ExperienceLevel::Entry` - No tier rule is satisfied
/// * Otherwise the highest satisfied tier
pub fn experience_level(
    config: &ExperienceConfig,
    age_years: Option<f64>,
    public_repos: u32,
    popularity: u64,
) -> ExperienceLevel {
    let Some(years) = age_years else {
        return ExperienceLevel::Unknown;
    };
    let meets = |rule: &TierRule| {
        years >= rule.min_years && public_repos >= rule.min_repos && popularity >= rule.min_popularity
    };
    [
        (&config.expert, ExperienceLevel::Expert),
        (&config.senior, ExperienceLevel::Senior),
        (&config.mid, ExperienceLevel::Mid),
        (&config.junior, ExperienceLevel::Junior),
    ]
    .into_iter()
    .find(|(rule, _)| meets(rule))
    .map_or(ExperienceLevel::Entry, |(_, level)| level)
}
