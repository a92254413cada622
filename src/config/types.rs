use serde::Deserialize;

/// Main configuration structure for Resume-Harvester
///
/// Every section is optional in the TOML file; missing sections and keys fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub classifier: ClassifierConfig,
    pub output: OutputConfig,
    pub progress: ProgressConfig,
}

/// HTTP client, pacing, and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Root of the GitHub REST API
    pub base_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Fixed delay before every request (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the random delay added on top of `min_delay_ms`
    pub jitter_ms: u64,

    /// Suspend when fewer than this many calls remain in the quota window
    pub rate_limit_threshold: u32,

    /// Extra wait added past the advertised reset time (milliseconds)
    pub reset_buffer_ms: u64,

    /// Additional attempts after the first one for transient failures
    pub max_retries: u32,

    /// Base of the exponential backoff schedule (milliseconds)
    pub backoff_base_ms: u64,

    /// Consecutive failures after which the run is aborted
    pub max_consecutive_errors: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            user_agent: format!("resume-harvester/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            min_delay_ms: 300,
            jitter_ms: 200,
            rate_limit_threshold: 10,
            reset_buffer_ms: 1_000,
            max_retries: 3,
            backoff_base_ms: 1_000,
            max_consecutive_errors: 3,
        }
    }
}

/// Search query list and pagination bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Ordered list of user-search queries; earlier queries are exhausted first
    pub queries: Vec<String>,

    /// Maximum pages requested per query
    pub max_pages: u32,

    /// Results per search page (GitHub caps this at 100)
    pub per_page: u32,

    /// Search sort key
    pub sort: String,

    /// Search sort order
    pub order: String,

    /// Repositories fetched per profile (most recently updated first)
    pub repos_per_profile: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            queries: default_queries(),
            max_pages: 10,
            per_page: 100,
            sort: "repositories".to_string(),
            order: "desc".to_string(),
            repos_per_profile: 30,
        }
    }
}

/// Default query list: technical roles first, then semi-technical roles,
/// geographic spread, seniority terms, and specific technologies.
pub fn default_queries() -> Vec<String> {
    [
        "fullstack developer location:USA",
        "software engineer python",
        "backend developer java",
        "frontend developer react",
        "devops engineer kubernetes",
        "data scientist machine learning",
        "mobile developer ios android",
        "cloud architect aws",
        "technical writer documentation",
        "product manager software",
        "ux designer developer",
        "qa engineer automation",
        "scrum master agile",
        "developer location:London",
        "engineer location:Berlin",
        "programmer location:Toronto",
        "developer location:Sydney",
        "engineer location:Tokyo",
        "developer location:Bangalore",
        "junior developer",
        "senior engineer",
        "lead developer",
        "principal engineer",
        "react native developer",
        "golang developer",
        "rust programmer",
        "blockchain developer",
        "ai ml engineer",
        "cybersecurity engineer",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Heuristic thresholds used by the profile classifier
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClassifierConfig {
    /// Profiles without a bio need at least this many public repositories
    pub min_repos_without_bio: u32,

    /// Profiles without any contact signal need at least this many public repositories
    pub min_repos_without_contact: u32,

    /// Number of most-starred repositories whose language breakdown is fetched
    pub breakdown_top_n: usize,

    /// Maximum number of skills kept per record
    pub max_skills: usize,

    /// Number of repositories projected into `top_repos`
    pub top_repos: usize,

    pub proficiency: ProficiencyConfig,

    pub experience: ExperienceConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_repos_without_bio: 5,
            min_repos_without_contact: 10,
            breakdown_top_n: 5,
            max_skills: 15,
            top_repos: 5,
            proficiency: ProficiencyConfig::default(),
            experience: ExperienceConfig::default(),
        }
    }
}

/// Weights, saturation points, and tier cut points for the proficiency score
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProficiencyConfig {
    pub repo_weight: f64,
    pub star_weight: f64,
    pub diversity_weight: f64,

    /// Public repository count that earns full repository credit
    pub repo_saturation: f64,

    /// Total stars that earn full popularity credit
    pub star_saturation: f64,

    /// Distinct skills that earn full diversity credit
    pub diversity_saturation: f64,

    pub expert_cutoff: f64,
    pub advanced_cutoff: f64,
    pub intermediate_cutoff: f64,
    pub beginner_cutoff: f64,
}

impl Default for ProficiencyConfig {
    fn default() -> Self {
        Self {
            repo_weight: 0.4,
            star_weight: 0.3,
            diversity_weight: 0.3,
            repo_saturation: 20.0,
            star_saturation: 100.0,
            diversity_saturation: 5.0,
            expert_cutoff: 0.8,
            advanced_cutoff: 0.6,
            intermediate_cutoff: 0.4,
            beginner_cutoff: 0.2,
        }
    }
}

/// Minimum account age and activity for one experience tier
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TierRule {
    pub min_years: f64,
    pub min_repos: u32,

    /// Followers plus total stars
    pub min_popularity: u64,
}

impl TierRule {
    pub const fn new(min_years: f64, min_repos: u32, min_popularity: u64) -> Self {
        Self {
            min_years,
            min_repos,
            min_popularity,
        }
    }
}

/// Experience-level decision table, checked from `expert` down to `junior`
///
/// A profile that meets none of the rules is labelled `entry`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExperienceConfig {
    pub expert: TierRule,
    pub senior: TierRule,
    pub mid: TierRule,
    pub junior: TierRule,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            expert: TierRule::new(10.0, 50, 500),
            senior: TierRule::new(6.0, 25, 100),
            mid: TierRule::new(3.0, 10, 20),
            junior: TierRule::new(1.0, 5, 0),
        }
    }
}

/// Output locations and persistence cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving partial and final batch files
    pub output_dir: String,

    /// Path of the JSON checkpoint file
    pub checkpoint_path: String,

    /// Accepted records between checkpoint + partial batch writes
    pub batch_save_interval: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "resume_collections".to_string(),
            checkpoint_path: "collection_checkpoint.json".to_string(),
            batch_save_interval: 100,
        }
    }
}

/// Progress reporting
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProgressConfig {
    /// Log a progress line every N accepted records
    pub log_every: u32,

    /// Period of the background progress reporter (seconds, 0 disables it)
    pub interval_secs: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            log_every: 10,
            interval_secs: 60,
        }
    }
}
