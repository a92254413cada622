//! Response types for the GitHub REST endpoints the collector calls
//!
//! Only the fields the classifier reads are modeled; unknown fields are ignored.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// One page of `GET /search/users`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<SearchUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchUser {
    pub login: String,
}

/// `GET /users/{login}`
///
/// GitHub sends `""` for a cleared blog or bio; those arrive here as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub login: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub blog: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Entry of `GET /users/{login}/repos`
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub html_url: String,
}

/// `GET /repos/{owner}/{repo}/languages`, ordered by byte count
///
/// Ties are broken by language name so the order never depends on JSON key
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageBreakdown {
    entries: Vec<(String, u64)>,
}

impl LanguageBreakdown {
    pub fn new(bytes_by_language: HashMap<String, u64>) -> Self {
        let mut entries: Vec<(String, u64)> = bytes_by_language.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self { entries }
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for LanguageBreakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        HashMap::<String, u64>::deserialize(deserializer).map(Self::new)
    }
}

/// `GET /rate_limit`
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitOverview {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitWindow,
    #[serde(default)]
    pub search: Option<RateLimitWindow>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimitWindow {
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
