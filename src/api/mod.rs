//! GitHub API access
//!
//! This module provides the rate-limited HTTP client and the typed responses
//! of the endpoints the collector uses:
//! - User search (`/search/users`)
//! - Profiles (`/users/{login}`)
//! - Repository lists and language breakdowns
//! - The quota overview (`/rate_limit`)

mod client;
mod error;
pub mod quota;
pub mod retry;
mod types;

pub use client::GithubClient;
pub use error::{ApiError, FailureKind};
pub use quota::{QuotaTracker, RateLimitStatus};
pub use types::{
    LanguageBreakdown, RateLimitOverview, RateLimitResources, RateLimitWindow, Repository,
    SearchPage, SearchUser, UserProfile,
};
