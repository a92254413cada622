use crate::api::{LanguageBreakdown, Repository, UserProfile};
use crate::classify::record::{ProfileRecord, TopRepo};
use crate::classify::scoring::{
    account_age_years, experience_level, proficiency_score, proficiency_tier,
};
use crate::classify::skills::extract_skills;
use crate::config::ClassifierConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fmt;

/// Everything fetched for one candidate
#[derive(Debug, Clone)]
pub struct FetchedProfile {
    pub profile: UserProfile,
    pub repos: Vec<Repository>,

    /// Language breakdowns keyed by repository name
    pub languages: HashMap<String, LanguageBreakdown>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No bio and too few public repositories
    IncompleteProfile,

    /// No email, company, location, or blog and too few public repositories
    NoContactSignal,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncompleteProfile => "incomplete profile",
            Self::NoContactSignal => "no contact signal",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Accept(ProfileRecord),
    Reject(RejectReason),
}

/// Turns fetched profile data into resume records
///
/// Classification is deterministic: the same input and `now` always give the
/// same result.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Applies the rejection rules to a bare profile
    ///
    /// The bio rule is checked before the contact rule.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The profile is worth fetching repositories for
    /// * `Err(RejectReason)` - The first rule the profile fails
    pub fn screen(&self, profile: &UserProfile) -> Result<(), RejectReason> {
        let has_bio = profile.bio.as_deref().is_some_and(|b| !b.trim().is_empty());
        if !has_bio && profile.public_repos < self.config.min_repos_without_bio {
            return Err(RejectReason::IncompleteProfile);
        }

        let has_contact = [
            &profile.email,
            &profile.company,
            &profile.location,
            &profile.blog,
        ]
        .iter()
        .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()));
        if !has_contact && profile.public_repos < self.config.min_repos_without_contact {
            return Err(RejectReason::NoContactSignal);
        }

        Ok(())
    }

    /// Repositories whose language breakdown should be fetched: the most
    /// starred first, ties in listing order
    pub fn breakdown_targets<'a>(&self, repos: &'a [Repository]) -> Vec<&'a Repository> {
        let mut by_stars: Vec<&Repository> = repos.iter().collect();
        by_stars.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
        by_stars.truncate(self.config.breakdown_top_n);
        by_stars
    }

    /// Turns a fully fetched candidate into a record, or rejects it
    ///
    /// # Arguments
    ///
    /// * `fetched` - Profile, repositories, and the breakdowns that could be fetched
    /// * `now` - Reference time for account age and `collected_at`
    ///
    /// # Returns
    ///
    /// * `Classification::Accept(ProfileRecord)` - The candidate passed screening
    /// * `Classification::Reject(RejectReason)` - The first rule the profile fails
    pub fn classify(&self, fetched: &FetchedProfile, now: DateTime<Utc>) -> Classification {
        let profile = &fetched.profile;
        if let Err(reason) = self.screen(profile) {
            return Classification::Reject(reason);
        }

        let targets = self.breakdown_targets(&fetched.repos);
        let breakdowns: Vec<&LanguageBreakdown> = targets
            .iter()
            .filter_map(|repo| fetched.languages.get(&repo.name))
            .collect();
        let skills = extract_skills(&fetched.repos, &breakdowns, self.config.max_skills);

        let total_stars: u64 = fetched
            .repos
            .iter()
            .map(|r| u64::from(r.stargazers_count))
            .sum();

        let score = proficiency_score(
            &self.config.proficiency,
            profile.public_repos,
            total_stars,
            skills.len(),
        );
        let popularity = u64::from(profile.followers) + total_stars;
        let age = account_age_years(profile.created_at.as_deref(), now);

        let mut top: Vec<&Repository> = fetched.repos.iter().collect();
        top.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
        let top_repos = top
            .into_iter()
            .take(self.config.top_repos)
            .map(|repo| TopRepo {
                name: repo.name.clone(),
                description: repo.description.clone(),
                language: repo.language.clone(),
                stars: repo.stargazers_count,
                forks: repo.forks_count,
                url: repo.html_url.clone(),
            })
            .collect();

        Classification::Accept(ProfileRecord {
            github_username: profile.login.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            location: profile.location.clone(),
            bio: profile.bio.clone(),
            company: profile.company.clone(),
            blog: profile.blog.clone(),
            github_url: profile.html_url.clone(),
            avatar_url: profile.avatar_url.clone(),
            public_repos: profile.public_repos,
            followers: profile.followers,
            following: profile.following,
            created_at: profile.created_at.clone(),
            updated_at: profile.updated_at.clone(),
            skills,
            proficiency_tier: proficiency_tier(&self.config.proficiency, score),
            experience_level: experience_level(
                &self.config.experience,
                age,
                profile.public_repos,
                popularity,
            ),
            top_repos,
            collected_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}
