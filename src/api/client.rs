//! Rate-limited HTTP client for the GitHub REST API
//!
//! Every call goes through the same pipeline:
//!
//! 1. Wait out any pending quota suspension
//! 2. Sleep the configured pacing delay plus random jitter
//! 3. Send the request and read the `X-RateLimit-*` headers
//! 4. Map the status code to an [`ApiError`]
//! 5. Retry transient failures with exponential back-off
//!
//! The client also keeps the consecutive-failure counter that the collector
//! uses as its circuit breaker.

use crate::api::quota::{retry_after, QuotaTracker, RateLimitStatus};
use crate::api::retry::retry_with_backoff;
use crate::api::types::{LanguageBreakdown, RateLimitOverview, Repository, SearchPage, UserProfile};
use crate::api::ApiError;
use crate::config::ApiConfig;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Client for the subset of the GitHub API the collector needs
///
/// Use [`GithubClient::new`] with the configured base URL; integration tests
/// point `base-url` at a wiremock server.
pub struct GithubClient {
    http: Client,
    base_url: Url,
    settings: ApiConfig,
    quota: Mutex<QuotaTracker>,
    consecutive_errors: AtomicU32,
    requests_sent: AtomicU64,
}

impl GithubClient {
    /// Builds a client that authenticates with `token`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] for an unusable base URL,
    /// [`ApiError::InvalidHeader`] if the token cannot be sent as a header,
    /// and [`ApiError::Client`] if reqwest fails to build.
    pub fn new(settings: &ApiConfig, token: &str) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token.trim()))
            .map_err(|_| ApiError::InvalidHeader("GITHUB_TOKEN".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));

        let http = Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(ApiError::Client)?;

        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }

        Ok(Self {
            http,
            base_url,
            quota: Mutex::new(QuotaTracker::new(
                settings.rate_limit_threshold,
                Duration::from_millis(settings.reset_buffer_ms),
            )),
            settings: settings.clone(),
            consecutive_errors: AtomicU32::new(0),
            requests_sent: AtomicU64::new(0),
        })
    }

    /// `GET /rate_limit`
    pub async fn rate_limit(&self) -> Result<RateLimitOverview, ApiError> {
        self.request(&["rate_limit"], &[], "rate_limit").await
    }

    /// `GET /search/users`
    pub async fn search_users(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        sort: &str,
        order: &str,
    ) -> Result<SearchPage, ApiError> {
        let page = page.to_string();
        let per_page = per_page.to_string();
        let params = [
            ("q", query),
            ("per_page", per_page.as_str()),
            ("page", page.as_str()),
            ("sort", sort),
            ("order", order),
        ];
        let context = format!("search/users(q={query}, page={page})");
        self.request(&["search", "users"], &params, &context).await
    }

    /// `GET /users/{login}`
    pub async fn get_user(&self, login: &str) -> Result<UserProfile, ApiError> {
        let context = format!("users/{login}");
        self.request(&["users", login], &[], &context).await
    }

    /// `GET /users/{login}/repos`, most recently updated first
    pub async fn get_user_repos(
        &self,
        login: &str,
        per_page: u32,
    ) -> Result<Vec<Repository>, ApiError> {
        let per_page = per_page.to_string();
        let params = [("per_page", per_page.as_str()), ("sort", "updated")];
        let context = format!("users/{login}/repos");
        self.request(&["users", login, "repos"], &params, &context)
            .await
    }

    /// `GET /repos/{owner}/{repo}/languages`
    pub async fn get_repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<LanguageBreakdown, ApiError> {
        let context = format!("repos/{owner}/{repo}/languages");
        self.request(&["repos", owner, repo, "languages"], &[], &context)
            .await
    }

    /// Length of the quota suspension the next call would wait out, if any
    pub fn pending_suspension(&self) -> Option<Duration> {
        self.lock_quota().pending(Utc::now())
    }

    /// Sleeps until any pending quota suspension has passed
    pub async fn wait_for_quota(&self) {
        loop {
            let pending = self.lock_quota().pending(Utc::now());
            let Some(wait) = pending else {
                self.lock_quota().clear();
                return;
            };
            tracing::info!(
                wait_secs = wait.as_secs_f64(),
                "Rate limit nearly exhausted, waiting for quota reset"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Failures since the last successful call that count towards the circuit breaker
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors.load(Ordering::SeqCst)
    }

    /// True once consecutive failures reach `max-consecutive-errors`
    pub fn circuit_open(&self) -> bool {
        self.consecutive_errors() >= self.settings.max_consecutive_errors
    }

    /// HTTP requests actually put on the wire, retries included
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    /// Most recent quota reading seen in response headers
    pub fn last_rate_limit(&self) -> Option<RateLimitStatus> {
        self.lock_quota().last_status()
    }

    /// Number of quota suspensions scheduled during this session
    pub fn quota_suspensions(&self) -> u64 {
        self.lock_quota().suspensions()
    }

    /// Builds `<base>/<segments...>?<params>` with each segment percent-encoded
    fn build_url(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
        context: &str,
    ) -> Result<T, ApiError> {
        let url = self.build_url(segments, params)?;
        let result = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || self.send_once(&url),
        )
        .await
        .and_then(|body| {
            serde_json::from_slice::<T>(&body).map_err(|source| ApiError::Deserialize {
                context: context.to_string(),
                source,
            })
        });
        self.record_outcome(&result);
        result
    }

    async fn send_once(&self, url: &Url) -> Result<Vec<u8>, ApiError> {
        self.wait_for_quota().await;
        self.pace().await;

        tracing::debug!(url = %url, "GET");
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ApiError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let quota = RateLimitStatus::from_headers(response.headers());
        let retry_after = retry_after(response.headers());
        if let Some(quota) = quota {
            self.observe_quota(quota);
        }

        if status.is_success() {
            let body = response.bytes().await.map_err(|source| ApiError::Http {
                url: url.to_string(),
                source,
            })?;
            return Ok(body.to_vec());
        }

        let exhausted = quota.is_some_and(|q| q.remaining == 0);
        let url = url.to_string();
        let err = match status {
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
                url,
                status: status.as_u16(),
            },
            StatusCode::FORBIDDEN if exhausted || retry_after.is_some() => {
                ApiError::RateLimited {
                    url,
                    status: status.as_u16(),
                }
            }
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { url },
            StatusCode::NOT_FOUND => ApiError::NotFound { url },
            s if s.is_server_error() => ApiError::Server {
                url,
                status: s.as_u16(),
            },
            s => ApiError::UnexpectedStatus {
                url,
                status: s.as_u16(),
            },
        };

        if matches!(err, ApiError::RateLimited { .. }) {
            let now = Utc::now();
            let buffer = Duration::from_millis(self.settings.reset_buffer_ms);
            let wait = match (retry_after, quota) {
                (Some(wait), _) => Some(wait),
                (None, Some(q)) if q.remaining == 0 => Some(q.wait_duration(now, buffer)),
                _ => None,
            };
            if let Some(wait) = wait {
                self.lock_quota().suspend_for(wait, now);
            }
        }

        Err(err)
    }

    fn observe_quota(&self, status: RateLimitStatus) {
        let scheduled = self.lock_quota().observe(status, Utc::now());
        if let Some(wait) = scheduled {
            tracing::warn!(
                remaining = status.remaining,
                reset = status.reset_epoch,
                wait_secs = wait.as_secs_f64(),
                "Rate limit below threshold, suspending until reset"
            );
        }
    }

    /// Fixed delay plus uniform jitter before each request
    async fn pace(&self) {
        let jitter = if self.settings.jitter_ms > 0 {
            rand::random_range(0..=self.settings.jitter_ms)
        } else {
            0
        };
        let delay = self.settings.min_delay_ms + jitter;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn record_outcome<T>(&self, result: &Result<T, ApiError>) {
        match result {
            Ok(_) => self.consecutive_errors.store(0, Ordering::SeqCst),
            Err(err) if err.trips_circuit() => {
                let count = self.consecutive_errors.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::warn!(
                    consecutive_errors = count,
                    max = self.settings.max_consecutive_errors,
                    error = %err,
                    "GitHub API call failed"
                );
            }
            Err(_) => {}
        }
    }

    fn lock_quota(&self) -> MutexGuard<'_, QuotaTracker> {
        self.quota.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
