use crate::api::{ApiError, GithubClient};
use crate::config::SearchConfig;

/// Position of the next search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCursor {
    pub query_index: usize,
    pub query: String,
    pub page: u32,
}

/// Walks the configured queries in order, one page at a time
///
/// A query is abandoned when a page comes back short of `per_page`, when
/// `max_pages` pages have been read, or when the caller reports a failure
/// with [`Paginator::skip_query`].
#[derive(Debug, Clone)]
pub struct Paginator {
    queries: Vec<String>,
    query_index: usize,
    page: u32,
    max_pages: u32,
    per_page: u32,
}

impl Paginator {
    /// Creates a paginator positioned at page 1 of the first query
    ///
    /// # Arguments
    ///
    /// * `queries` - Search queries, visited in order
    /// * `max_pages` - Page ceiling per query
    /// * `per_page` - Page size requested from the API; a shorter page is the last one
    pub fn new(queries: Vec<String>, max_pages: u32, per_page: u32) -> Self {
        Self {
            queries,
            query_index: 0,
            page: 1,
            max_pages,
            per_page,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.queries.clone(), config.max_pages, config.per_page)
    }

    /// The next page to request, or `None` once every query is exhausted
    pub fn current(&self) -> Option<SearchCursor> {
        let query = self.queries.get(self.query_index)?;
        Some(SearchCursor {
            query_index: self.query_index,
            query: query.clone(),
            page: self.page,
        })
    }

    /// Advances past the current page, which returned `returned` candidates
    pub fn record_page(&mut self, returned: usize) {
        if self.is_exhausted() {
            return;
        }
        let short = u32::try_from(returned).map_or(false, |n| n < self.per_page);
        if returned == 0 || short || self.page >= self.max_pages {
            self.skip_query();
        } else {
            self.page += 1;
        }
    }

    /// Moves on to page 1 of the next query
    pub fn skip_query(&mut self) {
        if self.is_exhausted() {
            return;
        }
        self.query_index += 1;
        self.page = 1;
    }

    pub fn is_exhausted(&self) -> bool {
        self.query_index >= self.queries.len()
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }
}

/// Runs one user search and returns the logins on the page, in API order
///
/// # Arguments
///
/// * `client` - The rate-limited GitHub client
/// * `cursor` - Query and page to request
/// * `config` - Page size and sort settings
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Logins on the page, possibly empty
/// * `Err(ApiError)` - The search failed after the client's retries
pub async fn search(
    client: &GithubClient,
    cursor: &SearchCursor,
    config: &SearchConfig,
) -> Result<Vec<String>, ApiError> {
    let page = client
        .search_users(
            &cursor.query,
            cursor.page,
            config.per_page,
            &config.sort,
            &config.order,
        )
        .await?;

    if page.incomplete_results {
        tracing::debug!(
            query = %cursor.query,
            page = cursor.page,
            "Search returned incomplete results"
        );
    }

    Ok(page.items.into_iter().map(|user| user.login).collect())
}
