use thiserror::Error;

/// Whether a failed call is worth repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeouts, connection failures, 5xx, explicit throttling
    Transient,

    /// Not found, unauthorized, malformed data
    Permanent,
}

/// Errors returned by the GitHub API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP 429, or 403 with an exhausted quota.
    #[error("rate limited at {url} (HTTP {status})")]
    RateLimited { url: String, status: u16 },

    #[error("server error {status} from {url}")]
    Server { url: String, status: u16 },

    #[error("resource not found: {url}")]
    NotFound { url: String },

    /// HTTP 401: the token was rejected.
    #[error("unauthorized request to {url}")]
    Unauthorized { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Classifies the failure for the retry loop
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Http { source, .. } => {
                if source.is_builder() || source.is_decode() || source.is_redirect() {
                    FailureKind::Permanent
                } else {
                    FailureKind::Transient
                }
            }
            Self::RateLimited { .. } | Self::Server { .. } => FailureKind::Transient,
            Self::NotFound { .. }
            | Self::Unauthorized { .. }
            | Self::UnexpectedStatus { .. }
            | Self::Deserialize { .. }
            | Self::InvalidUrl(_)
            | Self::InvalidHeader(_)
            | Self::Client(_) => FailureKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }

    /// Returns true for failures that say something about the endpoint or the
    /// credential rather than about one candidate.
    ///
    /// A deleted user (404) or an odd profile body must not count towards
    /// aborting the run.
    pub fn trips_circuit(&self) -> bool {
        self.is_transient() || matches!(self, Self::Unauthorized { .. })
    }
}
