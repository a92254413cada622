//! Candidate discovery through GitHub user search

mod paginator;

pub use paginator::{search, Paginator, SearchCursor};
