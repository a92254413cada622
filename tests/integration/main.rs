//! Integration tests for the GitHub client and the collection loop
//!
//! These tests use wiremock to stand in for the GitHub API and tempfile
//! directories for checkpoints and batches.

mod client_tests;
mod collector_tests;
