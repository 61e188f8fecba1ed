//! GitHub checks API client.
//!
//! The poll scheduler only sees the [`ChecksProvider`] trait; this module
//! supplies the octocrab implementation behind it.
//!
//! Key features:
//! - Exponential backoff retry for transient failures
//! - Distinguishes transient vs permanent errors
//! - Branch names are URL-encoded into a single path segment

mod client;
mod error;
mod provider;
mod retry;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use provider::ChecksProvider;
pub use retry::{RetryConfig, retry_with_backoff};
