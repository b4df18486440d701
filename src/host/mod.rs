//! Host API abstraction: the typed interface over the PR metadata API.
//!
//! The pipeline only ever talks to [`PullRequestHost`], so tests can run
//! against a mock implementation without a network. The concrete REST
//! client lives in [`rest`].

pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ChangeEntry, PullRequestInfo, PullRequestRef};

/// Errors from host API calls.
#[derive(Error, Debug)]
pub enum HostError {
    /// 401/403 — fatal, surfaced verbatim, no fallback attempted.
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status other than 401/403.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body did not have the expected JSON shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// The client was constructed without what this host variant needs.
    #[error("host configuration error: {0}")]
    Config(String),
}

impl HostError {
    /// Whether this error must abort the whole run rather than fall
    /// through to the next strategy or attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HostError::Auth { .. })
    }
}

/// Opaque credentials accepted by the host.
///
/// Acquisition and refresh are the caller's concern.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Personal access token, sent as HTTP Basic with an empty user.
    Pat(String),
    /// OAuth bearer token.
    Bearer(String),
    /// No credentials (public projects only).
    Anonymous,
}

/// Typed async interface over the PR metadata API.
///
/// Each operation returns host-specific data reduced to what the
/// pipeline needs: file paths, change-type codes, and raw file text.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Fetch title, description, and branch pair for one pull request.
    async fn get_pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestInfo, HostError>;

    /// List iteration ids for the pull request, ascending.
    async fn list_iterations(&self, pr: &PullRequestRef) -> Result<Vec<u32>, HostError>;

    /// Fetch the change entries recorded for one iteration.
    async fn get_iteration_changes(
        &self,
        pr: &PullRequestRef,
        iteration: u32,
    ) -> Result<Vec<ChangeEntry>, HostError>;

    /// List commit ids on the pull request's source branch.
    async fn list_commits(&self, pr: &PullRequestRef) -> Result<Vec<String>, HostError>;

    /// Fetch the change entries for one commit.
    async fn get_commit_changes(
        &self,
        pr: &PullRequestRef,
        commit: &str,
    ) -> Result<Vec<ChangeEntry>, HostError>;

    /// Diff the source branch against the target branch directly.
    async fn diff_branches(
        &self,
        pr: &PullRequestRef,
        source: &str,
        target: &str,
    ) -> Result<Vec<ChangeEntry>, HostError>;

    /// Structured content fetch keyed by the named repository identifier.
    async fn get_file_content(
        &self,
        pr: &PullRequestRef,
        path: &str,
        revision: &str,
    ) -> Result<String, HostError>;

    /// Same request keyed by the alternate internal repository identifier.
    async fn get_file_content_by_repo_id(
        &self,
        pr: &PullRequestRef,
        path: &str,
        revision: &str,
    ) -> Result<String, HostError>;

    /// Raw-text fetch with `Accept: text/plain` content negotiation.
    async fn get_file_content_raw(
        &self,
        pr: &PullRequestRef,
        path: &str,
        revision: &str,
    ) -> Result<String, HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auth_errors_are_fatal() {
        let auth = HostError::Auth {
            status: 401,
            message: "bad token".into(),
        };
        assert!(auth.is_fatal());

        let status = HostError::Status {
            status: 500,
            url: "https://example.test".into(),
        };
        assert!(!status.is_fatal());

        let decode = HostError::Decode("missing field".into());
        assert!(!decode.is_fatal());
    }
}
