//! Content retrieval: one file at one revision, with endpoint fallbacks.
//!
//! The host exposes the same file content through several endpoints that
//! fail in different ways (structured fetch by repository name, the same
//! fetch by internal repository id, and a raw-text fetch). The retriever
//! tries them in order; first success wins. When every attempt fails the
//! snapshot comes back with absent content and the pipeline renders a
//! placeholder for that file instead of aborting.

use crate::host::{HostError, PullRequestHost};
use crate::models::{FileSnapshot, PullRequestRef};

/// Fetch the text of `path` at `revision`.
///
/// Only authentication failure propagates; every other failure mode
/// degrades to `content: None`.
pub async fn fetch_snapshot(
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
    path: &str,
    revision: &str,
) -> Result<FileSnapshot, HostError> {
    match host.get_file_content(pr, path, revision).await {
        Ok(content) => return Ok(found(path, revision, content)),
        Err(err) if err.is_fatal() => return Err(err),
        Err(_) => {}
    }

    match host.get_file_content_by_repo_id(pr, path, revision).await {
        Ok(content) => return Ok(found(path, revision, content)),
        Err(err) if err.is_fatal() => return Err(err),
        Err(_) => {}
    }

    match host.get_file_content_raw(pr, path, revision).await {
        Ok(content) => Ok(found(path, revision, content)),
        Err(err) if err.is_fatal() => Err(err),
        Err(_) => Ok(FileSnapshot::absent(path, revision)),
    }
}

fn found(path: &str, revision: &str, content: String) -> FileSnapshot {
    FileSnapshot {
        path: path.to_string(),
        revision: revision.to_string(),
        content: Some(content),
    }
}
