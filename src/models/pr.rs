//! Pull-request reference, metadata, and change-set types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which flavour of host the pull request lives on.
///
/// Selects base-URL construction: the hosted service derives the URL from
/// the organization name, while an on-premises server needs an explicit
/// collection URL supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostVariant {
    #[default]
    Cloud,
    Server,
}

impl fmt::Display for HostVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostVariant::Cloud => write!(f, "cloud"),
            HostVariant::Server => write!(f, "server"),
        }
    }
}

/// Immutable reference to one pull request on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub organization: String,
    pub project: String,
    pub repository: String,
    pub pull_request_id: u64,
    pub host_variant: HostVariant,
}

impl PullRequestRef {
    /// Fully-qualified identifier, used for cache keys and log lines.
    pub fn qualified(&self) -> String {
        format!(
            "{}/{}/{}#{}",
            self.organization, self.project, self.repository, self.pull_request_id
        )
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// Header metadata for one pull request, fetched once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub title: String,
    pub description: String,
    /// Source branch name, `refs/heads/` prefix stripped.
    pub source_branch: String,
    /// Target branch name, `refs/heads/` prefix stripped.
    pub target_branch: String,
    /// Head commit of the source branch, when the host exposes it.
    pub source_commit: Option<String>,
    /// Merge-base commit on the target branch, when the host exposes it.
    pub target_commit: Option<String>,
}

impl PullRequestInfo {
    /// Revision descriptor for the head (new) side of a file.
    pub fn head_revision(&self) -> &str {
        self.source_commit.as_deref().unwrap_or(&self.source_branch)
    }

    /// Revision descriptor for the base (old) side of a file.
    pub fn base_revision(&self) -> &str {
        self.target_commit.as_deref().unwrap_or(&self.target_branch)
    }
}

/// How a file changed within a change-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    Add,
    Edit,
    Delete,
    Rename,
}

impl ChangeType {
    /// Map a host-specific change-type code to our model.
    ///
    /// Hosts emit codes like `"edit"`, `"add"`, or combined forms such as
    /// `"edit, rename"`. Unknown codes map to [`ChangeType::Edit`].
    pub fn from_host_code(code: &str) -> Self {
        let code = code.to_ascii_lowercase();
        if code.contains("add") {
            ChangeType::Add
        } else if code.contains("delete") {
            ChangeType::Delete
        } else if code.contains("rename") {
            ChangeType::Rename
        } else {
            ChangeType::Edit
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Add => write!(f, "Add"),
            ChangeType::Edit => write!(f, "Edit"),
            ChangeType::Delete => write!(f, "Delete"),
            ChangeType::Rename => write!(f, "Rename"),
        }
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Add" => Ok(ChangeType::Add),
            "Edit" => Ok(ChangeType::Edit),
            "Delete" => Ok(ChangeType::Delete),
            "Rename" => Ok(ChangeType::Rename),
            // Older blobs used a generic prefix for edits.
            "Change" => Ok(ChangeType::Edit),
            other => Err(format!("unknown change type: '{other}'")),
        }
    }
}

/// One changed file within a change-set.
///
/// `path` is unique within one change-set; entries the host returns
/// without a resolvable path are dropped during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub path: String,
    pub change_type: ChangeType,
    /// Pre-rename path, for rename entries.
    pub original_path: Option<String>,
}

impl ChangeEntry {
    pub fn new(path: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            path: path.into(),
            change_type,
            original_path: None,
        }
    }
}

/// Full text of one file at one revision.
///
/// Transient: owned by the retriever for a single retrieval. `content`
/// is `None` when the file is binary or missing at that revision.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub path: String,
    pub revision: String,
    pub content: Option<String>,
}

impl FileSnapshot {
    /// A snapshot whose content could not be retrieved.
    pub fn absent(path: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            revision: revision.into(),
            content: None,
        }
    }
}
