//! REST implementation of [`PullRequestHost`].
//!
//! Builds URLs from the [`PullRequestRef`] and [`HostVariant`], shares one
//! `reqwest::Client` across calls, and memoizes the repository's internal
//! identifier so the alternate content endpoint costs one metadata call
//! per client at most.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::constants::{API_VERSION, USER_AGENT};
use crate::host::{Credentials, HostError, PullRequestHost};
use crate::models::{ChangeEntry, ChangeType, HostVariant, PullRequestInfo, PullRequestRef};

/// Per-request timeout. Callers impose overall deadlines externally.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client for the PR metadata API.
pub struct RestHost {
    client: reqwest::Client,
    credentials: Credentials,
    /// Collection URL for on-premises hosts (e.g. `https://tfs.example.com/tfs`).
    server_url: Option<String>,
    /// Memoized internal repository identifier.
    repo_id: OnceCell<String>,
}

impl RestHost {
    /// Create a client. `server_url` is required for [`HostVariant::Server`]
    /// references and ignored for cloud ones.
    pub fn new(credentials: Credentials, server_url: Option<String>) -> Result<Self, HostError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            credentials,
            server_url,
            repo_id: OnceCell::new(),
        })
    }

    /// Base collection URL for the given reference.
    fn base_url(&self, pr: &PullRequestRef) -> Result<String, HostError> {
        match pr.host_variant {
            HostVariant::Cloud => Ok(format!("https://dev.azure.com/{}", pr.organization)),
            HostVariant::Server => {
                let url = self.server_url.as_deref().ok_or_else(|| {
                    HostError::Config("server host variant requires a server URL".into())
                })?;
                Ok(format!("{}/{}", url.trim_end_matches('/'), pr.organization))
            }
        }
    }

    /// `.../{project}/_apis/git/repositories/{repo}` for the named repository.
    fn repo_api(&self, pr: &PullRequestRef) -> Result<String, HostError> {
        Ok(format!(
            "{}/{}/_apis/git/repositories/{}",
            self.base_url(pr)?,
            pr.project,
            pr.repository
        ))
    }

    /// Same API root but keyed by the internal repository identifier.
    async fn repo_api_by_id(&self, pr: &PullRequestRef) -> Result<String, HostError> {
        let id = self
            .repo_id
            .get_or_try_init(|| self.fetch_repo_id(pr))
            .await?;
        Ok(format!(
            "{}/{}/_apis/git/repositories/{}",
            self.base_url(pr)?,
            pr.project,
            id
        ))
    }

    async fn fetch_repo_id(&self, pr: &PullRequestRef) -> Result<String, HostError> {
        let url = self.repo_api(pr)?;
        let resp: RepositoryResponse = self.get_json(&url, &[]).await?;
        Ok(resp.id)
    }

    /// Apply credentials to a request builder.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Credentials::Pat(pat) => builder.basic_auth("", Some(pat)),
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::Anonymous => builder,
        }
    }

    /// GET a JSON endpoint, mapping 401/403 to [`HostError::Auth`].
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, HostError> {
        let request = self
            .authorize(self.client.get(url))
            .query(&[("api-version", API_VERSION)])
            .query(query);
        let resp = check_status(request.send().await?).await?;
        resp.json::<T>()
            .await
            .map_err(|e| HostError::Decode(e.to_string()))
    }

    /// Build the version-descriptor query for an item fetch.
    fn item_query<'a>(path: &'a str, revision: &'a str) -> Vec<(&'static str, &'a str)> {
        vec![
            ("path", path),
            ("includeContent", "true"),
            ("versionDescriptor.version", revision),
            ("versionDescriptor.versionType", version_type(revision)),
        ]
    }

    async fn fetch_item_content(
        &self,
        api_root: &str,
        path: &str,
        revision: &str,
    ) -> Result<String, HostError> {
        let url = format!("{api_root}/items");
        let resp: ItemContentResponse = self
            .get_json(&url, &Self::item_query(path, revision))
            .await?;
        resp.content
            .ok_or_else(|| HostError::Decode(format!("no text content for {path}")))
    }
}

#[async_trait]
impl PullRequestHost for RestHost {
    async fn get_pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestInfo, HostError> {
        let url = format!("{}/pullRequests/{}", self.repo_api(pr)?, pr.pull_request_id);
        let resp: PullRequestResponse = self.get_json(&url, &[]).await?;
        Ok(PullRequestInfo {
            title: resp.title.unwrap_or_default(),
            description: resp.description.unwrap_or_default(),
            source_branch: strip_ref(&resp.source_ref_name).to_string(),
            target_branch: strip_ref(&resp.target_ref_name).to_string(),
            source_commit: resp.last_merge_source_commit.map(|c| c.commit_id),
            target_commit: resp.last_merge_target_commit.map(|c| c.commit_id),
        })
    }

    async fn list_iterations(&self, pr: &PullRequestRef) -> Result<Vec<u32>, HostError> {
        let url = format!(
            "{}/pullRequests/{}/iterations",
            self.repo_api(pr)?,
            pr.pull_request_id
        );
        let resp: ListResponse<IterationEntry> = self.get_json(&url, &[]).await?;
        let mut ids: Vec<u32> = resp.value.into_iter().map(|it| it.id).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn get_iteration_changes(
        &self,
        pr: &PullRequestRef,
        iteration: u32,
    ) -> Result<Vec<ChangeEntry>, HostError> {
        let url = format!(
            "{}/pullRequests/{}/iterations/{}/changes",
            self.repo_api(pr)?,
            pr.pull_request_id,
            iteration
        );
        let resp: IterationChangesResponse = self.get_json(&url, &[]).await?;
        Ok(map_change_entries(resp.change_entries))
    }

    async fn list_commits(&self, pr: &PullRequestRef) -> Result<Vec<String>, HostError> {
        let url = format!(
            "{}/pullRequests/{}/commits",
            self.repo_api(pr)?,
            pr.pull_request_id
        );
        let resp: ListResponse<CommitEntry> = self.get_json(&url, &[]).await?;
        Ok(resp.value.into_iter().map(|c| c.commit_id).collect())
    }

    async fn get_commit_changes(
        &self,
        pr: &PullRequestRef,
        commit: &str,
    ) -> Result<Vec<ChangeEntry>, HostError> {
        let url = format!("{}/commits/{}/changes", self.repo_api(pr)?, commit);
        let resp: ChangesResponse = self.get_json(&url, &[]).await?;
        Ok(map_change_entries(resp.changes))
    }

    async fn diff_branches(
        &self,
        pr: &PullRequestRef,
        source: &str,
        target: &str,
    ) -> Result<Vec<ChangeEntry>, HostError> {
        let url = format!("{}/diffs/commits", self.repo_api(pr)?);
        let resp: ChangesResponse = self
            .get_json(&url, &[("baseVersion", target), ("targetVersion", source)])
            .await?;
        Ok(map_change_entries(resp.changes))
    }

    async fn get_file_content(
        &self,
        pr: &PullRequestRef,
        path: &str,
        revision: &str,
    ) -> Result<String, HostError> {
        let api_root = self.repo_api(pr)?;
        self.fetch_item_content(&api_root, path, revision).await
    }

    async fn get_file_content_by_repo_id(
        &self,
        pr: &PullRequestRef,
        path: &str,
        revision: &str,
    ) -> Result<String, HostError> {
        let api_root = self.repo_api_by_id(pr).await?;
        self.fetch_item_content(&api_root, path, revision).await
    }

    async fn get_file_content_raw(
        &self,
        pr: &PullRequestRef,
        path: &str,
        revision: &str,
    ) -> Result<String, HostError> {
        let url = format!("{}/items", self.repo_api(pr)?);
        let request = self
            .authorize(self.client.get(&url))
            .header(reqwest::header::ACCEPT, "text/plain")
            .query(&[("api-version", API_VERSION)])
            .query(&Self::item_query(path, revision));
        let resp = check_status(request.send().await?).await?;
        Ok(resp.text().await?)
    }
}

/// Map non-success statuses, separating 401/403 as fatal auth failures.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, HostError> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let message = resp.text().await.unwrap_or_default();
        return Err(HostError::Auth {
            status: status.as_u16(),
            message,
        });
    }
    if !status.is_success() {
        return Err(HostError::Status {
            status: status.as_u16(),
            url: resp.url().to_string(),
        });
    }
    Ok(resp)
}

/// Strip the `refs/heads/` prefix from a branch ref name.
fn strip_ref(ref_name: &str) -> &str {
    ref_name.strip_prefix("refs/heads/").unwrap_or(ref_name)
}

/// Classify a revision string as a commit sha or a branch name.
fn version_type(revision: &str) -> &'static str {
    let is_sha = revision.len() == 40 && revision.bytes().all(|b| b.is_ascii_hexdigit());
    if is_sha { "commit" } else { "branch" }
}

/// Reduce host change entries to our model: folders and entries without a
/// resolvable path are dropped.
fn map_change_entries(entries: Vec<ChangeEntryJson>) -> Vec<ChangeEntry> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let item = entry.item?;
            if item.is_folder.unwrap_or(false) || item.git_object_type.as_deref() == Some("tree") {
                return None;
            }
            let path = item.path.filter(|p| !p.is_empty())?;
            let change_type = entry
                .change_type
                .as_deref()
                .map(ChangeType::from_host_code)
                .unwrap_or(ChangeType::Edit);
            let original_path = entry.original_path.or(entry.source_server_item);
            Some(ChangeEntry {
                path,
                change_type,
                original_path,
            })
        })
        .collect()
}

// ── Host JSON shapes ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestResponse {
    title: Option<String>,
    description: Option<String>,
    source_ref_name: String,
    target_ref_name: String,
    last_merge_source_commit: Option<CommitRef>,
    last_merge_target_commit: Option<CommitRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitRef {
    commit_id: String,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    value: Vec<T>,
}

#[derive(Deserialize)]
struct IterationEntry {
    id: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitEntry {
    commit_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IterationChangesResponse {
    #[serde(default)]
    change_entries: Vec<ChangeEntryJson>,
}

#[derive(Deserialize)]
struct ChangesResponse {
    #[serde(default)]
    changes: Vec<ChangeEntryJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeEntryJson {
    change_type: Option<String>,
    item: Option<ItemRef>,
    original_path: Option<String>,
    source_server_item: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRef {
    path: Option<String>,
    git_object_type: Option<String>,
    is_folder: Option<bool>,
}

#[derive(Deserialize)]
struct ItemContentResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RepositoryResponse {
    id: String,
}
