//! Change-set discovery: ordered fallback strategy chain.
//!
//! Three strategies are tried in decreasing order of specificity:
//! iteration changes, per-commit changes, and a direct branch diff.
//! The first non-empty result wins. HTTP failures inside a strategy mean
//! "this strategy produced nothing"; only authentication failure (or
//! every strategy failing outright) is a hard error.

use indexmap::IndexMap;
use thiserror::Error;

use crate::host::{HostError, PullRequestHost};
use crate::models::{ChangeEntry, PullRequestInfo, PullRequestRef};

/// Errors from change-set discovery.
#[derive(Error, Debug)]
pub enum DiscoverError {
    /// Authentication failure short-circuits the chain.
    #[error(transparent)]
    Auth(HostError),

    /// Every strategy failed with an actual error (none came back empty).
    #[error("all {attempted} discovery strategies failed; last error: {last}")]
    AllStrategiesFailed { attempted: usize, last: HostError },
}

/// Tagged result of one discovery strategy.
#[derive(Debug)]
enum StrategyOutcome {
    Found(Vec<ChangeEntry>),
    Empty,
    Failed(HostError),
}

/// Discover the changed-file list for a pull request.
///
/// Returns a de-duplicated, ordered list, or an empty list when every
/// strategy legitimately found nothing (the caller renders an explicit
/// "no changes detected" blob for that case).
pub async fn discover_changes(
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
    info: &PullRequestInfo,
) -> Result<Vec<ChangeEntry>, DiscoverError> {
    let mut failures: Vec<HostError> = Vec::new();
    let mut attempted = 0usize;
    let mut saw_empty = false;

    for strategy in [Strategy::Iterations, Strategy::Commits, Strategy::BranchDiff] {
        attempted += 1;
        match run_strategy(strategy, host, pr, info).await {
            StrategyOutcome::Found(entries) => return Ok(dedupe(entries)),
            StrategyOutcome::Empty => saw_empty = true,
            StrategyOutcome::Failed(err) if err.is_fatal() => {
                return Err(DiscoverError::Auth(err));
            }
            StrategyOutcome::Failed(err) => failures.push(err),
        }
    }

    if saw_empty {
        // At least one strategy genuinely found nothing changed.
        return Ok(Vec::new());
    }

    let last = failures
        .pop()
        .unwrap_or(HostError::Decode("no strategies ran".into()));
    Err(DiscoverError::AllStrategiesFailed { attempted, last })
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    Iterations,
    Commits,
    BranchDiff,
}

async fn run_strategy(
    strategy: Strategy,
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
    info: &PullRequestInfo,
) -> StrategyOutcome {
    let result = match strategy {
        Strategy::Iterations => iteration_changes(host, pr).await,
        Strategy::Commits => commit_changes(host, pr).await,
        Strategy::BranchDiff => {
            host.diff_branches(pr, &info.source_branch, &info.target_branch)
                .await
        }
    };
    match result {
        Ok(entries) if entries.is_empty() => StrategyOutcome::Empty,
        Ok(entries) => StrategyOutcome::Found(entries),
        Err(err) => StrategyOutcome::Failed(err),
    }
}

/// Strategy 1: changes recorded on the latest PR iteration.
async fn iteration_changes(
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
) -> Result<Vec<ChangeEntry>, HostError> {
    let iterations = host.list_iterations(pr).await?;
    let Some(latest) = iterations.last().copied() else {
        return Ok(Vec::new());
    };
    host.get_iteration_changes(pr, latest).await
}

/// Strategy 2: union of per-commit changes, first occurrence wins.
async fn commit_changes(
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
) -> Result<Vec<ChangeEntry>, HostError> {
    let commits = host.list_commits(pr).await?;
    let mut by_path: IndexMap<String, ChangeEntry> = IndexMap::new();
    for commit in &commits {
        for entry in host.get_commit_changes(pr, commit).await? {
            by_path.entry(entry.path.clone()).or_insert(entry);
        }
    }
    Ok(by_path.into_values().collect())
}

/// De-duplicate by path, preserving first-seen order. Entries without a
/// resolvable path are dropped.
fn dedupe(entries: Vec<ChangeEntry>) -> Vec<ChangeEntry> {
    let mut by_path: IndexMap<String, ChangeEntry> = IndexMap::new();
    for entry in entries {
        if entry.path.is_empty() {
            continue;
        }
        by_path.entry(entry.path.clone()).or_insert(entry);
    }
    by_path.into_values().collect()
}
