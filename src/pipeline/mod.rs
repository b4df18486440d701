//! Per-invocation synthesis pipeline.
//!
//! Discoverer → (per file) Retriever × 2 → Differ → Encoder, with the
//! budget ledger charged in file-processing order. Files are processed
//! sequentially; per-file failures degrade to placeholder sections and
//! only authentication failures abort the run.

use thiserror::Error;

use crate::budget::{self, BudgetLedger};
use crate::constants::{CONTEXT_LINES, FULL_FILE_MAX_LINES, GLOBAL_BUDGET, MAX_FILES, PER_FILE_LIMIT};
use crate::diff::{self, encode};
use crate::discover::{self, DiscoverError};
use crate::host::{HostError, PullRequestHost};
use crate::models::{
    ChangeEntry, ChangeType, DiffBlob, DiffMode, FileDiff, PullRequestInfo, PullRequestRef,
};
use crate::retrieve;

/// Errors that abort a synthesis run.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("change discovery failed: {0}")]
    Discovery(#[from] DiscoverError),
}

/// Knobs for one synthesis run. Defaults come from `constants`.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub mode: DiffMode,
    /// Global character budget for the serialized blob.
    pub budget: usize,
    /// Maximum number of files attempted.
    pub max_files: usize,
    /// Per-file cap on a rendered section, in characters.
    pub per_file_limit: usize,
    /// Context lines kept around each change in changes-context mode.
    pub context_lines: usize,
    /// Line cap for full-file mode.
    pub full_file_max_lines: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            mode: DiffMode::default(),
            budget: GLOBAL_BUDGET,
            max_files: MAX_FILES,
            per_file_limit: PER_FILE_LIMIT,
            context_lines: CONTEXT_LINES,
            full_file_max_lines: FULL_FILE_MAX_LINES,
        }
    }
}

impl SynthesisOptions {
    /// Stable string over every knob that shapes the blob. Cache keys fold
    /// this in so runs with different options never collide.
    pub fn fingerprint(&self) -> String {
        format!(
            "{:?}:{}:{}:{}:{}:{}",
            self.mode,
            self.budget,
            self.max_files,
            self.per_file_limit,
            self.context_lines,
            self.full_file_max_lines,
        )
    }
}

/// Run the full pipeline for one pull request.
///
/// The returned blob never exceeds `opts.budget` characters; omissions
/// are always marked in the text.
pub async fn synthesize(
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
    opts: &SynthesisOptions,
) -> Result<DiffBlob, SynthesisError> {
    let info = host.get_pull_request(pr).await?;
    synthesize_with_info(host, pr, &info, opts).await
}

/// Run the pipeline with already-fetched PR metadata. Lets callers that
/// need the metadata up front (e.g. for cache keys) avoid a second fetch.
pub async fn synthesize_with_info(
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
    info: &PullRequestInfo,
    opts: &SynthesisOptions,
) -> Result<DiffBlob, SynthesisError> {
    let entries = discover::discover_changes(host, pr, info).await?;

    if entries.is_empty() {
        let mut text = encode::render_header(info, 0);
        text.push_str(encode::NO_CHANGES);
        text.push('\n');
        return Ok(DiffBlob {
            text: clamp_chars(text, opts.budget),
            files_emitted: 0,
            files_omitted: 0,
        });
    }

    let total = entries.len();
    let (selected, capped) = budget::order_entries(entries, opts.max_files);

    // Worst-case truncation marker size is reserved up front so a marker
    // always fits when files end up omitted.
    let reserve = encode::render_truncation(total).chars().count();

    let mut ledger = BudgetLedger::new(opts.budget);
    ledger.skip(capped);

    let header = clamp_chars(
        encode::render_header(info, total),
        opts.budget.saturating_sub(reserve),
    );
    ledger.charge_fixed(&header);

    let mut text = header;
    for (idx, entry) in selected.iter().enumerate() {
        let section = build_file_section(host, pr, info, entry, opts).await?;
        if !ledger.try_charge(&section, reserve) {
            ledger.skip(selected.len() - idx);
            break;
        }
        text.push_str(&section);
    }

    if ledger.omitted() > 0 {
        let marker = encode::render_truncation(ledger.omitted());
        ledger.charge_fixed(&marker);
        text.push_str(&marker);
    }

    // A budget smaller than the marker itself still holds the size
    // invariant; the marker gets cut in that case.
    Ok(DiffBlob {
        text: clamp_chars(text, opts.budget),
        files_emitted: ledger.emitted(),
        files_omitted: ledger.omitted(),
    })
}

/// Retrieve, diff, and render one file. Absent content on any needed side
/// renders a placeholder section instead of failing the run.
async fn build_file_section(
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
    info: &PullRequestInfo,
    entry: &ChangeEntry,
    opts: &SynthesisOptions,
) -> Result<String, HostError> {
    let head_rev = info.head_revision();
    let base_rev = info.base_revision();
    let base_path = entry.original_path.as_deref().unwrap_or(&entry.path);

    let (old, new) = match entry.change_type {
        ChangeType::Add => {
            let head = retrieve::fetch_snapshot(host, pr, &entry.path, head_rev).await?;
            match head.content {
                Some(content) => (String::new(), content),
                None => return Ok(encode::render_placeholder(entry)),
            }
        }
        ChangeType::Delete => {
            let base = retrieve::fetch_snapshot(host, pr, base_path, base_rev).await?;
            match base.content {
                Some(content) => (content, String::new()),
                None => return Ok(encode::render_placeholder(entry)),
            }
        }
        ChangeType::Edit | ChangeType::Rename => {
            let base = retrieve::fetch_snapshot(host, pr, base_path, base_rev).await?;
            let head = retrieve::fetch_snapshot(host, pr, &entry.path, head_rev).await?;
            match (base.content, head.content) {
                (Some(old), Some(new)) => (old, new),
                _ => return Ok(encode::render_placeholder(entry)),
            }
        }
    };

    let ops = diff::compute_ops(
        &old,
        &new,
        opts.mode,
        opts.context_lines,
        opts.full_file_max_lines,
    );
    let file_diff = FileDiff::new(
        entry.path.clone(),
        entry.change_type,
        entry.original_path.clone(),
        ops,
    );
    Ok(encode::render_section(&file_diff, opts.per_file_limit))
}

fn clamp_chars(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        text
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_constants() {
        let opts = SynthesisOptions::default();
        assert_eq!(opts.budget, GLOBAL_BUDGET);
        assert_eq!(opts.max_files, MAX_FILES);
        assert_eq!(opts.mode, DiffMode::ChangesContext);
    }

    #[test]
    fn fingerprint_tracks_every_knob() {
        let base = SynthesisOptions::default();
        assert_eq!(base.fingerprint(), SynthesisOptions::default().fingerprint());

        let variants = [
            SynthesisOptions {
                mode: DiffMode::FullFile,
                ..SynthesisOptions::default()
            },
            SynthesisOptions {
                budget: 500,
                ..SynthesisOptions::default()
            },
            SynthesisOptions {
                max_files: 1,
                ..SynthesisOptions::default()
            },
            SynthesisOptions {
                per_file_limit: 100,
                ..SynthesisOptions::default()
            },
            SynthesisOptions {
                context_lines: 9,
                ..SynthesisOptions::default()
            },
            SynthesisOptions {
                full_file_max_lines: 10,
                ..SynthesisOptions::default()
            },
        ];
        for variant in variants {
            assert_ne!(base.fingerprint(), variant.fingerprint());
        }
    }

    #[test]
    fn clamp_chars_respects_char_boundaries() {
        assert_eq!(clamp_chars("ééééé".into(), 3), "ééé");
        assert_eq!(clamp_chars("abc".into(), 10), "abc");
    }
}
