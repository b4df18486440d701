//! Diff engine: line alignment, mode selection, and the micro-format codec.

pub mod align;
pub mod decode;
pub mod encode;

use crate::models::{DiffMode, LineOp, LineOpKind};

/// Marker emitted where non-adjacent context was collapsed. Part of the
/// blob protocol: the decoder skips it.
pub const ELLIPSIS_MARKER: &str = "...";

/// Produce the LineOp sequence for one file under the given mode.
///
/// `context_lines` applies to [`DiffMode::ChangesContext`];
/// `full_file_cap` to [`DiffMode::FullFile`].
pub fn compute_ops(
    old: &str,
    new: &str,
    mode: DiffMode,
    context_lines: usize,
    full_file_cap: usize,
) -> Vec<LineOp> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    match mode {
        DiffMode::FullFile if !new_lines.is_empty() => new_lines
            .iter()
            .take(full_file_cap)
            .enumerate()
            .map(|(idx, line)| LineOp {
                kind: LineOpKind::Context,
                source_line: None,
                target_line: Some((idx + 1) as u32),
                text: (*line).to_string(),
            })
            .collect(),
        // A deleted file has no new side to dump; fall through to the
        // aligner so the removes still show.
        _ => {
            let ops = align::align(&old_lines, &new_lines);
            match mode {
                DiffMode::ChangesOnly | DiffMode::FullFile => ops
                    .into_iter()
                    .filter(|op| op.kind != LineOpKind::Context)
                    .collect(),
                DiffMode::ChangesContext => select_context(ops, context_lines),
            }
        }
    }
}

/// Keep changes plus `n` surrounding context lines, collapsing skipped
/// runs to an [`ELLIPSIS_MARKER`]. An all-context input yields an empty
/// sequence (the caller renders "no textual changes").
fn select_context(ops: Vec<LineOp>, n: usize) -> Vec<LineOp> {
    let changed: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| op.kind != LineOpKind::Context)
        .map(|(idx, _)| idx)
        .collect();
    if changed.is_empty() {
        return Vec::new();
    }

    let mut keep = vec![false; ops.len()];
    for idx in changed {
        let lo = idx.saturating_sub(n);
        let hi = (idx + n).min(ops.len() - 1);
        for slot in keep.iter_mut().take(hi + 1).skip(lo) {
            *slot = true;
        }
    }

    let mut selected: Vec<LineOp> = Vec::new();
    let mut skipping = false;
    for (idx, op) in ops.into_iter().enumerate() {
        if keep[idx] {
            if skipping {
                selected.push(gap_marker());
                skipping = false;
            }
            selected.push(op);
        } else {
            skipping = true;
        }
    }
    if skipping {
        selected.push(gap_marker());
    }

    selected
}

/// The collapsed-gap marker rides as an untracked context op.
fn gap_marker() -> LineOp {
    LineOp {
        kind: LineOpKind::Context,
        source_line: None,
        target_line: None,
        text: ELLIPSIS_MARKER.to_string(),
    }
}
