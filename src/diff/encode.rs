//! Micro-format encoder.
//!
//! Serializes a blob header and per-file sections. A section is a
//! `## <ChangeType>: <path>` marker followed by a fenced `diff` block with
//! one line per op, e.g. `L3 + console.log(1)`.
//!
//! Line format: `L<number> <symbol> <text>`, symbol `+`/`-`/empty, number
//! target-side for add/context and source-side for remove; the `L` prefix
//! is omitted when the number is untracked. This module and [`decode`]
//! form a protocol: any new symbol or header prefix must be added on both
//! sides simultaneously.
//!
//! [`decode`]: crate::diff::decode

use crate::diff::ELLIPSIS_MARKER;
use crate::models::{ChangeEntry, FileDiff, LineOp, LineOpKind, PullRequestInfo};

/// Section marker prefix. Shared with the decoder.
pub const SECTION_PREFIX: &str = "## ";

/// Fence opener for section bodies.
pub const FENCE_OPEN: &str = "```diff";

/// Fence closer.
pub const FENCE_CLOSE: &str = "```";

/// Body rendered when every retrieval attempt for a file failed.
pub const CONTENT_UNAVAILABLE: &str = "(content unavailable)";

/// Body rendered when old and new content are line-identical.
pub const NO_TEXTUAL_CHANGES: &str = "(no textual changes)";

/// Note appended when a section hit the per-file cap.
pub const SECTION_TRUNCATED: &str = "(section truncated)";

/// Body rendered when no strategy found any changed files.
pub const NO_CHANGES: &str = "No changes detected.";

/// Render the blob header: title, description, branch pair, file count.
pub fn render_header(info: &PullRequestInfo, file_count: usize) -> String {
    let mut out = format!("# PR: {}\n\n", info.title);
    if !info.description.is_empty() {
        out.push_str(&info.description);
        out.push_str("\n\n");
    }
    out.push_str(&format!(
        "Branches: {} -> {}\nFiles changed: {}\n\n",
        info.source_branch, info.target_branch, file_count
    ));
    out
}

/// Render one file section, capped at `limit` characters. Truncation
/// within a section is marked and the fence is always closed.
pub fn render_section(diff: &FileDiff, limit: usize) -> String {
    let mut out = format!(
        "{SECTION_PREFIX}{}: {}\n{FENCE_OPEN}\n",
        diff.change_type, diff.path
    );

    if diff.ops.is_empty() {
        out.push_str(NO_TEXTUAL_CHANGES);
        out.push('\n');
    } else {
        // Leave room for the truncation note and the closing fence.
        let reserve = SECTION_TRUNCATED.chars().count() + FENCE_CLOSE.len() + 3;
        let body_budget = limit.saturating_sub(reserve);
        let mut used = out.chars().count();
        let mut truncated = false;

        for op in &diff.ops {
            let line = render_line(op);
            let cost = line.chars().count() + 1;
            if used + cost > body_budget {
                truncated = true;
                break;
            }
            out.push_str(&line);
            out.push('\n');
            used += cost;
        }

        if truncated {
            out.push_str(SECTION_TRUNCATED);
            out.push('\n');
        }
    }

    out.push_str(FENCE_CLOSE);
    out.push('\n');
    out
}

/// Render a placeholder section for a file whose content was unavailable.
pub fn render_placeholder(entry: &ChangeEntry) -> String {
    format!(
        "{SECTION_PREFIX}{}: {}\n{FENCE_OPEN}\n{CONTENT_UNAVAILABLE}\n{FENCE_CLOSE}\n",
        entry.change_type, entry.path
    )
}

/// Render the trailing global truncation marker.
pub fn render_truncation(omitted: usize) -> String {
    format!("[diff truncated: {omitted} file(s) omitted]\n")
}

/// Render one line op in the micro-format.
pub fn render_line(op: &LineOp) -> String {
    let symbol = match op.kind {
        LineOpKind::Add => "+",
        LineOpKind::Remove => "-",
        LineOpKind::Context => "",
    };
    match op.display_line() {
        Some(number) => format!("L{number} {symbol} {}", op.text),
        // Untracked line numbers fall back to the bare form. The collapsed
        // context marker renders as itself.
        None if op.text == ELLIPSIS_MARKER => ELLIPSIS_MARKER.to_string(),
        None if symbol.is_empty() => op.text.clone(),
        None => format!("{symbol} {}", op.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeType;
    use pretty_assertions::assert_eq;

    fn sample_info() -> PullRequestInfo {
        PullRequestInfo {
            title: "Fix login race".into(),
            description: "Serializes the token refresh.".into(),
            source_branch: "fix-login".into(),
            target_branch: "main".into(),
            source_commit: None,
            target_commit: None,
        }
    }

    #[test]
    fn header_contains_title_branches_and_count() {
        let header = render_header(&sample_info(), 3);
        assert!(header.starts_with("# PR: Fix login race\n"));
        assert!(header.contains("Serializes the token refresh."));
        assert!(header.contains("Branches: fix-login -> main"));
        assert!(header.contains("Files changed: 3"));
    }

    #[test]
    fn header_omits_empty_description() {
        let mut info = sample_info();
        info.description.clear();
        let header = render_header(&info, 0);
        assert!(!header.contains("\n\n\n"));
        assert!(header.contains("Branches:"));
    }

    #[test]
    fn line_format_per_kind() {
        assert_eq!(render_line(&LineOp::add(3, "console.log(1)")), "L3 + console.log(1)");
        assert_eq!(render_line(&LineOp::remove(4, "console.log(2)")), "L4 - console.log(2)");
        assert_eq!(render_line(&LineOp::context(2, 5, "let x;")), "L5  let x;");
    }

    #[test]
    fn section_layout() {
        let diff = FileDiff::new(
            "/src/a.js",
            ChangeType::Edit,
            None,
            vec![LineOp::add(3, "console.log(1)"), LineOp::remove(4, "console.log(2)")],
        );
        let section = render_section(&diff, 4_000);
        assert_eq!(
            section,
            "## Edit: /src/a.js\n```diff\nL3 + console.log(1)\nL4 - console.log(2)\n```\n"
        );
    }

    #[test]
    fn empty_ops_render_no_textual_changes() {
        let diff = FileDiff::new("/same.rs", ChangeType::Edit, None, vec![]);
        let section = render_section(&diff, 4_000);
        assert!(section.contains(NO_TEXTUAL_CHANGES));
        assert!(section.ends_with("```\n"));
    }

    #[test]
    fn section_cap_is_marked_and_fence_stays_closed() {
        let ops: Vec<LineOp> = (1..=200)
            .map(|n| LineOp::add(n, format!("line number {n} with some padding")))
            .collect();
        let diff = FileDiff::new("/big.rs", ChangeType::Add, None, ops);
        let section = render_section(&diff, 500);

        assert!(section.chars().count() <= 500);
        assert!(section.contains(SECTION_TRUNCATED));
        assert!(section.ends_with("```\n"));
    }

    #[test]
    fn placeholder_section() {
        let entry = ChangeEntry::new("/bin/logo.png", ChangeType::Edit);
        let section = render_placeholder(&entry);
        assert!(section.starts_with("## Edit: /bin/logo.png\n"));
        assert!(section.contains(CONTENT_UNAVAILABLE));
    }

    #[test]
    fn truncation_marker_names_the_count() {
        assert_eq!(
            render_truncation(7),
            "[diff truncated: 7 file(s) omitted]\n"
        );
    }
}
