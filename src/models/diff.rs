//! Diff-related types: line operations, per-file diffs, and the blob.

use serde::{Deserialize, Serialize};

use super::pr::ChangeType;

/// The kind of a line operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineOpKind {
    /// Line exists only in the new version.
    Add,
    /// Line exists only in the old version.
    Remove,
    /// Line is unchanged.
    Context,
}

/// A single line operation within a file diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineOp {
    pub kind: LineOpKind,
    /// Line number in the old file (None for add ops).
    pub source_line: Option<u32>,
    /// Line number in the new file (None for remove ops).
    pub target_line: Option<u32>,
    /// The line text, without any trailing newline.
    pub text: String,
}

impl LineOp {
    pub fn add(target_line: u32, text: impl Into<String>) -> Self {
        Self {
            kind: LineOpKind::Add,
            source_line: None,
            target_line: Some(target_line),
            text: text.into(),
        }
    }

    pub fn remove(source_line: u32, text: impl Into<String>) -> Self {
        Self {
            kind: LineOpKind::Remove,
            source_line: Some(source_line),
            target_line: None,
            text: text.into(),
        }
    }

    pub fn context(source_line: u32, target_line: u32, text: impl Into<String>) -> Self {
        Self {
            kind: LineOpKind::Context,
            source_line: Some(source_line),
            target_line: Some(target_line),
            text: text.into(),
        }
    }

    /// The line number the encoder tags this op with: target-side for
    /// add/context, source-side for remove.
    pub fn display_line(&self) -> Option<u32> {
        match self.kind {
            LineOpKind::Add | LineOpKind::Context => self.target_line,
            LineOpKind::Remove => self.source_line,
        }
    }
}

/// How much of each file the differ emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffMode {
    /// Add/remove ops only.
    ChangesOnly,
    /// Add/remove plus surrounding context lines, gaps collapsed.
    #[default]
    ChangesContext,
    /// The whole new file line-numbered, capped at a fixed line count.
    FullFile,
}

/// The reconstructed diff for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub change_type: ChangeType,
    /// Pre-rename path, carried in the model but not on the wire.
    pub original_path: Option<String>,
    pub ops: Vec<LineOp>,
    pub additions: usize,
    pub deletions: usize,
}

impl FileDiff {
    /// Build a diff, deriving addition/deletion counts from the ops.
    pub fn new(
        path: impl Into<String>,
        change_type: ChangeType,
        original_path: Option<String>,
        ops: Vec<LineOp>,
    ) -> Self {
        let additions = ops.iter().filter(|op| op.kind == LineOpKind::Add).count();
        let deletions = ops
            .iter()
            .filter(|op| op.kind == LineOpKind::Remove)
            .count();
        Self {
            path: path.into(),
            change_type,
            original_path,
            ops,
            additions,
            deletions,
        }
    }

    /// Whether the file changed at all at the line level.
    pub fn has_changes(&self) -> bool {
        self.additions > 0 || self.deletions > 0
    }
}

/// The serialized diff artifact handed to the prompt builder and viewer.
///
/// `text` never exceeds the budget it was produced under; when files were
/// omitted the text ends with an explicit truncation marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffBlob {
    pub text: String,
    /// Files whose sections made it into the blob.
    pub files_emitted: usize,
    /// Files dropped by the file cap or the character budget.
    pub files_omitted: usize,
}

impl DiffBlob {
    /// Serialized size in characters (the unit the budget is set in).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_truncated(&self) -> bool {
        self.files_omitted > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_diff_derives_counts() {
        let diff = FileDiff::new(
            "src/a.rs",
            ChangeType::Edit,
            None,
            vec![
                LineOp::context(1, 1, "fn main() {"),
                LineOp::remove(2, "    old();"),
                LineOp::add(2, "    new();"),
                LineOp::add(3, "    extra();"),
            ],
        );
        assert_eq!(diff.additions, 2);
        assert_eq!(diff.deletions, 1);
        assert!(diff.has_changes());
    }

    #[test]
    fn identical_content_has_no_changes() {
        let diff = FileDiff::new(
            "src/a.rs",
            ChangeType::Edit,
            None,
            vec![LineOp::context(1, 1, "unchanged")],
        );
        assert!(!diff.has_changes());
    }

    #[test]
    fn display_line_picks_the_tagged_side() {
        assert_eq!(LineOp::add(7, "x").display_line(), Some(7));
        assert_eq!(LineOp::remove(3, "x").display_line(), Some(3));
        assert_eq!(LineOp::context(3, 7, "x").display_line(), Some(7));
    }

    #[test]
    fn blob_char_len_counts_chars_not_bytes() {
        let blob = DiffBlob {
            text: "héllo".into(),
            files_emitted: 1,
            files_omitted: 0,
        };
        assert_eq!(blob.char_len(), 5);
        assert!(!blob.is_truncated());
    }
}
