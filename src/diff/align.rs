//! Greedy bounded-lookahead line alignment.
//!
//! Not a minimal edit-distance diff: two cursors scan both sequences and a
//! bounded forward search classifies each mismatch as an insertion span, a
//! deletion span, or a one-line modification. Good enough to explain what
//! changed, and linear in file size times the window.

use crate::constants::LOOKAHEAD_WINDOW;
use crate::models::LineOp;

/// Align two line sequences with the default lookahead window.
pub fn align(old: &[&str], new: &[&str]) -> Vec<LineOp> {
    align_bounded(old, new, LOOKAHEAD_WINDOW)
}

/// Align two line sequences into a LineOp sequence that reconstructs both
/// when replayed. Line numbers are 1-based.
pub fn align_bounded(old: &[&str], new: &[&str], window: usize) -> Vec<LineOp> {
    let mut ops: Vec<LineOp> = Vec::new();
    let mut i = 0usize;
    let mut j = 0usize;

    while i < old.len() && j < new.len() {
        if old[i] == new[j] {
            ops.push(LineOp::context(line_no(i), line_no(j), old[i]));
            i += 1;
            j += 1;
            continue;
        }

        // Mismatch. How far ahead does each side's current line reappear
        // on the other side?
        let insertion = forward_match(new, j, old[i], window);
        let deletion = forward_match(old, i, new[j], window);

        match (insertion, deletion) {
            // The old line reappears sooner in the new sequence than the
            // new line does in the old one: the span in between is pure
            // insertion.
            (Some(ins), del) if del.is_none_or(|d| ins < d) => {
                for step in 0..ins {
                    ops.push(LineOp::add(line_no(j + step), new[j + step]));
                }
                j += ins;
            }
            // Pure deletion (ties resolve here, removes reading first).
            (_, Some(del)) => {
                for step in 0..del {
                    ops.push(LineOp::remove(line_no(i + step), old[i + step]));
                }
                i += del;
            }
            // Neither line reappears within the window: one-line
            // modification.
            (None, None) => {
                ops.push(LineOp::remove(line_no(i), old[i]));
                ops.push(LineOp::add(line_no(j), new[j]));
                i += 1;
                j += 1;
            }
            (Some(_), None) => unreachable!("covered by the first arm"),
        }
    }

    while i < old.len() {
        ops.push(LineOp::remove(line_no(i), old[i]));
        i += 1;
    }
    while j < new.len() {
        ops.push(LineOp::add(line_no(j), new[j]));
        j += 1;
    }

    ops
}

/// Smallest forward distance (1..=window) at which `needle` appears in
/// `haystack` after `from`.
fn forward_match(haystack: &[&str], from: usize, needle: &str, window: usize) -> Option<usize> {
    (1..=window).find(|&k| from + k < haystack.len() && haystack[from + k] == needle)
}

fn line_no(index: usize) -> u32 {
    (index + 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineOpKind;
    use pretty_assertions::assert_eq;

    fn kinds(ops: &[LineOp]) -> Vec<LineOpKind> {
        ops.iter().map(|op| op.kind).collect()
    }

    #[test]
    fn identical_content_is_all_context() {
        let lines = ["a", "b", "c"];
        let ops = align(&lines, &lines);
        assert_eq!(ops.len(), 3);
        assert!(ops.iter().all(|op| op.kind == LineOpKind::Context));
    }

    #[test]
    fn empty_old_is_all_adds_in_order() {
        let ops = align(&[], &["x", "y"]);
        assert_eq!(
            ops,
            vec![LineOp::add(1, "x"), LineOp::add(2, "y")]
        );
    }

    #[test]
    fn empty_new_is_all_removes_in_order() {
        let ops = align(&["x", "y"], &[]);
        assert_eq!(
            ops,
            vec![LineOp::remove(1, "x"), LineOp::remove(2, "y")]
        );
    }

    #[test]
    fn both_empty_is_empty() {
        assert!(align(&[], &[]).is_empty());
    }

    #[test]
    fn single_line_modification() {
        let ops = align(&["foo"], &["bar"]);
        assert_eq!(
            ops,
            vec![LineOp::remove(1, "foo"), LineOp::add(1, "bar")]
        );
    }

    #[test]
    fn pure_insertion_in_the_middle() {
        let ops = align(&["a", "b"], &["a", "new1", "new2", "b"]);
        assert_eq!(
            kinds(&ops),
            vec![
                LineOpKind::Context,
                LineOpKind::Add,
                LineOpKind::Add,
                LineOpKind::Context,
            ]
        );
        assert_eq!(ops[1].text, "new1");
        assert_eq!(ops[1].target_line, Some(2));
        assert_eq!(ops[3].source_line, Some(2));
        assert_eq!(ops[3].target_line, Some(4));
    }

    #[test]
    fn pure_deletion_in_the_middle() {
        let ops = align(&["a", "gone1", "gone2", "b"], &["a", "b"]);
        assert_eq!(
            kinds(&ops),
            vec![
                LineOpKind::Context,
                LineOpKind::Remove,
                LineOpKind::Remove,
                LineOpKind::Context,
            ]
        );
        assert_eq!(ops[1].source_line, Some(2));
        assert_eq!(ops[2].source_line, Some(3));
    }

    #[test]
    fn modification_span_emits_remove_add_pairs() {
        let ops = align(&["a", "old", "b"], &["a", "new", "b"]);
        assert_eq!(
            kinds(&ops),
            vec![
                LineOpKind::Context,
                LineOpKind::Remove,
                LineOpKind::Add,
                LineOpKind::Context,
            ]
        );
    }

    #[test]
    fn replay_reconstructs_both_sequences() {
        let old = ["a", "b", "c", "d", "e"];
        let new = ["a", "x", "c", "e", "f"];
        let ops = align(&old, &new);

        let replay_old: Vec<&str> = ops
            .iter()
            .filter(|op| op.kind != LineOpKind::Add)
            .map(|op| op.text.as_str())
            .collect();
        let replay_new: Vec<&str> = ops
            .iter()
            .filter(|op| op.kind != LineOpKind::Remove)
            .map(|op| op.text.as_str())
            .collect();

        assert_eq!(replay_old, old);
        assert_eq!(replay_new, new);
    }

    #[test]
    fn match_outside_window_degrades_to_modifications() {
        // "b" reappears, but beyond the window, so each line pairs up as a
        // modification rather than a long deletion span.
        let old = ["x1", "x2", "x3", "b"];
        let new = ["b"];
        let ops = align_bounded(&old, &new, 2);
        // remove x1 + add b (modification), then remaining old lines removed
        assert_eq!(
            kinds(&ops),
            vec![
                LineOpKind::Remove,
                LineOpKind::Add,
                LineOpKind::Remove,
                LineOpKind::Remove,
                LineOpKind::Remove,
            ]
        );
    }

    #[test]
    fn window_of_at_least_the_gap_finds_the_deletion() {
        let old = ["x1", "x2", "x3", "b"];
        let new = ["b"];
        let ops = align_bounded(&old, &new, 8);
        assert_eq!(
            kinds(&ops),
            vec![
                LineOpKind::Remove,
                LineOpKind::Remove,
                LineOpKind::Remove,
                LineOpKind::Context,
            ]
        );
    }
}
