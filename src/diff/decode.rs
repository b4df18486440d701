//! Micro-format decoder (companion consumer contract).
//!
//! Splits a blob on section markers, recovers the change type and path by
//! fixed-prefix match, and parses fenced lines with a layered grammar:
//! the exact encoder form first (single-space separators, which keeps
//! context text that itself starts with `+`/`-` unambiguous), then a
//! tolerant `L<digits> [+-] <rest>` form for hand-edited input, then bare
//! `+`/`-`-prefixed lines without numbers, otherwise context. Malformed
//! lines are dropped, never fatal.

use std::sync::LazyLock;

use regex::Regex;

use crate::diff::encode::{
    CONTENT_UNAVAILABLE, FENCE_CLOSE, NO_TEXTUAL_CHANGES, SECTION_PREFIX, SECTION_TRUNCATED,
};
use crate::diff::ELLIPSIS_MARKER;
use crate::models::{ChangeType, FileDiff, LineOp, LineOpKind};

/// Exact encoder form: `L<digits> <symbol> <text>` where the symbol slot
/// is `+`, `-`, or empty (context). Matching this first keeps text that
/// starts with `+`/`-` on the right side of the symbol.
static STRICT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^L(\d+) ([+-] | )(.*)$").unwrap());

/// Tolerant line grammar for hand-edited input: flexible whitespace,
/// optional symbol.
static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^L\s*(\d+)\s*([+-])?\s?(.*)$").unwrap());

/// Parse a blob back into structured per-file diffs.
///
/// Sections whose header prefix is not recognized are skipped; malformed
/// lines inside a section are dropped. Never fails.
pub fn decode_blob(text: &str) -> Vec<FileDiff> {
    let mut diffs: Vec<FileDiff> = Vec::new();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let Some((change_type, path)) = parse_section_header(line) else {
            continue;
        };

        // Collect this section's body up to the next section marker.
        let mut body: Vec<&str> = Vec::new();
        while let Some(&next) = lines.peek() {
            if next.starts_with(SECTION_PREFIX) {
                break;
            }
            body.push(lines.next().unwrap());
        }

        let ops = parse_fenced_ops(&body);
        diffs.push(FileDiff::new(path, change_type, None, ops));
    }

    diffs
}

/// Recover (change type, path) from a `## <Prefix>: <path>` marker.
fn parse_section_header(line: &str) -> Option<(ChangeType, String)> {
    let rest = line.strip_prefix(SECTION_PREFIX)?;
    let (prefix, path) = rest.split_once(": ")?;
    let change_type: ChangeType = prefix.parse().ok()?;
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    Some((change_type, path.to_string()))
}

/// Extract the fenced block from a section body and parse its lines.
fn parse_fenced_ops(body: &[&str]) -> Vec<LineOp> {
    let mut ops: Vec<LineOp> = Vec::new();
    let mut in_fence = false;

    for line in body {
        if line.starts_with(FENCE_CLOSE) {
            if in_fence {
                break;
            }
            in_fence = true;
            continue;
        }
        if !in_fence {
            continue;
        }
        if let Some(op) = parse_line(line) {
            ops.push(op);
        }
    }

    ops
}

/// Parse one fenced line. Returns `None` for markers and malformed input.
fn parse_line(line: &str) -> Option<LineOp> {
    // Renderer artifacts, not content.
    if matches!(
        line.trim_end(),
        ELLIPSIS_MARKER | CONTENT_UNAVAILABLE | NO_TEXTUAL_CHANGES | SECTION_TRUNCATED
    ) {
        return None;
    }

    if let Some(caps) = STRICT_LINE_RE.captures(line) {
        let number: u32 = caps.get(1)?.as_str().parse().ok()?;
        let text = caps.get(3).map_or("", |m| m.as_str());
        return Some(match caps.get(2).map(|m| m.as_str()) {
            Some("+ ") => LineOp::add(number, text),
            Some("- ") => LineOp::remove(number, text),
            _ => LineOp {
                kind: LineOpKind::Context,
                source_line: None,
                target_line: Some(number),
                text: text.to_string(),
            },
        });
    }

    if let Some(caps) = LINE_RE.captures(line) {
        let number: u32 = caps.get(1)?.as_str().parse().ok()?;
        let text = caps.get(3).map_or("", |m| m.as_str());
        return Some(match caps.get(2).map(|m| m.as_str()) {
            Some("+") => LineOp::add(number, text),
            Some("-") => LineOp::remove(number, text),
            _ => LineOp {
                kind: LineOpKind::Context,
                source_line: None,
                target_line: Some(number),
                text: text.to_string(),
            },
        });
    }

    // Fallback: bare symbol-prefixed lines without numbers.
    if let Some(rest) = line.strip_prefix('+') {
        return Some(LineOp {
            kind: LineOpKind::Add,
            source_line: None,
            target_line: None,
            text: rest.strip_prefix(' ').unwrap_or(rest).to_string(),
        });
    }
    if let Some(rest) = line.strip_prefix('-') {
        return Some(LineOp {
            kind: LineOpKind::Remove,
            source_line: None,
            target_line: None,
            text: rest.strip_prefix(' ').unwrap_or(rest).to_string(),
        });
    }

    // Everything else is context with untracked numbers.
    Some(LineOp {
        kind: LineOpKind::Context,
        source_line: None,
        target_line: None,
        text: line.to_string(),
    })
}
