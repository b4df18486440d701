//! Budget allocation: file ordering, caps, and the running character ledger.
//!
//! The ledger is an explicit accumulator threaded through the pipeline's
//! per-file loop rather than shared mutable state, so the allocator stays
//! pure and testable. All sizes are in characters, the unit the global
//! budget is set in.

use crate::models::ChangeEntry;

/// Extensions treated as source code and therefore emitted first.
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "mjs", "py", "go", "java", "kt", "cs", "cpp", "cc", "c", "h",
    "hpp", "rb", "php", "swift", "scala", "sql", "sh", "vue", "svelte",
];

/// Whether a path has a recognized source-code extension.
pub fn is_source_path(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.as_str()))
}

/// Order entries for emission and apply the file cap.
///
/// Stable sort: source-code files precede others, ties keep discovery
/// order. Returns the selected entries and the count dropped by the cap.
pub fn order_entries(mut entries: Vec<ChangeEntry>, max_files: usize) -> (Vec<ChangeEntry>, usize) {
    entries.sort_by_key(|entry| !is_source_path(&entry.path));
    let dropped = entries.len().saturating_sub(max_files);
    entries.truncate(max_files);
    (entries, dropped)
}

/// Running character ledger for one blob.
#[derive(Debug, Clone)]
pub struct BudgetLedger {
    budget: usize,
    used: usize,
    emitted: usize,
    omitted: usize,
}

impl BudgetLedger {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            used: 0,
            emitted: 0,
            omitted: 0,
        }
    }

    /// Charge a section against the budget, keeping `reserve` characters
    /// free for the trailing truncation marker. Returns `false` (and
    /// charges nothing) when the section does not fit.
    pub fn try_charge(&mut self, section: &str, reserve: usize) -> bool {
        let cost = section.chars().count();
        if self.used + cost + reserve > self.budget {
            return false;
        }
        self.used += cost;
        self.emitted += 1;
        true
    }

    /// Charge header or marker text that is emitted unconditionally.
    pub fn charge_fixed(&mut self, text: &str) {
        self.used += text.chars().count();
    }

    /// Record files that will never be attempted.
    pub fn skip(&mut self, count: usize) {
        self.omitted += count;
    }

    pub fn remaining(&self) -> usize {
        self.budget.saturating_sub(self.used)
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn omitted(&self) -> usize {
        self.omitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeType;

    fn entry(path: &str) -> ChangeEntry {
        ChangeEntry::new(path, ChangeType::Edit)
    }

    #[test]
    fn source_extensions_are_recognized() {
        assert!(is_source_path("/src/main.rs"));
        assert!(is_source_path("/web/App.TSX"));
        assert!(is_source_path("/scripts/build.sh"));
        assert!(!is_source_path("/README.md"));
        assert!(!is_source_path("/img/logo.png"));
        assert!(!is_source_path("/Makefile"));
    }

    #[test]
    fn ordering_puts_source_first_and_keeps_discovery_order() {
        let entries = vec![
            entry("/README.md"),
            entry("/src/a.rs"),
            entry("/assets/x.png"),
            entry("/src/b.rs"),
        ];
        let (ordered, dropped) = order_entries(entries, 10);
        let paths: Vec<&str> = ordered.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/src/a.rs", "/src/b.rs", "/README.md", "/assets/x.png"]
        );
        assert_eq!(dropped, 0);
    }

    #[test]
    fn file_cap_drops_the_tail() {
        let entries = vec![entry("/a.rs"), entry("/b.rs"), entry("/c.md")];
        let (ordered, dropped) = order_entries(entries, 2);
        assert_eq!(ordered.len(), 2);
        assert_eq!(dropped, 1);
        assert_eq!(ordered[0].path, "/a.rs");
        assert_eq!(ordered[1].path, "/b.rs");
    }

    #[test]
    fn ledger_charges_until_budget() {
        let mut ledger = BudgetLedger::new(25);
        assert!(ledger.try_charge("ten chars!", 0));
        assert!(ledger.try_charge("ten chars!", 0));
        // A third section of 10 would hit 30 > 25.
        assert!(!ledger.try_charge("ten chars!", 0));
        assert_eq!(ledger.emitted(), 2);
        assert_eq!(ledger.remaining(), 5);
    }

    #[test]
    fn reserve_is_honored() {
        let mut ledger = BudgetLedger::new(15);
        // Fits alone, but not with 10 reserved.
        assert!(!ledger.try_charge("ten chars!", 10));
        assert!(ledger.try_charge("ten chars!", 5));
    }

    #[test]
    fn multibyte_text_is_counted_in_chars() {
        let mut ledger = BudgetLedger::new(5);
        // 5 chars, 10 bytes.
        assert!(ledger.try_charge("ééééé", 0));
        assert_eq!(ledger.remaining(), 0);
    }
}
