//! Cross-run search and replace for WordprocessingML markup.
//!
//! The visible text of a paragraph is split across `<w:t>` runs at formatting and
//! spell-check boundaries, so a plain substring search over the markup misses targets that
//! straddle runs. This crate finds such targets and rewrites only the runs they touch:
//! - `scanner`: extracts text runs with stable 1-based indices
//! - `matcher`: finds one occurrence that may span several runs
//! - `planner`: applies an occurrence policy (all, first n, exactly the k-th)
//! - `rewriter`: replays the runs once and edits the claimed ones
//! - `raw`: literal, run-unaware replacement kept for legacy callers

pub mod matcher;
pub mod planner;
pub mod raw;
pub mod rewriter;
pub mod scanner;

pub use matcher::{find_next, MatchEntry, MatchRecord};
pub use planner::{plan, OccurrencePolicy};
pub use raw::{replace_raw, replace_raw_index_n};
pub use rewriter::apply;
pub use scanner::{scan, texts, Fragment, Fragments};

/// Result of a replace pass over one markup string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub markup: String,
    /// Number of occurrences rewritten.
    pub replaced: usize,
}

impl Rewrite {
    fn unchanged(markup: &str) -> Self {
        Self {
            markup: markup.to_string(),
            replaced: 0,
        }
    }
}

/// Scan, plan and apply in one go.
pub fn replace_fragments(
    markup: &str,
    target: &str,
    replacement: &str,
    policy: OccurrencePolicy,
) -> Rewrite {
    let records = plan(markup, target, policy);
    if records.is_empty() {
        return Rewrite::unchanged(markup);
    }

    Rewrite {
        markup: apply(markup, &records, replacement),
        replaced: records.len(),
    }
}
