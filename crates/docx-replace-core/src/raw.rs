//! Literal replacement over raw markup.
//!
//! These functions know nothing about runs: they match bytes of the markup as written, tags
//! included. A target split across runs is invisible to them.

use crate::Rewrite;

/// Replace the first `limit` literal occurrences of `target`, or all of them when `limit` is
/// `None`.
pub fn replace_raw(markup: &str, target: &str, replacement: &str, limit: Option<usize>) -> Rewrite {
    if target.is_empty() {
        return Rewrite::unchanged(markup);
    }

    let found = markup.matches(target).count();
    let replaced = limit.map_or(found, |n| n.min(found));
    if replaced == 0 {
        return Rewrite::unchanged(markup);
    }

    Rewrite {
        markup: markup.replacen(target, replacement, replaced),
        replaced,
    }
}

/// Replace only the `n`-th (0-based) non-overlapping literal occurrence of `target`.
///
/// Fewer than `n + 1` occurrences leave the markup unchanged.
pub fn replace_raw_index_n(markup: &str, target: &str, replacement: &str, n: usize) -> Rewrite {
    if target.is_empty() {
        return Rewrite::unchanged(markup);
    }

    let Some((at, _)) = markup.match_indices(target).nth(n) else {
        return Rewrite::unchanged(markup);
    };

    Rewrite {
        markup: [&markup[..at], replacement, &markup[at + target.len()..]].concat(),
        replaced: 1,
    }
}
