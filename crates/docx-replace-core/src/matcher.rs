//! Cross-fragment matching.
//!
//! [`find_next`] walks the fragments after a resume point and returns the first occurrence of
//! the target, which may start inside one run and end several runs later. A match is built
//! greedily: the head piece must sit at the tail of its run, every following piece must sit at
//! the head of its run, and the longest admissible piece is always tried first.

use std::iter;

use serde::Serialize;

use crate::scanner::Fragment;

/// One participating run of an occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchEntry {
    pub fragment_index: usize,
    /// The piece of the target this run contributes.
    pub matched: String,
}

/// One occurrence of the target: entries in strictly increasing fragment order whose
/// `matched` pieces concatenate to the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchRecord {
    entries: Vec<MatchEntry>,
}

impl MatchRecord {
    pub fn new(entries: Vec<MatchEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_index(&self) -> Option<usize> {
        self.entries.first().map(|entry| entry.fragment_index)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.entries.last().map(|entry| entry.fragment_index)
    }

    /// Concatenation of all matched pieces; equals the target for records built by
    /// [`find_next`].
    pub fn matched_text(&self) -> String {
        self.entries.iter().map(|entry| entry.matched.as_str()).collect()
    }

    fn push(&mut self, fragment_index: usize, matched: &str) {
        self.entries.push(MatchEntry {
            fragment_index,
            matched: matched.to_string(),
        });
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Outcome of offering one fragment to the in-progress match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The rest of the target was found; the record is complete.
    Complete,
    /// The first `n` bytes of the remaining target were consumed.
    Extend(usize),
    /// No match starts here; nothing was in progress.
    Skip,
    /// The in-progress candidate broke on this fragment.
    Abandon,
}

/// Find the next occurrence of `target` among fragments with index greater than
/// `resume_after`.
///
/// Returns `None` when the target is empty or the fragments run out before the whole target
/// has been located. A partial candidate is never returned.
pub fn find_next<'a, I>(fragments: I, target: &str, resume_after: usize) -> Option<MatchRecord>
where
    I: IntoIterator<Item = Fragment<'a>>,
{
    if target.is_empty() {
        return None;
    }

    let mut remaining = target;
    let mut record = MatchRecord::default();

    for fragment in fragments
        .into_iter()
        .skip_while(|fragment| fragment.index <= resume_after)
    {
        match step(!record.is_empty(), remaining, fragment.text) {
            Step::Complete => {
                record.push(fragment.index, remaining);
                return Some(record);
            }
            Step::Extend(len) => {
                record.push(fragment.index, &remaining[..len]);
                remaining = &remaining[len..];
            }
            Step::Skip => {}
            Step::Abandon => {
                // The breaking fragment is not retried as a fresh start.
                record.clear();
                remaining = target;
            }
        }
    }

    None
}

fn step(continuing: bool, remaining: &str, text: &str) -> Step {
    for len in candidate_lengths(remaining) {
        let Some(at) = text.rfind(&remaining[..len]) else {
            continue;
        };
        let whole = len == remaining.len();

        if !continuing {
            if whole {
                return Step::Complete;
            }
            if at + len == text.len() {
                return Step::Extend(len);
            }
            continue;
        }

        if at != 0 {
            return Step::Abandon;
        }
        if whole {
            return Step::Complete;
        }
        // An interior run must be consumed entirely.
        if len == text.len() {
            return Step::Extend(len);
        }
        return Step::Abandon;
    }

    if continuing {
        Step::Abandon
    } else {
        Step::Skip
    }
}

/// Prefix lengths of `remaining` on char boundaries, longest first.
fn candidate_lengths(remaining: &str) -> impl Iterator<Item = usize> + '_ {
    iter::once(remaining.len()).chain(
        remaining
            .char_indices()
            .rev()
            .map(|(at, _)| at)
            .filter(|&at| at > 0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn markup(texts: &[&str]) -> String {
        texts
            .iter()
            .map(|text| format!("<w:r><w:t>{}</w:t></w:r>", text))
            .collect()
    }

    fn entries(record: &MatchRecord) -> Vec<(usize, &str)> {
        record
            .entries()
            .iter()
            .map(|entry| (entry.fragment_index, entry.matched.as_str()))
            .collect()
    }

    #[test]
    fn test_two_runs_fully_consumed() {
        let xml = markup(&["Hello ", "world"]);
        let record = find_next(scan(&xml), "Hello world", 0).unwrap();

        assert_eq!(entries(&record), vec![(1, "Hello "), (2, "world")]);
    }

    #[test]
    fn test_head_tail_and_interior_pieces() {
        let xml = markup(&["abcHello", " wor", "ld!"]);
        let record = find_next(scan(&xml), "Hello world", 0).unwrap();

        assert_eq!(entries(&record), vec![(1, "Hello"), (2, " wor"), (3, "ld")]);
        assert_eq!(record.matched_text(), "Hello world");
    }

    #[test]
    fn test_single_fragment_match() {
        let xml = markup(&["foo", "say hello there"]);
        let record = find_next(scan(&xml), "hello", 0).unwrap();

        assert_eq!(entries(&record), vec![(2, "hello")]);
    }

    #[test]
    fn test_absent_target() {
        let xml = markup(&["foo", "bar"]);
        assert_eq!(find_next(scan(&xml), "xyz", 0), None);
    }

    #[test]
    fn test_empty_target() {
        let xml = markup(&["foo"]);
        assert_eq!(find_next(scan(&xml), "", 0), None);
    }

    #[test]
    fn test_resume_skips_earlier_fragments() {
        let xml = markup(&["cat", "dog", "cat"]);
        let record = find_next(scan(&xml), "cat", 1).unwrap();

        assert_eq!(entries(&record), vec![(3, "cat")]);
        assert_eq!(find_next(scan(&xml), "cat", 3), None);
    }

    #[test]
    fn test_partial_candidate_at_end_is_not_returned() {
        let xml = markup(&["intro", "Hello "]);
        assert_eq!(find_next(scan(&xml), "Hello world", 0), None);
    }

    #[test]
    fn test_head_not_at_tail_tries_shorter_candidates() {
        // "Hel" occurs but not at the tail; the shorter "H" does.
        let xml = markup(&["Hel xH", "ello"]);
        let record = find_next(scan(&xml), "Hello", 0).unwrap();

        assert_eq!(entries(&record), vec![(1, "H"), (2, "ello")]);
    }

    #[test]
    fn test_broken_continuation_is_not_retried_as_a_start() {
        // "ab" + "c" would read "abc" across runs 2 and 3, but run 2 breaks the
        // candidate started in run 1 and is not examined again.
        let xml = markup(&["ab", "xab", "c"]);
        assert_eq!(find_next(scan(&xml), "abc", 0), None);
    }

    #[test]
    fn test_continuation_must_start_at_head() {
        let xml = markup(&["Hel", "xlo", "Hello"]);
        let record = find_next(scan(&xml), "Hello", 0).unwrap();

        assert_eq!(entries(&record), vec![(3, "Hello")]);
    }

    #[test]
    fn test_interior_run_must_be_consumed_entirely() {
        // "l" opens run 2 but "X" follows it, so the candidate breaks there.
        let xml = markup(&["He", "lX", "lo"]);
        assert_eq!(find_next(scan(&xml), "Hello", 0), None);

        let xml = markup(&["He", "l", "lo"]);
        let record = find_next(scan(&xml), "Hello", 0).unwrap();
        assert_eq!(entries(&record), vec![(1, "He"), (2, "l"), (3, "lo")]);
    }

    #[test]
    fn test_multibyte_split() {
        let xml = markup(&["prix: 10 €", "uro"]);
        let record = find_next(scan(&xml), "€uro", 0).unwrap();

        assert_eq!(entries(&record), vec![(1, "€"), (2, "uro")]);
    }

    #[rstest]
    #[case(&["Hello ", "world"], "Hello world")]
    #[case(&["abcHello", " wor", "ld!"], "Hello world")]
    #[case(&["a", "b", "c", "d"], "abcd")]
    #[case(&["xx", "needle in", " a", " haystack"], "needle in a haystack")]
    fn test_reconstruction(#[case] texts: &[&str], #[case] target: &str) {
        let xml = markup(texts);
        let record = find_next(scan(&xml), target, 0).unwrap();

        assert_eq!(record.matched_text(), target);
        let indices: Vec<usize> = record.entries().iter().map(|e| e.fragment_index).collect();
        assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
        for entry in record.entries() {
            assert!(texts[entry.fragment_index - 1].contains(&entry.matched));
        }
    }
}
