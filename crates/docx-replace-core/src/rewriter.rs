//! Apply an occurrence list to the markup in a single pass over its runs.

use crate::matcher::{MatchEntry, MatchRecord};
use crate::scanner::{scan, RUN_CLOSE, RUN_OPEN_PRESERVE};

/// Position of an entry within its record, which decides the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Head of a multi-run record: the matched piece is cut out.
    Head,
    /// Interior of a multi-run record: the run is emptied.
    Interior,
    /// Last entry of a record (or its only one): the replacement goes here.
    Last,
}

/// Cursor into the pending occurrence list.
struct Pending<'r> {
    records: &'r [MatchRecord],
    record: usize,
    entry: usize,
}

impl<'r> Pending<'r> {
    fn new(records: &'r [MatchRecord]) -> Self {
        Self {
            records,
            record: 0,
            entry: 0,
        }
    }

    /// Take the next pending entry if it claims `fragment_index`.
    fn claim(&mut self, fragment_index: usize) -> Option<(&'r MatchEntry, Role)> {
        while self
            .records
            .get(self.record)
            .is_some_and(|record| self.entry >= record.len())
        {
            self.record += 1;
            self.entry = 0;
        }

        let record = self.records.get(self.record)?;
        let entry = record.entries().get(self.entry)?;
        if entry.fragment_index != fragment_index {
            return None;
        }

        let role = if self.entry + 1 == record.len() {
            Role::Last
        } else if self.entry == 0 {
            Role::Head
        } else {
            Role::Interior
        };
        self.entry += 1;
        Some((entry, role))
    }
}

/// Rewrite the runs named by `occurrences` and copy everything else verbatim.
///
/// Records are consumed in order. An entry whose piece cannot be found in its run leaves the
/// run as it was.
pub fn apply(markup: &str, occurrences: &[MatchRecord], replacement: &str) -> String {
    let mut out = String::with_capacity(markup.len() + replacement.len() * occurrences.len());
    let mut pending = Pending::new(occurrences);
    let mut copied = 0;

    for fragment in scan(markup) {
        let Some((entry, role)) = pending.claim(fragment.index) else {
            continue;
        };
        let Some(text) = edit(fragment.text, entry, role, replacement) else {
            continue;
        };

        out.push_str(&markup[copied..fragment.span.start]);
        push_run(&mut out, fragment.open_tag, &text);
        copied = fragment.span.end;
    }

    out.push_str(&markup[copied..]);
    out
}

fn edit(text: &str, entry: &MatchEntry, role: Role, replacement: &str) -> Option<String> {
    let piece = entry.matched.as_str();
    if piece.is_empty() {
        return None;
    }

    match role {
        Role::Interior => Some(String::new()),
        Role::Head => {
            let at = text.rfind(piece)?;
            Some([&text[..at], &text[at + piece.len()..]].concat())
        }
        Role::Last if text == piece => Some(replacement.to_string()),
        Role::Last => {
            let at = text.find(piece)?;
            Some([&text[..at], replacement, &text[at + piece.len()..]].concat())
        }
    }
}

fn push_run(out: &mut String, open_tag: &str, text: &str) {
    let padded = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
    if padded && open_tag == "<w:t>" {
        out.push_str(RUN_OPEN_PRESERVE);
    } else {
        out.push_str(open_tag);
    }
    out.push_str(text);
    out.push_str(RUN_CLOSE);
}
