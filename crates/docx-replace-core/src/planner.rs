//! Occurrence policies: turn repeated matcher calls into an ordered occurrence list.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::matcher::{find_next, MatchRecord};
use crate::scanner::scan;

/// Which occurrences of the target a replace call touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OccurrencePolicy {
    /// Every occurrence.
    All,
    /// The first `n` occurrences.
    First(usize),
    /// Only the `k`-th occurrence, 0-based.
    Exact(usize),
}

impl OccurrencePolicy {
    /// Map a signed occurrence limit: `-1` means all, any other negative value selects
    /// nothing.
    pub fn from_limit(limit: i64) -> Self {
        match limit {
            -1 => Self::All,
            n if n < 0 => Self::First(0),
            n => Self::First(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }

    /// Map a signed 0-based occurrence index. Negative indices select nothing.
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index).ok().map(Self::Exact)
    }

    /// Number of records the planner has to collect before it can stop.
    fn budget(self) -> Option<usize> {
        match self {
            Self::All => None,
            Self::First(n) => Some(n),
            Self::Exact(k) => Some(k.saturating_add(1)),
        }
    }
}

/// Collect the match records selected by `policy`, in document order.
///
/// Each search resumes strictly after the last fragment of the previous record, so records
/// never share a fragment.
#[instrument(skip(markup), level = "debug")]
pub fn plan(markup: &str, target: &str, policy: OccurrencePolicy) -> Vec<MatchRecord> {
    let budget = policy.budget();
    if target.is_empty() || budget == Some(0) {
        return Vec::new();
    }

    let mut records: Vec<MatchRecord> = Vec::new();
    let mut resume_after = 0;
    while budget.is_none_or(|n| records.len() < n) {
        let Some(record) = find_next(scan(markup), target, resume_after) else {
            break;
        };
        let Some(last) = record.last_index() else {
            break;
        };
        resume_after = last;
        records.push(record);
    }

    debug!("Found {} occurrence(s)", records.len());

    match policy {
        OccurrencePolicy::Exact(k) => records.into_iter().nth(k).into_iter().collect(),
        _ => records,
    }
}
