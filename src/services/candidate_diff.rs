use std::collections::HashSet;
use tracing::debug;

/// Membership changes between two versions of a meeting's candidate set.
///
/// The three buckets partition the union of both sets: every id appears in
/// exactly one of removed/added/unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDiff {
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub unchanged: Vec<String>,
}

impl CandidateDiff {
    pub fn is_unchanged(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// De-duplicates candidate ids, keeping the first occurrence of each.
///
/// Callers do not guarantee uniqueness, so this runs on every candidate
/// list entering the engine.
pub fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Classifies candidates into removed/added/unchanged between `old` and
/// `new`. Equality is by stable id, never by reference.
pub fn diff(old: &[String], new: &[String]) -> CandidateDiff {
    let old = dedup_ids(old);
    let new = dedup_ids(new);

    let old_set: HashSet<&str> = old.iter().map(String::as_str).collect();
    let new_set: HashSet<&str> = new.iter().map(String::as_str).collect();

    let removed: Vec<String> = old
        .iter()
        .filter(|id| !new_set.contains(id.as_str()))
        .cloned()
        .collect();

    let added: Vec<String> = new
        .iter()
        .filter(|id| !old_set.contains(id.as_str()))
        .cloned()
        .collect();

    let unchanged: Vec<String> = new
        .iter()
        .filter(|id| old_set.contains(id.as_str()))
        .cloned()
        .collect();

    debug!(
        "Candidate diff: {} removed, {} added, {} unchanged",
        removed.len(),
        added.len(),
        unchanged.len()
    );

    CandidateDiff {
        removed,
        added,
        unchanged,
    }
}
