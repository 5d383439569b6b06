//! Tree-level diff: partition two snapshots by presence and content.
//!
//! Both snapshots are ordered maps, so a single merge-join pass classifies
//! every path and the output lists come out lexicographically sorted.

use std::cmp::Ordering;

use docdelta_scan::{FileRecord, TreeSnapshot};
use serde::Serialize;
use tracing::debug;

/// The result of comparing two snapshots.
///
/// Each path present in either snapshot lands in exactly one list, except
/// paths that are a directory on both sides, which are structural only and
/// are not reported.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
    pub identical: Vec<String>,
    pub different: Vec<String>,
}

impl ComparisonResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing differs between the two trees.
    pub fn is_identical(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty() && self.different.is_empty()
    }

    /// Number of classified paths.
    pub fn len(&self) -> usize {
        self.only_in_a.len() + self.only_in_b.len() + self.identical.len() + self.different.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ComparisonStats {
        ComparisonStats {
            only_in_a: self.only_in_a.len(),
            only_in_b: self.only_in_b.len(),
            identical: self.identical.len(),
            different: self.different.len(),
            total: self.len(),
        }
    }
}

/// Per-list counts of a [`ComparisonResult`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonStats {
    pub only_in_a: usize,
    pub only_in_b: usize,
    pub identical: usize,
    pub different: usize,
    pub total: usize,
}

/// Compare two snapshots.
///
/// - present only in `a` -> `only_in_a`, only in `b` -> `only_in_b`
/// - file on both sides, equal digests -> `identical`
/// - unequal digests, either side unreadable, or file/dir mismatch -> `different`
/// - directory on both sides -> not reported
pub fn compare_snapshots(a: &TreeSnapshot, b: &TreeSnapshot) -> ComparisonResult {
    let mut result = ComparisonResult::new();
    let mut left = a.entries.iter().peekable();
    let mut right = b.entries.iter().peekable();

    loop {
        let order = match (left.peek(), right.peek()) {
            (Some((ka, _)), Some((kb, _))) => ka.cmp(kb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        match order {
            Ordering::Less => {
                if let Some((path, _)) = left.next() {
                    result.only_in_a.push(path.clone());
                }
            }
            Ordering::Greater => {
                if let Some((path, _)) = right.next() {
                    result.only_in_b.push(path.clone());
                }
            }
            Ordering::Equal => {
                if let (Some((path, ra)), Some((_, rb))) = (left.next(), right.next()) {
                    classify_pair(path, ra, rb, &mut result);
                }
            }
        }
    }

    debug!(
        only_in_a = result.only_in_a.len(),
        only_in_b = result.only_in_b.len(),
        identical = result.identical.len(),
        different = result.different.len(),
        "snapshots compared"
    );
    result
}

fn classify_pair(path: &str, a: &FileRecord, b: &FileRecord, result: &mut ComparisonResult) {
    if a.is_dir() && b.is_dir() {
        return;
    }
    if a.kind != b.kind {
        result.different.push(path.to_string());
        return;
    }
    // An unreadable side can never be proven equal.
    match (a.digest(), b.digest()) {
        (Some(da), Some(db)) if da == db => result.identical.push(path.to_string()),
        _ => result.different.push(path.to_string()),
    }
}
