//! Text diff: line-by-line comparison rendered as two aligned columns.
//!
//! Uses the `similar` crate with its LCS algorithm. Contiguous changes are
//! grouped into runs tagged equal/insert/delete/replace, and every run is
//! expanded into side-by-side rows for display.

use std::ops::Range;

use serde::Serialize;
use similar::{Algorithm, DiffTag};

use crate::error::{DiffError, DiffResult};

/// Default number of unchanged rows shown around each hunk.
pub const DEFAULT_CONTEXT: usize = 3;

/// The kind of a contiguous run of lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTag {
    Equal,
    Insert,
    Delete,
    Replace,
}

impl From<DiffTag> for RunTag {
    fn from(tag: DiffTag) -> Self {
        match tag {
            DiffTag::Equal => Self::Equal,
            DiffTag::Insert => Self::Insert,
            DiffTag::Delete => Self::Delete,
            DiffTag::Replace => Self::Replace,
        }
    }
}

/// A contiguous run of lines sharing one tag. Ranges are 0-based line indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffRun {
    pub tag: RunTag,
    pub old_range: Range<usize>,
    pub new_range: Range<usize>,
}

/// A line with its 1-based line number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NumberedLine {
    pub number: usize,
    pub text: String,
}

/// One row of the two-column view. A side is `None` when that side has no
/// line at this position (pure insertions and deletions, or the shorter
/// half of a replacement).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SideBySideRow {
    pub tag: RunTag,
    pub left: Option<NumberedLine>,
    pub right: Option<NumberedLine>,
}

/// A window of rows around one or more changed runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextHunk {
    /// Index of the first row of this hunk in [`TextDiffView::rows`].
    pub first_row: usize,
    pub rows: Vec<SideBySideRow>,
}

/// Full result of a text comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextDiffView {
    pub runs: Vec<DiffRun>,
    pub rows: Vec<SideBySideRow>,
    /// Total number of lines on the old side.
    pub old_lines: usize,
    /// Total number of lines on the new side.
    pub new_lines: usize,
}

impl TextDiffView {
    /// Returns `true` if every run is `Equal`.
    pub fn is_unchanged(&self) -> bool {
        self.runs.iter().all(|r| r.tag == RunTag::Equal)
    }

    /// Runs that are not `Equal`.
    pub fn changed_runs(&self) -> impl Iterator<Item = &DiffRun> {
        self.runs.iter().filter(|r| r.tag != RunTag::Equal)
    }

    /// Number of lines only on the new side, including replacements.
    pub fn additions(&self) -> usize {
        self.changed_runs().map(|r| r.new_range.len()).sum()
    }

    /// Number of lines only on the old side, including replacements.
    pub fn deletions(&self) -> usize {
        self.changed_runs().map(|r| r.old_range.len()).sum()
    }

    /// Group changed rows into hunks with `context` unchanged rows on each
    /// side. Overlapping windows are merged.
    pub fn hunks(&self, context: usize) -> Vec<TextHunk> {
        let mut windows: Vec<Range<usize>> = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            if row.tag == RunTag::Equal {
                continue;
            }
            let start = i.saturating_sub(context);
            let end = (i + 1 + context).min(self.rows.len());
            match windows.last_mut() {
                Some(last) if start <= last.end => last.end = last.end.max(end),
                _ => windows.push(start..end),
            }
        }

        windows
            .into_iter()
            .map(|w| TextHunk {
                first_row: w.start,
                rows: self.rows[w].to_vec(),
            })
            .collect()
    }
}

/// Diff two byte buffers as UTF-8 text.
///
/// A leading byte-order mark is ignored. Invalid UTF-8 on either side is a
/// [`DiffError::Decode`].
pub fn diff_text(old: &[u8], new: &[u8]) -> DiffResult<TextDiffView> {
    let old_str = decode(old, "old")?;
    let new_str = decode(new, "new")?;

    let old_lines: Vec<&str> = old_str.lines().collect();
    let new_lines: Vec<&str> = new_str.lines().collect();

    let ops = similar::capture_diff_slices(Algorithm::Lcs, &old_lines, &new_lines);

    let mut runs = Vec::with_capacity(ops.len());
    let mut rows = Vec::new();

    for op in &ops {
        let tag = RunTag::from(op.tag());
        let old_range = op.old_range();
        let new_range = op.new_range();

        let height = old_range.len().max(new_range.len());
        for offset in 0..height {
            let left = (offset < old_range.len()).then(|| {
                let idx = old_range.start + offset;
                NumberedLine {
                    number: idx + 1,
                    text: old_lines[idx].to_string(),
                }
            });
            let right = (offset < new_range.len()).then(|| {
                let idx = new_range.start + offset;
                NumberedLine {
                    number: idx + 1,
                    text: new_lines[idx].to_string(),
                }
            });
            rows.push(SideBySideRow { tag, left, right });
        }

        runs.push(DiffRun {
            tag,
            old_range,
            new_range,
        });
    }

    Ok(TextDiffView {
        runs,
        rows,
        old_lines: old_lines.len(),
        new_lines: new_lines.len(),
    })
}

fn decode<'a>(bytes: &'a [u8], side: &'static str) -> DiffResult<&'a str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|e| DiffError::Decode {
        side,
        offset: e.valid_up_to(),
    })
}
