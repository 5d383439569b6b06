//! Whole-tree comparison: scan, partition, then dispatch changed files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use docdelta_diff::{compare_snapshots, ComparisonResult, ComparisonStats};
use docdelta_scan::{ContentHash, ExcludeSet, FileRecord, TreeScanner, TreeSnapshot};
use docdelta_types::{DiffConfig, DiffOutcome, FailureKind, RunId};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::error::{DispatchError, DispatchResult};

/// Result of comparing two trees.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeReport {
    pub run_id: RunId,
    pub left_root: PathBuf,
    pub right_root: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub comparison: ComparisonResult,
    pub stats: ComparisonStats,
    /// Content comparison of every path in `comparison.different`, keyed by
    /// path. Empty when content dispatch is disabled.
    pub outcomes: BTreeMap<String, DispatchOutcome>,
}

impl TreeReport {
    /// Paths whose content comparison failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DispatchOutcome)> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(p, o)| (p.as_str(), o))
    }
}

/// Scans two roots, partitions their paths, and compares the content of
/// every changed file pair.
///
/// Hashing, page rendering, and per-file dispatch share one bounded pool.
pub struct TreeComparison {
    scanner: TreeScanner,
    dispatcher: Dispatcher,
    pool: Arc<rayon::ThreadPool>,
    dispatch_content: bool,
}

impl std::fmt::Debug for TreeComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeComparison")
            .field("scanner", &self.scanner)
            .field("dispatcher", &self.dispatcher)
            .field("dispatch_content", &self.dispatch_content)
            .finish()
    }
}

impl TreeComparison {
    pub fn new(config: &DiffConfig) -> DispatchResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_workers())
            .thread_name(|i| format!("docdelta-worker-{i}"))
            .build()
            .map_err(|e| DispatchError::WorkerPool(e.to_string()))?;
        let pool = Arc::new(pool);

        Ok(Self {
            scanner: TreeScanner::with_pool(config, Arc::clone(&pool)),
            dispatcher: Dispatcher::with_pool(config, Arc::clone(&pool)),
            pool,
            dispatch_content: true,
        })
    }

    /// Replace the scanner's exclude patterns.
    pub fn with_excludes(mut self, excludes: ExcludeSet) -> Self {
        self.scanner = self.scanner.with_excludes(excludes);
        self
    }

    /// Turn per-file content comparison on or off. When off, only the path
    /// partition is computed.
    pub fn with_content_dispatch(mut self, enabled: bool) -> Self {
        self.dispatch_content = enabled;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Compare the trees at `left` and `right`.
    ///
    /// Either root may be a single file. Two file roots are compared as one
    /// path keyed by the left file's name, whatever the right one is called.
    ///
    /// Fails only if a root cannot be scanned. A failure on one file pair
    /// is recorded in that path's outcome.
    pub fn run(&self, run_id: RunId, left: &Path, right: &Path) -> DispatchResult<TreeReport> {
        info!(run_id = %run_id, left = %left.display(), right = %right.display(), "tree comparison started");

        let snap_a = self.scanner.scan(left)?;
        let mut snap_b = self.scanner.scan(right)?;
        if left.is_file() && right.is_file() {
            rekey_file_root(&snap_a, &mut snap_b);
        }
        let comparison = compare_snapshots(&snap_a, &snap_b);

        let outcomes = if self.dispatch_content {
            self.dispatch_different(run_id, &comparison, &snap_a, &snap_b)
        } else {
            BTreeMap::new()
        };

        let report = TreeReport {
            run_id,
            left_root: left.to_path_buf(),
            right_root: right.to_path_buf(),
            generated_at: Utc::now(),
            stats: comparison.stats(),
            comparison,
            outcomes,
        };
        info!(
            run_id = %run_id,
            identical = report.stats.identical,
            different = report.stats.different,
            only_in_a = report.stats.only_in_a,
            only_in_b = report.stats.only_in_b,
            failed = report.failures().count(),
            "tree comparison complete"
        );
        Ok(report)
    }

    fn dispatch_different(
        &self,
        run_id: RunId,
        comparison: &ComparisonResult,
        a: &TreeSnapshot,
        b: &TreeSnapshot,
    ) -> BTreeMap<String, DispatchOutcome> {
        self.pool.install(|| {
            comparison
                .different
                .par_iter()
                .map(|path| (path.clone(), self.dispatch_one(run_id, path, a, b)))
                .collect()
        })
    }

    fn dispatch_one(&self, run_id: RunId, path: &str, a: &TreeSnapshot, b: &TreeSnapshot) -> DispatchOutcome {
        let (Some(rec_a), Some(rec_b)) = (a.get(path), b.get(path)) else {
            return DiffOutcome::failed(FailureKind::SchemaMismatch, "path missing from one snapshot");
        };
        if !(rec_a.is_file() && rec_b.is_file()) {
            return DiffOutcome::failed(
                FailureKind::SchemaMismatch,
                "file on one side, directory on the other",
            );
        }
        // The scanner already failed to read it; do not try again.
        for (side, record) in [("left", rec_a), ("right", rec_b)] {
            if let Some(ContentHash::Unreadable(reason)) = &record.content_hash {
                return DiffOutcome::failed(
                    FailureKind::HashFailure,
                    format!("{side} file could not be hashed: {reason}"),
                );
            }
        }
        self.dispatcher
            .compare_files(run_id, &a.absolute_path(path), &b.absolute_path(path))
    }
}

/// Re-key the single record of a file-root snapshot to the other file
/// root's path so both sides meet in the partition.
fn rekey_file_root(a: &TreeSnapshot, b: &mut TreeSnapshot) {
    let (Some(key), Some(record)) = (a.entries.keys().next(), b.entries.values().next()) else {
        return;
    };
    let record = FileRecord {
        relative_path: key.clone(),
        ..record.clone()
    };
    b.entries.clear();
    b.insert(record);
}
