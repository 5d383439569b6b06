//! Filesystem walk and parallel hashing.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docdelta_types::DiffConfig;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{ScanError, ScanResult};
use crate::exclude::ExcludeSet;
use crate::hasher::ContentHasher;
use crate::record::{FileRecord, TreeSnapshot};

/// A file found during the walk, waiting to be hashed.
struct PendingFile {
    relative_path: String,
    path: PathBuf,
    metadata: Option<Metadata>,
}

/// Builds [`TreeSnapshot`]s.
///
/// The walk itself is sequential; file hashing fans out over a bounded
/// rayon pool. Each file produces exactly one record, and the snapshot is
/// assembled only after every hashing task has finished.
pub struct TreeScanner {
    hasher: ContentHasher,
    excludes: ExcludeSet,
    pool: Arc<rayon::ThreadPool>,
}

impl std::fmt::Debug for TreeScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeScanner")
            .field("hasher", &self.hasher)
            .field("excludes", &self.excludes)
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

impl TreeScanner {
    /// Create a scanner with its own worker pool sized from `config`.
    pub fn new(config: &DiffConfig) -> ScanResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_workers())
            .thread_name(|i| format!("docdelta-hash-{i}"))
            .build()
            .map_err(|e| ScanError::WorkerPool(e.to_string()))?;
        Ok(Self::with_pool(config, Arc::new(pool)))
    }

    /// Create a scanner that shares an existing pool.
    pub fn with_pool(config: &DiffConfig, pool: Arc<rayon::ThreadPool>) -> Self {
        Self {
            hasher: ContentHasher::FILE.with_chunk_size(config.hash_chunk_size),
            excludes: ExcludeSet::new(config.exclude.iter().cloned()),
            pool,
        }
    }

    /// Replace the exclude patterns.
    pub fn with_excludes(mut self, excludes: ExcludeSet) -> Self {
        self.excludes = excludes;
        self
    }

    /// Walk `root` and build its snapshot.
    ///
    /// A file root produces a single entry keyed by its file name. Read
    /// failures on individual files are recorded as unreadable entries and
    /// do not abort the scan.
    pub fn scan(&self, root: &Path) -> ScanResult<TreeSnapshot> {
        let root_meta = std::fs::metadata(root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::RootNotFound(root.to_path_buf())
            } else {
                ScanError::RootUnreadable {
                    path: root.to_path_buf(),
                    source: e,
                }
            }
        })?;

        info!(root = %root.display(), "scanning tree");
        let mut snapshot = TreeSnapshot::new(root);
        let mut pending = Vec::new();

        if root_meta.is_file() {
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.to_string_lossy().into_owned());
            if !self.excludes.is_excluded(&name) {
                pending.push(PendingFile {
                    relative_path: name,
                    path: root.to_path_buf(),
                    metadata: Some(root_meta),
                });
            }
        } else {
            self.walk(root, &mut snapshot, &mut pending);
        }

        let hasher = &self.hasher;
        let records: Vec<FileRecord> = self
            .pool
            .install(|| pending.par_iter().map(|p| hash_pending(hasher, p)).collect());

        for record in records {
            snapshot.insert(record);
        }

        info!(
            root = %root.display(),
            entries = snapshot.len(),
            unreadable = snapshot.unreadable().count(),
            "scan complete"
        );
        Ok(snapshot)
    }

    fn walk(&self, root: &Path, snapshot: &mut TreeSnapshot, pending: &mut Vec<PendingFile>) {
        let excludes = &self.excludes;
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| match relative_path(root, entry.path()) {
                Some(rel) => !excludes.is_excluded(&rel),
                None => true,
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry during walk");
                    continue;
                }
            };
            let Some(rel) = relative_path(root, entry.path()) else {
                continue;
            };

            if entry.file_type().is_dir() {
                let mtime = entry.metadata().ok().and_then(|m| m.modified().ok());
                snapshot.insert(FileRecord::dir(rel, mtime));
            } else {
                // Symlinks are not descended into; a link is hashed as the
                // file it points at, and a dangling link becomes unreadable.
                let metadata = std::fs::metadata(entry.path()).ok();
                if metadata.as_ref().is_some_and(|m| m.is_dir()) {
                    let mtime = metadata.and_then(|m| m.modified().ok());
                    snapshot.insert(FileRecord::dir(rel, mtime));
                    continue;
                }
                pending.push(PendingFile {
                    relative_path: rel,
                    path: entry.into_path(),
                    metadata,
                });
            }
        }
        debug!(dirs = snapshot.len(), files = pending.len(), "walk finished");
    }
}

fn hash_pending(hasher: &ContentHasher, pending: &PendingFile) -> FileRecord {
    match hasher.hash_file(&pending.path) {
        Ok(digest) => {
            let (size, mtime) = pending
                .metadata
                .as_ref()
                .map(|m| (m.len(), m.modified().ok()))
                .unwrap_or((0, None));
            FileRecord::file(pending.relative_path.clone(), digest, size, mtime)
        }
        Err(e) => {
            warn!(path = %pending.path.display(), error = %e, "failed to hash file");
            FileRecord::unreadable(pending.relative_path.clone(), e.to_string())
        }
    }
}

/// `/`-joined path of `path` relative to `root`, or `None` for the root itself.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ContentHash, FileKind};
    use std::fs;

    fn scanner() -> TreeScanner {
        let config = DiffConfig {
            worker_threads: Some(2),
            ..DiffConfig::default()
        };
        TreeScanner::new(&config).unwrap()
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn records_files_and_dirs_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.txt", "top");
        write(dir.path(), "sub/inner.txt", "inner");
        write(dir.path(), "sub/deeper/leaf.txt", "leaf");

        let snap = scanner().scan(dir.path()).unwrap();
        let keys: Vec<&str> = snap.entries.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["sub", "sub/deeper", "sub/deeper/leaf.txt", "sub/inner.txt", "top.txt"]
        );
        assert_eq!(snap.get("sub").unwrap().kind, FileKind::Dir);
        assert!(snap.get("sub").unwrap().content_hash.is_none());

        let leaf = snap.get("sub/deeper/leaf.txt").unwrap();
        assert_eq!(leaf.size, 4);
        assert_eq!(leaf.digest(), Some(&ContentHasher::FILE.hash(b"leaf")));
        assert!(leaf.mtime.is_some());
    }

    #[test]
    fn excluded_directory_is_not_descended() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "keep.txt", "k");
        write(dir.path(), ".git/HEAD", "ref");
        write(dir.path(), ".git/objects/aa", "blob");

        let scanner = scanner().with_excludes(ExcludeSet::new([".git"]));
        let snap = scanner.scan(dir.path()).unwrap();
        assert!(snap.contains("keep.txt"));
        assert!(snap.entries.keys().all(|k| !k.contains(".git")));
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn excludes_apply_to_files_independently() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main.rs", "fn main() {}");
        write(dir.path(), "src/main.rs.bak", "old");

        let scanner = scanner().with_excludes(ExcludeSet::new([".bak"]));
        let snap = scanner.scan(dir.path()).unwrap();
        assert!(snap.contains("src"));
        assert!(snap.contains("src/main.rs"));
        assert!(!snap.contains("src/main.rs.bak"));
    }

    #[test]
    fn single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "report.txt", "hello");

        let snap = scanner().scan(&dir.path().join("report.txt")).unwrap();
        assert_eq!(snap.len(), 1);
        let rec = snap.get("report.txt").unwrap();
        assert_eq!(rec.digest(), Some(&ContentHasher::FILE.hash(b"hello")));
        assert_eq!(snap.absolute_path("report.txt"), dir.path().join("report.txt"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = scanner().scan(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound(_)));
    }

    #[test]
    fn identical_content_same_digest_across_trees() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write(a.path(), "x.txt", "same");
        write(b.path(), "x.txt", "same");
        let s = scanner();
        let sa = s.scan(a.path()).unwrap();
        let sb = s.scan(b.path()).unwrap();
        assert_eq!(sa.get("x.txt").unwrap().digest(), sb.get("x.txt").unwrap().digest());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_recorded_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ok.txt", "ok");
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("link")).unwrap();

        let snap = scanner().scan(dir.path()).unwrap();
        assert!(snap.get("ok.txt").unwrap().digest().is_some());
        let link = snap.get("link").unwrap();
        assert!(matches!(link.content_hash, Some(ContentHash::Unreadable(_))));
    }

    #[test]
    fn relative_path_normalizes_separators() {
        let root = Path::new("/base");
        assert_eq!(
            relative_path(root, &root.join("a").join("b.txt")),
            Some("a/b.txt".to_string())
        );
        assert_eq!(relative_path(root, root), None);
    }
}
