//! Snapshot entry types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

use docdelta_types::ContentDigest;
use serde::Serialize;

/// Whether an entry is a file or a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Dir,
}

/// Content hash of a file, or the reason it could not be computed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentHash {
    Digest(ContentDigest),
    Unreadable(String),
}

impl ContentHash {
    pub fn digest(&self) -> Option<&ContentDigest> {
        match self {
            Self::Digest(d) => Some(d),
            Self::Unreadable(_) => None,
        }
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::Unreadable(_))
    }
}

/// One entry in a [`TreeSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// `/`-separated path relative to the scan root.
    pub relative_path: String,
    pub kind: FileKind,
    /// Present for files only. Directories are never hashed.
    pub content_hash: Option<ContentHash>,
    /// Size in bytes (0 for directories and unreadable entries).
    pub size: u64,
    pub mtime: Option<SystemTime>,
}

impl FileRecord {
    /// A directory entry.
    pub fn dir(relative_path: impl Into<String>, mtime: Option<SystemTime>) -> Self {
        Self {
            relative_path: relative_path.into(),
            kind: FileKind::Dir,
            content_hash: None,
            size: 0,
            mtime,
        }
    }

    /// A file entry whose content was hashed.
    pub fn file(
        relative_path: impl Into<String>,
        digest: ContentDigest,
        size: u64,
        mtime: Option<SystemTime>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            kind: FileKind::File,
            content_hash: Some(ContentHash::Digest(digest)),
            size,
            mtime,
        }
    }

    /// A file entry that could not be read.
    pub fn unreadable(relative_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            kind: FileKind::File,
            content_hash: Some(ContentHash::Unreadable(reason.into())),
            size: 0,
            mtime: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// The content digest, if this is a readable file.
    pub fn digest(&self) -> Option<&ContentDigest> {
        self.content_hash.as_ref().and_then(ContentHash::digest)
    }
}

/// Result of one full walk: relative path to record, ordered by path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TreeSnapshot {
    /// The root the paths are relative to.
    pub root: PathBuf,
    pub entries: BTreeMap<String, FileRecord>,
}

impl TreeSnapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Insert a record keyed by its relative path.
    pub fn insert(&mut self, record: FileRecord) {
        self.entries.insert(record.relative_path.clone(), record);
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Relative paths of all file entries, in order.
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.entries
            .values()
            .filter(|r| r.is_file())
            .map(|r| r.relative_path.as_str())
    }

    /// Records that could not be hashed.
    pub fn unreadable(&self) -> impl Iterator<Item = &FileRecord> {
        self.entries
            .values()
            .filter(|r| r.content_hash.as_ref().is_some_and(ContentHash::is_unreadable))
    }

    /// Absolute path of an entry on disk.
    pub fn absolute_path(&self, relative_path: &str) -> PathBuf {
        if self.root.is_file() {
            return self.root.clone();
        }
        relative_path
            .split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}
