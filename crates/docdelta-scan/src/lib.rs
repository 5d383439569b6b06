//! Tree scanner for docdelta.
//!
//! Walks a root (directory or single file), hashes every file's content in
//! fixed-size chunks, and produces a [`TreeSnapshot`]: an ordered map of
//! normalized relative paths to [`FileRecord`]s.
//!
//! # Key Types
//!
//! - [`ContentHasher`] -- Chunked, domain-separated BLAKE3 hasher
//! - [`ExcludeSet`] -- Substring exclude patterns
//! - [`TreeScanner`] -- Walks a root and builds a snapshot on a worker pool
//! - [`TreeSnapshot`] / [`FileRecord`] -- Result of one scan

pub mod error;
pub mod exclude;
pub mod hasher;
pub mod record;
pub mod scanner;

pub use error::{ScanError, ScanResult};
pub use exclude::ExcludeSet;
pub use hasher::ContentHasher;
pub use record::{ContentHash, FileKind, FileRecord, TreeSnapshot};
pub use scanner::TreeScanner;
