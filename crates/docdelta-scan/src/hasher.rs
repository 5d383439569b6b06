use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use docdelta_types::ContentDigest;

/// Default read size when streaming content through the hasher.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Domain-separated, chunked BLAKE3 content hasher.
///
/// The domain tag is fed to the hasher before any content, so digests from
/// different domains never collide even for identical bytes. Content is read
/// in fixed-size chunks and never loaded whole.
#[derive(Clone, Debug)]
pub struct ContentHasher {
    domain: &'static str,
    chunk_size: usize,
}

impl ContentHasher {
    /// Hasher for regular file content.
    pub const FILE: Self = Self {
        domain: "docdelta-file-v1",
        chunk_size: DEFAULT_CHUNK_SIZE,
    };

    /// Same domain, different read size. A zero size falls back to the default.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }

    /// Hash an in-memory byte slice.
    pub fn hash(&self, data: &[u8]) -> ContentDigest {
        let mut hasher = self.start();
        hasher.update(data);
        ContentDigest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Stream a reader to EOF in `chunk_size` pieces.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentDigest> {
        let mut hasher = self.start();
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(ContentDigest::from_hash(*hasher.finalize().as_bytes()))
    }

    /// Open and stream a file.
    pub fn hash_file(&self, path: &Path) -> io::Result<ContentDigest> {
        let file = File::open(path)?;
        self.hash_reader(file)
    }

}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::FILE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = ContentHasher::FILE.hash(b"same bytes");
        let b = ContentHasher::FILE.hash(b"same bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn single_byte_change_differs() {
        let a = ContentHasher::FILE.hash(b"abcdef");
        let b = ContentHasher::FILE.hash(b"abcdeg");
        assert_ne!(a, b);
    }

    #[test]
    fn reader_matches_slice_for_any_chunk_size() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let expected = ContentHasher::FILE.hash(&data);
        for chunk in [1, 7, 4096, 8192, 100_000] {
            let hasher = ContentHasher::FILE.with_chunk_size(chunk);
            assert_eq!(hasher.hash_reader(&data[..]).unwrap(), expected, "chunk {chunk}");
        }
    }

    #[test]
    fn domains_are_separated() {
        let other = ContentHasher {
            domain: "other-domain-v1",
            ..ContentHasher::FILE
        };
        assert_ne!(other.hash(b"x"), ContentHasher::FILE.hash(b"x"));
        assert_ne!(
            ContentHasher::FILE.hash(b"x").as_bytes(),
            blake3::hash(b"x").as_bytes()
        );
    }

    #[test]
    fn zero_chunk_size_uses_default() {
        let hasher = ContentHasher::FILE.with_chunk_size(0);
        assert_eq!(hasher.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn hash_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"on disk").unwrap();
        assert_eq!(
            ContentHasher::FILE.hash_file(&path).unwrap(),
            ContentHasher::FILE.hash(b"on disk")
        );
    }

    #[test]
    fn hash_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ContentHasher::FILE.hash_file(&dir.path().join("missing")).is_err());
    }
}
