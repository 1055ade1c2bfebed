//! Content hashing and job fingerprint composition.
//!
//! [`ContentHasher`] streams a file or byte stream through a fixed buffer
//! into a 64-bit xxHash. The size of every read is recomputed from the
//! stream's *current* length, so a file that shrinks or grows while it is
//! being hashed still terminates and yields a digest. A digest of
//! [`NO_HASH`] means the input could not be read at all.
//!
//! [`JobFingerprint`] folds a job's inputs into the single value the
//! coordinator compares to decide whether a job must run again.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use xxhash_rust::xxh64::Xxh64;

use crate::builder::BuilderDescriptor;
use crate::diagnostics;
use crate::job::{DependencyEdge, JobDescriptor};

/// Reserved digest meaning "could not fingerprint".
pub const NO_HASH: u64 = 0;

/// Default read buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

const SEED: u64 = 0;

/// A readable stream that can report its current length and position.
pub trait LengthAwareRead: Read {
    /// Current total length. May change between calls.
    fn current_len(&mut self) -> io::Result<u64>;
    fn position(&mut self) -> io::Result<u64>;
}

impl LengthAwareRead for File {
    fn current_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn position(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

impl<T: AsRef<[u8]>> LengthAwareRead for Cursor<T> {
    fn current_len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().as_ref().len() as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(Cursor::position(self))
    }
}

/// Result of hashing a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashOutcome {
    pub digest: u64,
    pub bytes_read: u64,
}

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    buffer_size: usize,
    delay: Duration,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE, delay: Duration::ZERO }
    }
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer size in bytes; zero is treated as one.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Sleep after every chunk. Only useful to reproduce concurrent-writer races.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Hash everything currently readable from `stream`.
    pub fn hash_stream<S: LengthAwareRead>(&self, stream: &mut S) -> HashOutcome {
        let mut hasher = Xxh64::new(SEED);
        let mut buffer = vec![0u8; self.buffer_size];
        let mut bytes_read = 0u64;

        loop {
            let remaining = match remaining_len(stream) {
                Ok(remaining) => remaining,
                Err(err) => {
                    diagnostics::warning(format!("Unable to query stream length while hashing: {err}"));
                    break;
                }
            };
            let want = remaining.min(self.buffer_size as u64) as usize;
            if want == 0 {
                break;
            }

            let read = match stream.read(&mut buffer[..want]) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    diagnostics::warning(format!("Read failed while hashing: {err}"));
                    break;
                }
            };

            hasher.update(&buffer[..read]);
            bytes_read += read as u64;

            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }

        HashOutcome { digest: hasher.digest(), bytes_read }
    }

    /// Hash a file. Returns [`NO_HASH`] if it cannot be opened.
    pub fn hash_file(&self, path: &Path) -> HashOutcome {
        match File::open(path) {
            Ok(mut file) => self.hash_stream(&mut file),
            Err(err) => {
                diagnostics::warning(format!("Unable to open {} for hashing: {err}", path.display()));
                HashOutcome { digest: NO_HASH, bytes_read: 0 }
            }
        }
    }

    /// Hash many files in parallel, preserving input order.
    pub fn hash_files(&self, paths: &[PathBuf]) -> Vec<(PathBuf, u64)> {
        paths.par_iter().map(|path| (path.clone(), self.hash_file(path).digest)).collect()
    }
}

fn remaining_len<S: LengthAwareRead>(stream: &mut S) -> io::Result<u64> {
    let len = stream.current_len()?;
    let position = stream.position()?;
    Ok(len.saturating_sub(position))
}

/// Digest of an in-memory buffer, identical to hashing it as a stream.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxhash_rust::xxh64::xxh64(bytes, SEED)
}

/// Composes the fingerprint of one job.
///
/// Inputs are joined with `:` in the order they are added and hashed once.
#[derive(Debug, Clone)]
pub struct JobFingerprint {
    parts: Vec<String>,
}

impl JobFingerprint {
    /// Start from the builder's version and analysis fingerprint and the
    /// job's additional fingerprint info.
    pub fn new(builder: &BuilderDescriptor, job: &JobDescriptor) -> Self {
        Self {
            parts: vec![
                builder.version.to_string(),
                builder.analysis_fingerprint.clone(),
                job.additional_fingerprint_info.clone(),
            ],
        }
    }

    pub fn with_file_hash(mut self, digest: u64) -> Self {
        self.parts.push(format!("{digest:016x}"));
        self
    }

    /// Fold in a dependency's fingerprint if the edge carries fingerprint data.
    pub fn with_dependency(mut self, edge: &DependencyEdge, dependency_fingerprint: u64) -> Self {
        if edge.contributes_to_fingerprint() {
            self.parts.push(format!("{dependency_fingerprint:016x}"));
        }
        self
    }

    pub fn finish(&self) -> u64 {
        hash_bytes(self.parts.join(":").as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{
        CompletionLedger, JobDependency, JobDependencyType, SourceFileDependency,
    };
    use std::io::Write;

    /// A stream whose reported length drops after the first read.
    struct ShrinkingStream {
        inner: Cursor<Vec<u8>>,
        shrink_to: u64,
        reads: usize,
    }

    impl Read for ShrinkingStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            self.inner.read(buf)
        }
    }

    impl LengthAwareRead for ShrinkingStream {
        fn current_len(&mut self) -> io::Result<u64> {
            if self.reads == 0 {
                Ok(self.inner.get_ref().len() as u64)
            } else {
                Ok(self.shrink_to)
            }
        }

        fn position(&mut self) -> io::Result<u64> {
            Ok(self.inner.position())
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let hasher = ContentHasher::new();
        let a = hasher.hash_stream(&mut Cursor::new(b"hello world".to_vec()));
        let b = hasher.hash_stream(&mut Cursor::new(b"hello world".to_vec()));
        assert_eq!(a, b);
        assert_eq!(a.bytes_read, 11);
        assert_eq!(a.digest, hash_bytes(b"hello world"));
    }

    #[test]
    fn test_empty_stream_has_fixed_non_zero_digest() {
        let outcome = ContentHasher::new().hash_stream(&mut Cursor::new(Vec::<u8>::new()));
        assert_eq!(outcome.bytes_read, 0);
        assert_eq!(outcome.digest, 0xEF46_DB37_51D8_E999);
        assert_ne!(outcome.digest, NO_HASH);
    }

    #[test]
    fn test_small_buffer_matches_single_shot() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let outcome = ContentHasher::new().with_buffer_size(7).hash_stream(&mut Cursor::new(data.clone()));
        assert_eq!(outcome.digest, hash_bytes(&data));
        assert_eq!(outcome.bytes_read, data.len() as u64);
    }

    #[test]
    fn test_shrinking_stream_terminates() {
        let mut stream = ShrinkingStream {
            inner: Cursor::new(vec![1u8; 1000]),
            shrink_to: 300,
            reads: 0,
        };
        let outcome = ContentHasher::new().with_buffer_size(256).hash_stream(&mut stream);
        assert_eq!(outcome.bytes_read, 300);
        assert_ne!(outcome.digest, NO_HASH);
    }

    #[test]
    fn test_shrinking_below_position_stops() {
        let mut stream = ShrinkingStream {
            inner: Cursor::new(vec![1u8; 1000]),
            shrink_to: 10,
            reads: 0,
        };
        let outcome = ContentHasher::new().with_buffer_size(256).hash_stream(&mut stream);
        assert_eq!(outcome.bytes_read, 256);
    }

    #[test]
    fn test_hash_file_matches_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"texture data").unwrap();
        let outcome = ContentHasher::new().hash_file(file.path());
        assert_eq!(outcome.digest, hash_bytes(b"texture data"));
    }

    #[test]
    fn test_missing_file_is_no_hash() {
        let outcome = ContentHasher::new().hash_file(Path::new("/no/such/file.bin"));
        assert_eq!(outcome.digest, NO_HASH);
    }

    #[test]
    fn test_hash_files_preserves_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..5)
            .map(|i| {
                let path = dir.path().join(format!("{i}.txt"));
                std::fs::write(&path, format!("file {i}")).unwrap();
                path
            })
            .collect();

        let hashes = ContentHasher::new().hash_files(&paths);
        assert_eq!(hashes.len(), 5);
        for (i, (path, digest)) in hashes.iter().enumerate() {
            assert_eq!(path, &paths[i]);
            assert_eq!(*digest, hash_bytes(format!("file {i}").as_bytes()));
        }
    }

    fn fingerprint_parts() -> (BuilderDescriptor, JobDescriptor) {
        let mut builder = BuilderDescriptor::new("Copy", uuid::Uuid::from_u128(1));
        builder.version = 2;
        builder.analysis_fingerprint = "v1".to_string();
        (builder, JobDescriptor::new("params", "copy", "pc"))
    }

    fn edge(kind: JobDependencyType, ledger: &CompletionLedger) -> DependencyEdge {
        DependencyEdge::resolve(
            JobDependency::new("compile", "pc", kind, SourceFileDependency::by_path("a.txt")),
            ledger,
        )
    }

    #[test]
    fn test_job_fingerprint_tracks_inputs() {
        let (mut builder, job) = fingerprint_parts();
        let base = JobFingerprint::new(&builder, &job).with_file_hash(1).finish();
        assert_eq!(base, JobFingerprint::new(&builder, &job).with_file_hash(1).finish());
        assert_ne!(base, JobFingerprint::new(&builder, &job).with_file_hash(2).finish());

        builder.version = 3;
        assert_ne!(base, JobFingerprint::new(&builder, &job).with_file_hash(1).finish());
    }

    #[test]
    fn test_only_fingerprint_edges_contribute() {
        let (builder, job) = fingerprint_parts();
        let ledger = CompletionLedger::new();
        let base = JobFingerprint::new(&builder, &job).finish();

        for kind in [JobDependencyType::Order, JobDependencyType::OrderOnce] {
            let with_edge =
                JobFingerprint::new(&builder, &job).with_dependency(&edge(kind, &ledger), 99).finish();
            assert_eq!(base, with_edge);
        }

        let fingerprint_edge = edge(JobDependencyType::Fingerprint, &ledger);
        let a = JobFingerprint::new(&builder, &job).with_dependency(&fingerprint_edge, 1).finish();
        let b = JobFingerprint::new(&builder, &job).with_dependency(&fingerprint_edge, 2).finish();
        assert_ne!(base, a);
        assert_ne!(a, b);
    }
}
