//! Append-only JSON-lines backend
//!
//! One chunk record per line: `{id, content, source, embedding?, metadata}`.
//! Writers only ever append, each batch in a single `write_all` on a file
//! opened in append mode. Appends to one path are serialized by a lock
//! shared by every `JsonlStore` in the process, so concurrent ingesters never
//! interleave lines. Separate processes must not append to the same file at
//! the same time. Readers stream the file and keep a bounded top-k heap.
//!
//! A final line without a trailing newline is an append still in flight and
//! is ignored. A malformed record is skipped with a warning and counted.

use crate::scoring::Ranker;
use crate::StoreError;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};
use veritas_domain::traits::{SearchOptions, VectorStore};
use veritas_domain::{Chunk, Source};

/// Outcome of a full file scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Records parsed successfully
    pub records: usize,
    /// Complete lines that failed to parse
    pub skipped: usize,
    /// Trailing bytes of an append in progress
    pub partial: usize,
}

/// Append locks keyed by canonical store path
static APPEND_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn append_lock(path: &Path) -> Result<Arc<Mutex<()>>, StoreError> {
    let key = fs::canonicalize(path)?;
    let mut locks = APPEND_LOCKS.lock().map_err(|_| StoreError::Poisoned)?;
    Ok(Arc::clone(locks.entry(key).or_default()))
}

/// Durable store backed by a JSON-lines file
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
    append: Arc<Mutex<()>>,
}

impl JsonlStore {
    /// Open (creating if needed) a store at `path`
    ///
    /// Fails when the file cannot be created or opened for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;
        let append = append_lock(&path)?;
        Ok(Self { path, append })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stream every readable record through `visit`
    ///
    /// Chunks of the same source share one `Arc<Source>`.
    pub fn scan<F>(&self, mut visit: F) -> Result<ScanStats, StoreError>
    where
        F: FnMut(Chunk),
    {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ScanStats::default()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut stats = ScanStats::default();
        let mut sources: HashMap<String, Arc<Source>> = HashMap::new();
        let mut line = String::new();
        let mut line_no = 0usize;

        loop {
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            line_no += 1;

            if !line.ends_with('\n') {
                stats.partial = read;
                debug!("Ignoring {} bytes of an in-flight append in {}", read, self.path.display());
                break;
            }

            let record = line.trim();
            if record.is_empty() {
                continue;
            }

            match serde_json::from_str::<Chunk>(record) {
                Ok(mut chunk) => {
                    let shared = sources
                        .entry(chunk.source.id.clone())
                        .or_insert_with(|| Arc::clone(&chunk.source));
                    chunk.source = Arc::clone(shared);
                    stats.records += 1;
                    visit(chunk);
                }
                Err(e) => {
                    stats.skipped += 1;
                    warn!(
                        "Skipping malformed record at {}:{}: {}",
                        self.path.display(),
                        line_no,
                        e
                    );
                }
            }
        }

        Ok(stats)
    }

    /// Read every record
    pub fn read_all(&self) -> Result<(Vec<Chunk>, ScanStats), StoreError> {
        let mut chunks = Vec::new();
        let stats = self.scan(|chunk| chunks.push(chunk))?;
        Ok((chunks, stats))
    }

    fn rank(&self, mut ranker: Ranker<'_>) -> Result<Vec<Chunk>, StoreError> {
        self.scan(|chunk| ranker.offer(chunk))?;
        Ok(ranker.finish())
    }
}

impl VectorStore for JsonlStore {
    type Error = StoreError;

    fn add_documents(&self, chunks: Vec<Chunk>) -> Result<usize, Self::Error> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut batch = String::new();
        for chunk in &chunks {
            batch.push_str(&serde_json::to_string(chunk)?);
            batch.push('\n');
        }

        let _guard = self.append.lock().map_err(|_| StoreError::Poisoned)?;
        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            file.write_all(batch.as_bytes())?;
            file.flush()
        };
        write().map_err(|e| {
            error!("Failed to append {} chunks to {}: {}", chunks.len(), self.path.display(), e);
            StoreError::Io(e)
        })?;

        debug!("Appended {} chunks to {}", chunks.len(), self.path.display());
        Ok(chunks.len())
    }

    fn search(&self, query: &str, k: usize, options: &SearchOptions) -> Result<Vec<Chunk>, Self::Error> {
        self.rank(Ranker::for_search(query, k, options))
    }

    fn similarity_search(&self, embedding: &[f32], k: usize) -> Result<Vec<Chunk>, Self::Error> {
        let exclude = HashSet::new();
        self.rank(Ranker::for_similarity(embedding, k, &exclude))
    }

    fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.scan(|_| {})?.records)
    }

    fn has_embeddings(&self) -> Result<bool, Self::Error> {
        let mut found = false;
        self.scan(|chunk| found |= chunk.has_embedding())?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritas_domain::{ChunkMetadata, SourceType};

    fn chunks(n: usize) -> Vec<Chunk> {
        let source = Arc::new(Source::new("https://a.example", "A", SourceType::News));
        (0..n)
            .map(|i| {
                Chunk::new(
                    Chunk::make_id(&source.id, i),
                    format!("chunk number {}", i),
                    Arc::clone(&source),
                    ChunkMetadata {
                        position: i,
                        total_chunks: n,
                        ..ChunkMetadata::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.jsonl");
        let store = JsonlStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_reads_share_sources() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path().join("s.jsonl")).unwrap();
        store.add_documents(chunks(3)).unwrap();

        let (read, stats) = store.read_all().unwrap();
        assert_eq!(stats.records, 3);
        assert!(Arc::ptr_eq(&read[0].source, &read[2].source));
    }

    #[test]
    fn test_partial_trailing_line_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.jsonl");
        let store = JsonlStore::open(&path).unwrap();
        store.add_documents(chunks(2)).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"id\": \"half-writ").unwrap();

        let (_, stats) = store.read_all().unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.skipped, 0);
        assert!(stats.partial > 0);
    }

    #[test]
    fn test_stores_on_one_path_share_append_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.jsonl");
        let first = JsonlStore::open(&path).unwrap();
        let second = JsonlStore::open(dir.path().join(".").join("s.jsonl")).unwrap();
        assert!(Arc::ptr_eq(&first.append, &second.append));
        assert!(Arc::ptr_eq(&first.append, &first.clone().append));
    }

    #[test]
    fn test_concurrent_large_batches_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.jsonl");
        let padding = "x".repeat(4096);

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = JsonlStore::open(&path).unwrap();
                let padding = padding.clone();
                std::thread::spawn(move || {
                    let source = Arc::new(Source::new(format!("https://w{}.example", w), "W", SourceType::News));
                    let batch: Vec<Chunk> = (0..64)
                        .map(|i| {
                            Chunk::new(
                                Chunk::make_id(&source.id, i),
                                format!("{} {}", i, padding),
                                Arc::clone(&source),
                                ChunkMetadata::default(),
                            )
                        })
                        .collect();
                    store.add_documents(batch).unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let (_, stats) = JsonlStore::open(&path).unwrap().read_all().unwrap();
        assert_eq!(stats.records, 4 * 64);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.partial, 0);
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.jsonl");
        let store = JsonlStore::open(&path).unwrap();
        assert_eq!(store.add_documents(Vec::new()).unwrap(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}
