//! In-memory backend keyed by chunk id

use crate::scoring::Ranker;
use crate::StoreError;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard};
use tracing::debug;
use veritas_domain::traits::{SearchOptions, VectorStore};
use veritas_domain::Chunk;

/// Hash-map backed chunk store
///
/// Adding a chunk whose id is already present replaces the stored copy.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chunks: RwLock<HashMap<String, Chunk>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a chunk by id
    pub fn get(&self, id: &str) -> Result<Option<Chunk>, StoreError> {
        Ok(self.read()?.get(id).cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Chunk>>, StoreError> {
        self.chunks.read().map_err(|_| StoreError::Poisoned)
    }

    fn rank(&self, mut ranker: Ranker<'_>) -> Result<Vec<Chunk>, StoreError> {
        let chunks = self.read()?;
        // Sorted ids keep ranking independent of hash-map order
        let mut ids: Vec<&String> = chunks.keys().collect();
        ids.sort();
        for id in ids {
            if let Some(chunk) = chunks.get(id) {
                ranker.offer(chunk.clone());
            }
        }
        Ok(ranker.finish())
    }
}

impl VectorStore for MemoryStore {
    type Error = StoreError;

    fn add_documents(&self, chunks: Vec<Chunk>) -> Result<usize, Self::Error> {
        let mut stored = self.chunks.write().map_err(|_| StoreError::Poisoned)?;
        let count = chunks.len();
        for chunk in chunks {
            stored.insert(chunk.id.clone(), chunk);
        }
        debug!("Stored {} chunks in memory ({} total)", count, stored.len());
        Ok(count)
    }

    fn search(&self, query: &str, k: usize, options: &SearchOptions) -> Result<Vec<Chunk>, Self::Error> {
        self.rank(Ranker::for_search(query, k, options))
    }

    fn similarity_search(&self, embedding: &[f32], k: usize) -> Result<Vec<Chunk>, Self::Error> {
        let exclude = HashSet::new();
        self.rank(Ranker::for_similarity(embedding, k, &exclude))
    }

    fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.read()?.len())
    }

    fn has_embeddings(&self) -> Result<bool, Self::Error> {
        Ok(self.read()?.values().any(Chunk::has_embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use veritas_domain::{ChunkMetadata, Source, SourceType};

    fn chunk(id: &str, content: &str) -> Chunk {
        let source = Arc::new(Source::new("https://a.example", "A", SourceType::Blog));
        Chunk::new(id, content, source, ChunkMetadata::default())
    }

    #[test]
    fn test_add_and_count() {
        let store = MemoryStore::new();
        assert_eq!(store.count().unwrap(), 0);

        let added = store
            .add_documents(vec![chunk("a", "one"), chunk("b", "two")])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.count().unwrap(), 2);
        assert!(!store.has_embeddings().unwrap());
    }

    #[test]
    fn test_same_id_replaces() {
        let store = MemoryStore::new();
        store.add_documents(vec![chunk("a", "old")]).unwrap();
        store.add_documents(vec![chunk("a", "new")]).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("a").unwrap().unwrap().content, "new");
    }

    #[test]
    fn test_lexical_search() {
        let store = MemoryStore::new();
        store
            .add_documents(vec![
                chunk("a", "Ownership in Rust"),
                chunk("b", "Rust ownership and Rust borrowing"),
                chunk("c", "Gardening tips"),
            ])
            .unwrap();

        let results = store.search("rust ownership", 10, &SearchOptions::default()).unwrap();
        let ids: Vec<&str> = results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_similarity_search() {
        let store = MemoryStore::new();
        store
            .add_documents(vec![
                chunk("x", "x").with_embedding(vec![1.0, 0.0]),
                chunk("y", "y").with_embedding(vec![0.0, 1.0]),
                chunk("z", "z"),
            ])
            .unwrap();

        assert!(store.has_embeddings().unwrap());
        let results = store.similarity_search(&[0.9, 0.1], 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "x");
    }
}
