//! Integration tests for the Ingestor

#[cfg(test)]
mod tests {
    use crate::{DropReason, IngestConfig, IngestError, Ingestor};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use veritas_domain::traits::{EmbeddingModel, SearchOptions, SourceProvider, VectorStore};
    use veritas_domain::{Chunk, Source, SourceType};
    use veritas_llm::embedding::DEFAULT_DIMENSION;
    use veritas_llm::{HashEmbeddingModel, ResilientEmbedder};
    use veritas_store::{MemoryStore, StoreError};

    const GUIDE: &str = "# Tokio\n\nTokio is an asynchronous runtime for the Rust programming language.\n\n## Tasks\n\nA task is a lightweight unit of execution. Tasks are scheduled cooperatively on worker threads.\n\nHowever, blocking calls stall the worker thread.";

    fn config() -> IngestConfig {
        let mut config = IngestConfig::default();
        config.credibility.reference_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        config
    }

    fn docs(url: &str) -> Source {
        Source::new(url, "Tokio guide", SourceType::OfficialDocs).with_content(GUIDE)
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingModel for FailingEmbedder {
        type Error = std::io::Error;

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, Self::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "embedding service down"))
        }

        fn dimension(&self) -> Option<usize> {
            None
        }
    }

    struct ReadOnlyStore;

    impl VectorStore for ReadOnlyStore {
        type Error = StoreError;

        fn add_documents(&self, _chunks: Vec<Chunk>) -> Result<usize, Self::Error> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn search(&self, _q: &str, _k: usize, _o: &SearchOptions) -> Result<Vec<Chunk>, Self::Error> {
            Ok(Vec::new())
        }

        fn similarity_search(&self, _e: &[f32], _k: usize) -> Result<Vec<Chunk>, Self::Error> {
            Ok(Vec::new())
        }

        fn count(&self) -> Result<usize, Self::Error> {
            Ok(0)
        }

        fn has_embeddings(&self) -> Result<bool, Self::Error> {
            Ok(false)
        }
    }

    struct ScriptedProvider;

    #[async_trait]
    impl SourceProvider for ScriptedProvider {
        type Error = std::io::Error;

        async fn fetch(&self, query: &str) -> Result<Vec<Source>, Self::Error> {
            match query {
                "tokio" => Ok(vec![docs("https://docs.example/tokio"), docs("https://mirror.example/tokio")]),
                "tokio again" => Ok(vec![docs("https://docs.example/tokio")]),
                _ => Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "search timed out")),
            }
        }
    }

    #[tokio::test]
    async fn test_full_ingest_flow() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(Arc::clone(&store), Arc::new(ResilientEmbedder::offline(64)), config()).unwrap();

        let report = ingestor.ingest(vec![docs("https://docs.example/tokio")]).await.unwrap();

        assert_eq!(report.sources_received, 1);
        assert_eq!(report.sources_ingested(), 1);
        assert!(report.chunks_stored >= 1);
        assert_eq!(report.chunks_embedded, report.chunks_stored);
        assert_eq!(store.count().unwrap(), report.chunks_stored);
        assert!(store.has_embeddings().unwrap());

        let source = &report.sources[0];
        assert_eq!(source.credibility_score, source.credibility_breakdown.total());
        assert!(source.credibility_score > 0);

        let hits = store.search("worker threads", 3, &SearchOptions::default()).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].source.id, source.id);
    }

    #[tokio::test]
    async fn test_sources_without_content_are_dropped() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(Arc::clone(&store), Arc::new(ResilientEmbedder::offline(32)), config()).unwrap();

        let empty = Source::new("https://empty.example", "Empty", SourceType::Blog);
        let blank = Source::new("https://blank.example", "Blank", SourceType::Blog).with_content("   ");
        let report = ingestor
            .ingest(vec![empty, blank, docs("https://docs.example/tokio")])
            .await
            .unwrap();

        assert_eq!(report.sources_received, 3);
        assert_eq!(report.sources_ingested(), 1);
        assert_eq!(report.dropped.len(), 2);
        assert!(report.dropped.iter().all(|d| d.reason == DropReason::NoContent));
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back_to_pseudo_embeddings() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(Arc::clone(&store), Arc::new(FailingEmbedder), config())
            .unwrap()
            .with_fallback(HashEmbeddingModel::new(48));

        let report = ingestor.ingest(vec![docs("https://docs.example/tokio")]).await.unwrap();

        assert!(report.chunks_stored >= 1);
        assert_eq!(report.chunks_embedded, report.chunks_stored);
        assert!(store.has_embeddings().unwrap());

        let (_, chunks) = ingestor.prepare(vec![docs("https://docs.example/tokio")], &mut Vec::new());
        for chunk in chunks {
            let stored = store.get(&chunk.id).unwrap().unwrap();
            assert_eq!(stored.embedding.map(|e| e.len()), Some(48));
        }
    }

    #[tokio::test]
    async fn test_fallback_dimension_defaults_without_embedder_hint() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(Arc::clone(&store), Arc::new(FailingEmbedder), config()).unwrap();

        ingestor.ingest(vec![docs("https://docs.example/tokio")]).await.unwrap();

        let (_, chunks) = ingestor.prepare(vec![docs("https://docs.example/tokio")], &mut Vec::new());
        let stored = store.get(&chunks[0].id).unwrap().unwrap();
        assert_eq!(stored.embedding.map(|e| e.len()), Some(DEFAULT_DIMENSION));
    }

    #[tokio::test]
    async fn test_resilient_embedder_covers_provider_outage() {
        let store = Arc::new(MemoryStore::new());
        let embedder = ResilientEmbedder::new(FailingEmbedder).with_batch_size(2);
        let ingestor = Ingestor::new(Arc::clone(&store), Arc::new(embedder), config()).unwrap();

        let report = ingestor.ingest(vec![docs("https://docs.example/tokio")]).await.unwrap();
        assert_eq!(report.chunks_embedded, report.chunks_stored);
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal() {
        let ingestor = Ingestor::new(Arc::new(ReadOnlyStore), Arc::new(ResilientEmbedder::offline(16)), config()).unwrap();
        let result = ingestor.ingest(vec![docs("https://docs.example/tokio")]).await;
        assert!(matches!(result, Err(IngestError::Store(_))));
    }

    #[tokio::test]
    async fn test_ingest_from_provider_records_failures() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(Arc::clone(&store), Arc::new(ResilientEmbedder::offline(32)), config()).unwrap();

        let queries = vec!["tokio".to_string(), "broken".to_string(), "tokio again".to_string()];
        let report = ingestor.ingest_from(&ScriptedProvider, &queries).await.unwrap();

        assert_eq!(report.sources_received, 3);
        assert_eq!(report.sources_ingested(), 2);
        assert!(report
            .dropped
            .iter()
            .any(|d| d.reference == "broken" && matches!(d.reason, DropReason::FetchFailed(_))));
        assert!(report.dropped.iter().any(|d| d.reason == DropReason::Duplicate));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = IngestConfig {
            embed_batch_size: 0,
            ..IngestConfig::default()
        };
        let result = Ingestor::new(Arc::new(MemoryStore::new()), Arc::new(ResilientEmbedder::offline(8)), config);
        assert!(matches!(result, Err(IngestError::Config(_))));
    }

    #[tokio::test]
    async fn test_reingest_is_deterministic() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(Arc::clone(&store), Arc::new(ResilientEmbedder::offline(32)), config()).unwrap();

        let first = ingestor.ingest(vec![docs("https://docs.example/tokio")]).await.unwrap();
        let second = ingestor.ingest(vec![docs("https://docs.example/tokio")]).await.unwrap();

        assert_eq!(first.chunks_stored, second.chunks_stored);
        assert_eq!(first.sources[0].credibility_score, second.sources[0].credibility_score);
        assert_eq!(store.count().unwrap(), first.chunks_stored);
    }
}
