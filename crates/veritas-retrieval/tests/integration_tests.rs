//! Integration tests for veritas-retrieval
//!
//! Corrective retrieval against a real in-memory store.

use std::sync::Arc;
use veritas_domain::traits::VectorStore;
use veritas_domain::{Chunk, ChunkMetadata, RecommendedAction, Source, SourceType};
use veritas_llm::ResilientEmbedder;
use veritas_retrieval::{
    ChunkFilter, ContextSufficiencyEngine, QueryIntentPlanner, RetrievalConfig, StoreRetriever,
};
use veritas_store::MemoryStore;

fn chunk(url: &str, credibility: u32, text: &str) -> Chunk {
    let mut source = Source::new(url, "Doc", SourceType::OfficialDocs);
    source.credibility_score = credibility;
    let source = Arc::new(source);
    Chunk::new(Chunk::make_id(&source.id, 0), text, source, ChunkMetadata::default())
}

const DEFINITION: &str = "Tokio is an asynchronous runtime for the Rust programming language.";
const STEPS: &str = "Follow each step: first create a builder, then call build.";

#[tokio::test]
async fn test_howto_query_with_definition_only() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_documents(vec![chunk("https://docs.example/tokio", 80, DEFINITION)])
        .unwrap();

    let engine = ContextSufficiencyEngine::default();
    let retriever = StoreRetriever::lexical(Arc::clone(&store));
    let result = engine
        .retrieve(&retriever, "How to configure the Tokio runtime", false)
        .await
        .unwrap();

    assert!(result.needs_refinement);
    assert_eq!(result.iterations, 3);
    assert_eq!(result.history.len(), 3);
    assert!(result.sufficiency.missing_info.contains(&"process".to_string()));
    assert_eq!(result.sufficiency.recommended_action, RecommendedAction::SearchMore);
    assert_eq!(result.chunks.len(), 1);
    assert!(result.final_query.contains("step by step"));
}

#[tokio::test]
async fn test_refinement_finds_missing_component() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_documents(vec![
            chunk("https://docs.example/tokio", 80, DEFINITION),
            chunk("https://docs.example/builder", 80, STEPS),
        ])
        .unwrap();

    let engine = ContextSufficiencyEngine::default();
    let retriever = StoreRetriever::lexical(Arc::clone(&store));
    let result = engine
        .retrieve(&retriever, "How to configure the Tokio runtime", false)
        .await
        .unwrap();

    assert!(!result.needs_refinement);
    assert_eq!(result.iterations, 2);
    assert_eq!(result.history[0].retrieved, 1);
    assert_eq!(result.history[1].retrieved, 1);
    assert!(result.sufficiency.is_sufficient);
    assert_eq!(result.chunks.len(), 2);
}

#[tokio::test]
async fn test_strategy_filter_drops_low_credibility() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_documents(vec![
            chunk("https://docs.example/tokio", 80, DEFINITION),
            chunk("https://forum.example/tokio", 20, "Tokio is a runtime, trust me."),
        ])
        .unwrap();

    let analysis = QueryIntentPlanner::new().analyze("What is Tokio");
    let retriever = StoreRetriever::lexical(Arc::clone(&store))
        .with_filter(ChunkFilter::from_strategy(&analysis.strategy), 3);
    let engine = ContextSufficiencyEngine::new(RetrievalConfig::lenient()).unwrap();
    let result = engine.retrieve(&retriever, &analysis.query, false).await.unwrap();

    assert!(result.chunks.iter().all(|c| c.source.credibility_score >= 70));
    assert_eq!(result.chunks.len(), 1);
    assert!(result.sufficiency.is_sufficient);
}

#[tokio::test]
async fn test_vector_retrieval_with_pseudo_embeddings() {
    let embedder = ResilientEmbedder::offline(128);
    let store = Arc::new(MemoryStore::new());
    let texts = [DEFINITION, STEPS, "Bread needs flour, water, salt and time."];
    let mut chunks = Vec::new();
    for (i, text) in texts.iter().enumerate() {
        let vector = veritas_llm::HashEmbeddingModel::new(128).embed_one(text);
        chunks.push(chunk(&format!("https://a.example/{}", i), 80, text).with_embedding(vector));
    }
    store.add_documents(chunks).unwrap();

    let retriever = StoreRetriever::new(Arc::clone(&store), Arc::new(embedder));
    let engine = ContextSufficiencyEngine::new(RetrievalConfig {
        top_k: 1,
        ..RetrievalConfig::lenient()
    })
    .unwrap();
    let result = engine
        .retrieve(&retriever, "What is the Tokio asynchronous runtime", false)
        .await
        .unwrap();

    assert_eq!(result.chunks[0].content, DEFINITION);
}

#[tokio::test]
async fn test_single_source_rejected_when_diversity_required() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_documents(vec![chunk("https://docs.example/tokio", 80, DEFINITION)])
        .unwrap();

    let engine = ContextSufficiencyEngine::default();
    let retriever = StoreRetriever::lexical(Arc::clone(&store));
    let result = engine.retrieve(&retriever, "What is Tokio", true).await.unwrap();

    assert!(result.needs_refinement);
    assert!(!result.sufficiency.is_sufficient);
    assert!(result
        .sufficiency
        .missing_info
        .contains(&veritas_retrieval::SOURCE_DIVERSITY.to_string()));
}

#[tokio::test]
async fn test_credible_chunks_found_below_filtered_ones() {
    let store = Arc::new(MemoryStore::new());
    let mut chunks: Vec<Chunk> = (0..30)
        .map(|i| {
            chunk(
                &format!("https://forum.example/{}", i),
                20,
                "Configure the Tokio runtime. Configure the Tokio runtime. Tokio runtime configure.",
            )
        })
        .collect();
    chunks.push(chunk("https://docs.example/tokio", 90, DEFINITION));
    chunks.push(chunk(
        "https://docs.example/builder",
        90,
        "To configure the runtime, follow each step: first create a builder, then call build.",
    ));
    store.add_documents(chunks).unwrap();

    let filter = ChunkFilter {
        min_credibility: 60,
        ..ChunkFilter::none()
    };
    let retriever = StoreRetriever::lexical(Arc::clone(&store)).with_filter(filter, 3);
    let engine = ContextSufficiencyEngine::default();
    let result = engine
        .retrieve(&retriever, "How to configure the Tokio runtime", false)
        .await
        .unwrap();

    assert_eq!(result.chunks.len(), 2);
    assert!(result.chunks.iter().all(|c| c.source.credibility_score == 90));
    assert!(result.sufficiency.is_sufficient);
    assert!(!result.needs_refinement);
}

#[tokio::test]
async fn test_opinion_query_needs_strategy_min_sources() {
    const HASKELL: &str = "Haskell is a purely functional programming language.";
    let analysis = QueryIntentPlanner::new().analyze("Should I learn Haskell");
    let engine = ContextSufficiencyEngine::default();

    let two = Arc::new(MemoryStore::new());
    two.add_documents((0..2).map(|i| chunk(&format!("https://{}.example/haskell", i), 80, HASKELL)).collect())
        .unwrap();
    let result = engine
        .retrieve_for(&StoreRetriever::lexical(two), &analysis.query, &analysis.strategy)
        .await
        .unwrap();
    assert!(result.needs_refinement);
    assert!(result
        .sufficiency
        .missing_info
        .contains(&veritas_retrieval::SOURCE_DIVERSITY.to_string()));

    let four = Arc::new(MemoryStore::new());
    four.add_documents((0..4).map(|i| chunk(&format!("https://{}.example/haskell", i), 80, HASKELL)).collect())
        .unwrap();
    let result = engine
        .retrieve_for(&StoreRetriever::lexical(four), &analysis.query, &analysis.strategy)
        .await
        .unwrap();
    assert!(result.sufficiency.is_sufficient);
    assert_eq!(result.iterations, 1);
}
