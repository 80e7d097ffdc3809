use crate::embeddings::Embedder;
use crate::models::{ChunkMetadata, IndexStats, IndexedVector, TextChunk};
use crate::traits::SimilarityIndex;
use tracing::{error, warn};

pub fn chunk_id(document_id: &str, sequence_index: usize) -> String {
    format!("{document_id}_chunk_{sequence_index}")
}

pub struct ChunkIndex<E, S>
where
    E: Embedder,
    S: SimilarityIndex,
{
    embedder: E,
    store: S,
}

impl<E, S> ChunkIndex<E, S>
where
    E: Embedder,
    S: SimilarityIndex + Send + Sync,
{
    pub fn new(embedder: E, store: S) -> Self {
        Self { embedder, store }
    }

    pub async fn ingest(&self, document_id: &str, chunks: &[String]) -> bool {
        let embeddings = match self.embedder.embed_batch(chunks) {
            Ok(embeddings) => embeddings,
            Err(error) => {
                error!(
                    document_id = %document_id,
                    error = %error,
                    "chunk embedding failed, nothing was ingested"
                );
                return false;
            }
        };

        if embeddings.len() != chunks.len() {
            error!(
                document_id = %document_id,
                chunks = chunks.len(),
                embeddings = embeddings.len(),
                "embedder returned wrong batch size, nothing was ingested"
            );
            return false;
        }

        let points = chunks
            .iter()
            .enumerate()
            .map(|(sequence_index, text)| TextChunk {
                source_document_id: document_id.to_string(),
                sequence_index,
                text: text.clone(),
            })
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedVector {
                chunk_id: chunk_id(&chunk.source_document_id, chunk.sequence_index),
                embedding,
                text: chunk.text,
                metadata: ChunkMetadata {
                    document_id: chunk.source_document_id,
                    sequence_index: chunk.sequence_index,
                },
            })
            .collect::<Vec<_>>();

        match self.store.add_vectors(&points).await {
            Ok(()) => true,
            Err(error) => {
                error!(
                    document_id = %document_id,
                    error = %error,
                    "vector store rejected the chunk batch"
                );
                false
            }
        }
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Vec<String> {
        let query_vector = match self.embedder.embed(query) {
            Ok(vector) => vector,
            Err(error) => {
                warn!(error = %error, "query embedding failed, returning no results");
                return Vec::new();
            }
        };

        match self.store.query_nearest(&query_vector, top_k).await {
            Ok(hits) => hits.into_iter().map(|hit| hit.text).collect(),
            Err(error) => {
                warn!(error = %error, "vector search failed, returning no results");
                Vec::new()
            }
        }
    }

    pub async fn stats(&self) -> IndexStats {
        match self.store.vector_count().await {
            Ok(total_vectors) => IndexStats {
                total_vectors,
                error: None,
            },
            Err(error) => {
                warn!(error = %error, "vector count unavailable");
                IndexStats {
                    total_vectors: 0,
                    error: Some(error.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashedNgramEmbedder;
    use crate::error::{IngestError, SearchError};
    use crate::models::ScoredChunk;
    use crate::stores::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        added: Mutex<Vec<IndexedVector>>,
        add_calls: AtomicUsize,
    }

    #[async_trait]
    impl SimilarityIndex for RecordingStore {
        async fn add_vectors(&self, points: &[IndexedVector]) -> Result<(), SearchError> {
            self.add_calls.fetch_add(1, Ordering::SeqCst);
            self.added
                .lock()
                .expect("lock")
                .extend(points.iter().cloned());
            Ok(())
        }

        async fn query_nearest(
            &self,
            _query_vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<ScoredChunk>, SearchError> {
            Ok(Vec::new())
        }

        async fn vector_count(&self) -> Result<usize, SearchError> {
            Ok(self.added.lock().expect("lock").len())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl SimilarityIndex for BrokenStore {
        async fn add_vectors(&self, _points: &[IndexedVector]) -> Result<(), SearchError> {
            Err(SearchError::Storage("write refused".to_string()))
        }

        async fn query_nearest(
            &self,
            _query_vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<ScoredChunk>, SearchError> {
            Err(SearchError::Storage("read refused".to_string()))
        }

        async fn vector_count(&self) -> Result<usize, SearchError> {
            Err(SearchError::Storage("count refused".to_string()))
        }
    }

    struct TrippingEmbedder {
        poison: &'static str,
    }

    impl Embedder for TrippingEmbedder {
        fn dimensions(&self) -> usize {
            2
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, IngestError> {
            if text.contains(self.poison) {
                return Err(IngestError::Embedding(format!("refused: {text}")));
            }
            Ok(vec![1.0, 0.0])
        }
    }

    fn chunks(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|text| (*text).to_string()).collect()
    }

    #[test]
    fn chunk_ids_are_document_scoped_and_sequential() {
        assert_eq!(chunk_id("doc", 0), "doc_chunk_0");
        assert_eq!(chunk_id("doc", 7), "doc_chunk_7");
    }

    #[tokio::test]
    async fn ingest_assigns_ids_and_metadata_in_order() {
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), RecordingStore::default());
        assert!(index.ingest("doc-1", &chunks(&["alpha", "beta"])).await);

        let added = index.store.added.lock().expect("lock").clone();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].chunk_id, "doc-1_chunk_0");
        assert_eq!(added[1].chunk_id, "doc-1_chunk_1");
        assert_eq!(added[0].text, "alpha");
        assert_eq!(added[1].metadata.document_id, "doc-1");
        assert_eq!(added[1].metadata.sequence_index, 1);
    }

    #[tokio::test]
    async fn embedding_failure_ingests_nothing() {
        let embedder = TrippingEmbedder { poison: "boom" };
        let index = ChunkIndex::new(embedder, RecordingStore::default());

        let accepted = index.ingest("doc-1", &chunks(&["fine", "boom here"])).await;

        assert!(!accepted);
        assert_eq!(index.store.add_calls.load(Ordering::SeqCst), 0);
        assert!(index.store.added.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn storage_rejection_reports_ingest_failure() {
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), BrokenStore);
        assert!(!index.ingest("doc-1", &chunks(&["alpha"])).await);
    }

    #[tokio::test]
    async fn ingest_everything_then_search_with_large_k_returns_all_texts() {
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), MemoryStore::new());
        let texts = chunks(&[
            "hydraulic pump pressure ratings",
            "chocolate cake baking instructions",
            "suspension bridge cable tension",
        ]);
        assert!(index.ingest("doc-1", &texts).await);

        let hits = index.search("hydraulic pump pressure ratings", 10).await;
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0], "hydraulic pump pressure ratings");
        for text in &texts {
            assert!(hits.contains(text));
        }
    }

    #[tokio::test]
    async fn search_on_empty_index_returns_nothing() {
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), MemoryStore::new());
        assert!(index.search("anything", 5).await.is_empty());
    }

    #[tokio::test]
    async fn search_degrades_to_empty_when_store_fails() {
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), BrokenStore);
        assert!(index.search("anything", 5).await.is_empty());
    }

    #[tokio::test]
    async fn search_degrades_to_empty_when_embedding_fails() {
        let embedder = TrippingEmbedder { poison: "bad" };
        let index = ChunkIndex::new(embedder, RecordingStore::default());
        assert!(index.search("bad query", 5).await.is_empty());
    }

    #[tokio::test]
    async fn stats_reports_vector_count() {
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), MemoryStore::new());
        assert!(index.ingest("doc-1", &chunks(&["alpha", "beta"])).await);

        let stats = index.stats().await;
        assert_eq!(stats.total_vectors, 2);
        assert!(stats.error.is_none());
    }

    #[tokio::test]
    async fn stats_degrades_to_zero_with_error_annotation() {
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), BrokenStore);
        let stats = index.stats().await;
        assert_eq!(stats.total_vectors, 0);
        assert!(stats.error.is_some());
    }
}
