use crate::embeddings::Embedder;
use crate::error::SearchError;
use crate::generation::GenerationChain;
use crate::index::ChunkIndex;
use crate::models::{GenerationRequest, QueryOutcome};
use crate::traits::SimilarityIndex;
use tracing::info;

pub const NO_DOCUMENTS_ANSWER: &str =
    "No relevant documents found. Please upload documents first.";

pub struct QueryCoordinator<E, S>
where
    E: Embedder,
    S: SimilarityIndex,
{
    index: ChunkIndex<E, S>,
    chain: GenerationChain,
}

impl<E, S> QueryCoordinator<E, S>
where
    E: Embedder,
    S: SimilarityIndex + Send + Sync,
{
    pub fn new(index: ChunkIndex<E, S>, chain: GenerationChain) -> Self {
        Self { index, chain }
    }

    pub async fn answer(
        &self,
        question: &str,
        max_chunks: usize,
    ) -> Result<QueryOutcome, SearchError> {
        if question.trim().is_empty() {
            return Err(SearchError::EmptyQuestion);
        }

        let relevant_chunks = self.index.search(question, max_chunks).await;

        if relevant_chunks.is_empty() {
            info!("no relevant chunks for question, skipping generation");
            return Ok(QueryOutcome {
                answer_text: NO_DOCUMENTS_ANSWER.to_string(),
                backend_name: "none".to_string(),
                succeeded: false,
                relevant_chunks: Vec::new(),
                error_detail: Some("no documents in index".to_string()),
            });
        }

        let request = GenerationRequest {
            question: question.to_string(),
            context: relevant_chunks.join("\n\n"),
        };
        let result = self.chain.generate_with_fallback(&request).await;

        Ok(QueryOutcome {
            answer_text: result.answer_text,
            backend_name: result.backend_name,
            succeeded: result.succeeded,
            relevant_chunks,
            error_detail: result.error_detail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashedNgramEmbedder;
    use crate::error::ProviderError;
    use crate::generation::{Backend, UNAVAILABLE_ANSWER};
    use crate::models::{IndexedVector, ScoredChunk};
    use crate::stores::MemoryStore;
    use crate::traits::ModelClient;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct CountingStore {
        queries: Arc<AtomicUsize>,
    }

    impl CountingStore {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let queries = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    queries: Arc::clone(&queries),
                },
                queries,
            )
        }
    }

    #[async_trait]
    impl SimilarityIndex for CountingStore {
        async fn add_vectors(&self, _points: &[IndexedVector]) -> Result<(), SearchError> {
            Ok(())
        }

        async fn query_nearest(
            &self,
            _query_vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<ScoredChunk>, SearchError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn vector_count(&self) -> Result<usize, SearchError> {
            Ok(0)
        }
    }

    struct ObservingClient {
        fail: bool,
        calls: Arc<AtomicUsize>,
        last_prompt: Arc<Mutex<Option<String>>>,
    }

    impl ObservingClient {
        fn new(fail: bool) -> (Self, Arc<AtomicUsize>, Arc<Mutex<Option<String>>>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let last_prompt = Arc::new(Mutex::new(None));
            (
                Self {
                    fail,
                    calls: Arc::clone(&calls),
                    last_prompt: Arc::clone(&last_prompt),
                },
                calls,
                last_prompt,
            )
        }
    }

    #[async_trait]
    impl ModelClient for ObservingClient {
        async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().expect("lock") = Some(prompt.to_string());
            if self.fail {
                return Err(ProviderError::Api {
                    backend: "observing".to_string(),
                    status: 500,
                    detail: "scripted failure".to_string(),
                });
            }
            Ok("The torque is 35 Nm.".to_string())
        }
    }

    fn chain_of(client: ObservingClient) -> GenerationChain {
        GenerationChain::new(vec![Backend::new("observing", 1, Box::new(client))])
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_any_work() {
        let (client, calls, _) = ObservingClient::new(false);
        let (store, query_count) = CountingStore::new();
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), store);
        let coordinator = QueryCoordinator::new(index, chain_of(client));

        let result = coordinator.answer("   \t  ", 5).await;

        assert!(matches!(result, Err(SearchError::EmptyQuestion)));
        assert_eq!(query_count.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_retrieval_short_circuits_generation() {
        let (client, calls, _) = ObservingClient::new(false);
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), MemoryStore::new());
        let coordinator = QueryCoordinator::new(index, chain_of(client));

        let outcome = coordinator
            .answer("what is the torque spec?", 5)
            .await
            .expect("answer");

        assert!(!outcome.succeeded);
        assert_eq!(outcome.answer_text, NO_DOCUMENTS_ANSWER);
        assert_eq!(outcome.backend_name, "none");
        assert!(outcome.relevant_chunks.is_empty());
        assert!(outcome.error_detail.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn answer_carries_the_retrieved_chunks_as_provenance() {
        let (client, calls, last_prompt) = ObservingClient::new(false);
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), MemoryStore::new());
        assert!(
            index
                .ingest(
                    "doc-1",
                    &[
                        "Bolts are torqued to 35 Nm.".to_string(),
                        "Flange gaskets are replaced annually.".to_string(),
                    ],
                )
                .await
        );
        let coordinator = QueryCoordinator::new(index, chain_of(client));

        let outcome = coordinator
            .answer("what is the bolt torque?", 5)
            .await
            .expect("answer");

        assert!(outcome.succeeded);
        assert_eq!(outcome.answer_text, "The torque is 35 Nm.");
        assert_eq!(outcome.backend_name, "observing");
        assert_eq!(outcome.relevant_chunks.len(), 2);
        assert!(outcome
            .relevant_chunks
            .contains(&"Bolts are torqued to 35 Nm.".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let prompt = last_prompt.lock().expect("lock").clone().expect("prompt");
        assert!(prompt.starts_with("Context: "));
        assert!(prompt.contains("Bolts are torqued to 35 Nm."));
        assert!(prompt.contains("\n\n"));
        assert!(prompt.contains("Question: what is the bolt torque?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[tokio::test]
    async fn failed_generation_still_reports_the_chunks_it_used() {
        let (client, _, _) = ObservingClient::new(true);
        let index = ChunkIndex::new(HashedNgramEmbedder::default(), MemoryStore::new());
        assert!(
            index
                .ingest("doc-1", &["Bolts are torqued to 35 Nm.".to_string()])
                .await
        );
        let coordinator = QueryCoordinator::new(index, chain_of(client));

        let outcome = coordinator
            .answer("what is the bolt torque?", 5)
            .await
            .expect("answer");

        assert!(!outcome.succeeded);
        assert_eq!(outcome.answer_text, UNAVAILABLE_ANSWER);
        assert_eq!(outcome.backend_name, "none");
        assert_eq!(outcome.relevant_chunks.len(), 1);
        let detail = outcome.error_detail.expect("error detail");
        assert!(detail.contains("500"));
    }
}
