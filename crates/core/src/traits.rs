use crate::{
    error::{ProviderError, SearchError},
    models::{IndexedVector, ScoredChunk},
};
use async_trait::async_trait;

#[async_trait]
pub trait SimilarityIndex {
    async fn add_vectors(&self, points: &[IndexedVector]) -> Result<(), SearchError>;

    async fn query_nearest(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, SearchError>;

    async fn vector_count(&self) -> Result<usize, SearchError>;
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}
