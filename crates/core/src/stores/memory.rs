use crate::error::SearchError;
use crate::models::{IndexedVector, ScoredChunk};
use crate::traits::SimilarityIndex;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    points: Mutex<Vec<IndexedVector>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_points(&self) -> Result<std::sync::MutexGuard<'_, Vec<IndexedVector>>, SearchError> {
        self.points
            .lock()
            .map_err(|_| SearchError::Storage("memory store lock poisoned".to_string()))
    }
}

fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut left_norm = 0.0f64;
    let mut right_norm = 0.0f64;
    for (a, b) in left.iter().zip(right.iter()) {
        dot += f64::from(*a) * f64::from(*b);
        left_norm += f64::from(*a) * f64::from(*a);
        right_norm += f64::from(*b) * f64::from(*b);
    }

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }

    dot / (left_norm.sqrt() * right_norm.sqrt())
}

#[async_trait]
impl SimilarityIndex for MemoryStore {
    async fn add_vectors(&self, points: &[IndexedVector]) -> Result<(), SearchError> {
        if points.is_empty() {
            return Ok(());
        }

        let mut stored = self.lock_points()?;

        let dimensions = stored
            .first()
            .map(|existing| existing.embedding.len())
            .unwrap_or_else(|| points[0].embedding.len());

        let mut batch_ids = HashSet::new();
        for point in points {
            if point.embedding.len() != dimensions {
                return Err(SearchError::Request(format!(
                    "embedding dimension {} != {}",
                    point.embedding.len(),
                    dimensions
                )));
            }
            if !batch_ids.insert(point.chunk_id.as_str()) {
                return Err(SearchError::Storage(format!(
                    "duplicate chunk id in batch: {}",
                    point.chunk_id
                )));
            }
            if stored.iter().any(|existing| existing.chunk_id == point.chunk_id) {
                return Err(SearchError::Storage(format!(
                    "chunk id already indexed: {}",
                    point.chunk_id
                )));
            }
        }

        stored.extend(points.iter().cloned());
        Ok(())
    }

    async fn query_nearest(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, SearchError> {
        let stored = self.lock_points()?;

        if stored.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let dimensions = stored[0].embedding.len();
        if query_vector.len() != dimensions {
            return Err(SearchError::Request(format!(
                "query vector dim {} is not {}",
                query_vector.len(),
                dimensions
            )));
        }

        let mut hits: Vec<ScoredChunk> = stored
            .iter()
            .map(|point| ScoredChunk {
                chunk_id: point.chunk_id.clone(),
                text: point.text.clone(),
                score: cosine_similarity(query_vector, &point.embedding),
            })
            .collect();

        // sort_by is stable, so equal scores keep insertion order
        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(top_k);

        Ok(hits)
    }

    async fn vector_count(&self) -> Result<usize, SearchError> {
        Ok(self.lock_points()?.len())
    }
}
