use crate::error::SearchError;
use crate::models::{IndexedVector, ScoredChunk};
use crate::traits::SimilarityIndex;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::OnceLock;
use url::Url;

pub struct ChromaStore {
    endpoint: String,
    collection: String,
    client: Client,
    vector_size: usize,
    collection_id: OnceLock<String>,
}

impl ChromaStore {
    pub fn new(
        endpoint: impl Into<String>,
        collection: impl Into<String>,
        vector_size: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            collection: collection.into(),
            client: Client::new(),
            vector_size,
            collection_id: OnceLock::new(),
        }
    }

    fn api_url(&self, path: &str) -> Result<Url, SearchError> {
        let base = Url::parse(&self.endpoint)?;
        Ok(base.join(path)?)
    }

    async fn collection_id(&self) -> Result<&str, SearchError> {
        if let Some(id) = self.collection_id.get() {
            return Ok(id);
        }

        let response = self
            .client
            .post(self.api_url("/api/v1/collections")?)
            .json(&json!({
                "name": self.collection,
                "get_or_create": true,
                "metadata": { "hnsw:space": "cosine" },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        let id = parsed
            .pointer("/id")
            .and_then(Value::as_str)
            .map(|id| id.to_string())
            .ok_or_else(|| SearchError::BackendResponse {
                backend: "chroma".to_string(),
                details: "collection response had no id".to_string(),
            })?;

        Ok(self.collection_id.get_or_init(|| id))
    }
}

fn parse_query_hits(payload: &Value) -> Vec<ScoredChunk> {
    let ids = payload
        .pointer("/ids/0")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let documents = payload
        .pointer("/documents/0")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let distances = payload
        .pointer("/distances/0")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut hits = Vec::new();
    for (position, id) in ids.iter().enumerate() {
        let chunk_id = id.as_str().unwrap_or_default().to_string();
        let text = documents
            .get(position)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        // chroma reports cosine distance, similarity is its complement
        let distance = distances
            .get(position)
            .and_then(Value::as_f64)
            .unwrap_or(1.0);

        hits.push(ScoredChunk {
            chunk_id,
            text,
            score: 1.0 - distance,
        });
    }

    hits
}

#[async_trait]
impl SimilarityIndex for ChromaStore {
    async fn add_vectors(&self, points: &[IndexedVector]) -> Result<(), SearchError> {
        if points.is_empty() {
            return Ok(());
        }

        for point in points {
            if point.embedding.len() != self.vector_size {
                return Err(SearchError::Request(format!(
                    "embedding dimension {} != {}",
                    point.embedding.len(),
                    self.vector_size
                )));
            }
        }

        let ids = points
            .iter()
            .map(|point| point.chunk_id.as_str())
            .collect::<Vec<_>>();
        let embeddings = points
            .iter()
            .map(|point| point.embedding.as_slice())
            .collect::<Vec<_>>();
        let documents = points
            .iter()
            .map(|point| point.text.as_str())
            .collect::<Vec<_>>();
        let metadatas = points
            .iter()
            .map(|point| {
                json!({
                    "document_id": point.metadata.document_id,
                    "sequence_index": point.metadata.sequence_index,
                })
            })
            .collect::<Vec<_>>();

        let collection_id = self.collection_id().await?;
        let response = self
            .client
            .post(self.api_url(&format!("/api/v1/collections/{collection_id}/add"))?)
            .json(&json!({
                "ids": ids,
                "embeddings": embeddings,
                "documents": documents,
                "metadatas": metadatas,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }

    async fn query_nearest(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, SearchError> {
        if query_vector.len() != self.vector_size {
            return Err(SearchError::Request(format!(
                "query vector dim {} is not {}",
                query_vector.len(),
                self.vector_size
            )));
        }

        if top_k == 0 {
            return Ok(Vec::new());
        }

        let collection_id = self.collection_id().await?;
        let response = self
            .client
            .post(self.api_url(&format!("/api/v1/collections/{collection_id}/query"))?)
            .json(&json!({
                "query_embeddings": [query_vector],
                "n_results": top_k,
                "include": ["documents", "distances"],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        Ok(parse_query_hits(&parsed))
    }

    async fn vector_count(&self) -> Result<usize, SearchError> {
        let collection_id = self.collection_id().await?;
        let response = self
            .client
            .get(self.api_url(&format!("/api/v1/collections/{collection_id}/count"))?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        parsed
            .as_u64()
            .map(|count| count as usize)
            .ok_or_else(|| SearchError::BackendResponse {
                backend: "chroma".to_string(),
                details: "count response was not an integer".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;

    fn point(chunk_id: &str, embedding: Vec<f32>) -> IndexedVector {
        IndexedVector {
            chunk_id: chunk_id.to_string(),
            embedding,
            text: "text".to_string(),
            metadata: ChunkMetadata {
                document_id: "doc".to_string(),
                sequence_index: 0,
            },
        }
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected_before_any_request() {
        let store = ChromaStore::new("http://127.0.0.1:1", "docs", 3);
        let result = store.add_vectors(&[point("a", vec![1.0, 0.0])]).await;
        assert!(matches!(result, Err(SearchError::Request(_))));
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_rejected_before_any_request() {
        let store = ChromaStore::new("http://127.0.0.1:1", "docs", 3);
        let result = store.query_nearest(&[1.0, 0.0], 5).await;
        assert!(matches!(result, Err(SearchError::Request(_))));
    }

    #[tokio::test]
    async fn invalid_endpoint_is_a_url_error() {
        let store = ChromaStore::new("not a url", "docs", 2);
        let result = store.add_vectors(&[point("a", vec![1.0, 0.0])]).await;
        assert!(matches!(result, Err(SearchError::Url(_))));
    }

    #[test]
    fn query_hits_are_parsed_with_similarity_scores() {
        let payload = json!({
            "ids": [["doc_chunk_0", "doc_chunk_1"]],
            "documents": [["first text", "second text"]],
            "distances": [[0.25, 0.5]],
        });

        let hits = parse_query_hits(&payload);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, "doc_chunk_0");
        assert_eq!(hits[0].text, "first text");
        assert!((hits[0].score - 0.75).abs() < 1e-9);
        assert!((hits[1].score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn malformed_query_payload_parses_to_no_hits() {
        let payload = json!({ "unexpected": true });
        assert!(parse_query_hits(&payload).is_empty());
    }
}
