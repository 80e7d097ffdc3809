use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextChunk {
    pub source_document_id: String,
    pub sequence_index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub document_id: String,
    pub sequence_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedVector {
    pub chunk_id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vectors: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub question: String,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub answer_text: String,
    pub backend_name: String,
    pub succeeded: bool,
    pub error_detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub answer_text: String,
    pub backend_name: String,
    pub succeeded: bool,
    pub relevant_chunks: Vec<String>,
    pub error_detail: Option<String>,
}
