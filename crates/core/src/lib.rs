pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod stores;
pub mod traits;

pub use chunking::{chunk_text, normalize_whitespace, ChunkingConfig};
pub use embeddings::{Embedder, HashedNgramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IngestError, ProviderError, SearchError};
pub use extractor::{read_document_text, LopdfExtractor, PageText, PdfExtractor};
pub use generation::{Backend, GenerationChain, UNAVAILABLE_ANSWER};
pub use index::{chunk_id, ChunkIndex};
pub use ingest::{
    digest_file, discover_document_files, ingest_folder, IngestedDocument, IngestionReport,
    SkippedDocument,
};
pub use models::{
    ChunkMetadata, GenerationRequest, GenerationResult, IndexStats, IndexedVector, QueryOutcome,
    ScoredChunk, TextChunk,
};
pub use orchestrator::{QueryCoordinator, NO_DOCUMENTS_ANSWER};
pub use providers::{CohereClient, GeminiClient, OpenAiClient};
pub use stores::{ChromaStore, MemoryStore};
pub use traits::{ModelClient, SimilarityIndex};
