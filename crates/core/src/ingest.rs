use crate::{
    chunking::{chunk_text, normalize_whitespace, ChunkingConfig},
    embeddings::Embedder,
    error::IngestError,
    extractor::read_document_text,
    index::ChunkIndex,
    traits::SimilarityIndex,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;
use walkdir::WalkDir;

const DOCUMENT_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

pub fn discover_document_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_document = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                DOCUMENT_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });

        if is_document {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedDocument {
    pub document_id: String,
    pub source_path: String,
    pub checksum: String,
    pub chunk_count: usize,
    pub text_length: usize,
    pub ingested_at: DateTime<Utc>,
}

pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

pub struct IngestionReport {
    pub documents: Vec<IngestedDocument>,
    pub skipped: Vec<SkippedDocument>,
}

pub async fn ingest_folder<E, S>(
    index: &ChunkIndex<E, S>,
    folder: &Path,
    config: ChunkingConfig,
) -> Result<IngestionReport, IngestError>
where
    E: Embedder,
    S: SimilarityIndex + Send + Sync,
{
    config.validate()?;

    let files = discover_document_files(folder);
    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no ingestible documents found in {}",
            folder.display()
        )));
    }

    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    for path in files {
        match ingest_file(index, &path, config).await {
            Ok(record) => documents.push(record),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "skipping document");
                skipped.push(SkippedDocument {
                    path,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(IngestionReport { documents, skipped })
}

async fn ingest_file<E, S>(
    index: &ChunkIndex<E, S>,
    path: &Path,
    config: ChunkingConfig,
) -> Result<IngestedDocument, IngestError>
where
    E: Embedder,
    S: SimilarityIndex + Send + Sync,
{
    path.file_name().and_then(|name| name.to_str()).ok_or_else(|| {
        IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
    })?;

    let checksum = digest_file(path)?;
    let raw_text = read_document_text(path)?;
    let cleaned = normalize_whitespace(&raw_text);
    let chunks = chunk_text(&cleaned, config)?;

    if chunks.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no text content in {}",
            path.display()
        )));
    }

    let document_id = Uuid::new_v4().to_string();

    if !index.ingest(&document_id, &chunks).await {
        return Err(IngestError::IndexRejected(format!(
            "chunk batch for {} was not indexed",
            path.display()
        )));
    }

    Ok(IngestedDocument {
        document_id,
        source_path: path.to_string_lossy().to_string(),
        checksum,
        chunk_count: chunks.len(),
        text_length: cleaned.chars().count(),
        ingested_at: Utc::now(),
    })
}
