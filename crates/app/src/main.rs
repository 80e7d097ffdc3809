use chrono::Utc;
use clap::{Parser, Subcommand};
use doc_answer_core::{
    ingest_folder, Backend, ChromaStore, ChunkIndex, ChunkingConfig, CohereClient, GeminiClient,
    GenerationChain, HashedNgramEmbedder, OpenAiClient, QueryCoordinator,
};
use doc_answer_core::Embedder;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-answer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Chroma base URL
    #[arg(long, default_value = "http://localhost:8000")]
    chroma_url: String,

    /// Chroma collection name
    #[arg(long, default_value = "documents")]
    chroma_collection: String,

    /// Google Gemini API key
    #[arg(long, env = "GOOGLE_GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Cohere API key
    #[arg(long, env = "COHERE_API_KEY", hide_env_values = true)]
    cohere_api_key: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a document folder and index its chunks.
    Ingest {
        /// Folder that contains PDFs, text, or markdown files recursively.
        #[arg(long)]
        folder: String,
        /// Tokens per chunk window.
        #[arg(long, default_value = "1000")]
        window_tokens: usize,
        /// Tokens shared between consecutive windows.
        #[arg(long, default_value = "200")]
        overlap_tokens: usize,
    },
    /// Answer a question from the indexed corpus.
    Ask {
        /// The question to answer.
        #[arg(long)]
        question: String,
        /// Maximum retrieved chunks used as context.
        #[arg(long, default_value = "5")]
        max_chunks: usize,
        /// Print the retrieved chunks next to the answer.
        #[arg(long, default_value_t = false)]
        show_chunks: bool,
    },
    /// Show vector index statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let embedder = HashedNgramEmbedder::default();
    let store = ChromaStore::new(
        &cli.chroma_url,
        &cli.chroma_collection,
        embedder.dimensions(),
    );
    let index = ChunkIndex::new(embedder, store);

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "doc-answer boot"
    );

    match cli.command {
        Command::Ingest {
            folder,
            window_tokens,
            overlap_tokens,
        } => {
            let config = ChunkingConfig {
                window_tokens,
                overlap_tokens,
            };
            let report = ingest_folder(&index, Path::new(&folder), config)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            if !report.skipped.is_empty() {
                warn!(
                    "skipped_files={} for folder={}",
                    report.skipped.len(),
                    folder
                );
                for skipped in &report.skipped {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped document");
                }
            }

            if report.documents.is_empty() {
                println!("0 documents ingested (all files were skipped)");
            }

            let chunk_total: usize = report
                .documents
                .iter()
                .map(|document| document.chunk_count)
                .sum();

            for document in &report.documents {
                println!(
                    "{} <- {} ({} chunks, {} chars)",
                    document.document_id,
                    document.source_path,
                    document.chunk_count,
                    document.text_length
                );
            }

            println!(
                "{} documents / {} chunks ingested at {}",
                report.documents.len(),
                chunk_total,
                Utc::now().to_rfc3339()
            );
        }
        Command::Ask {
            question,
            max_chunks,
            show_chunks,
        } => {
            let chain = GenerationChain::new(vec![
                Backend::new("gemini", 1, Box::new(GeminiClient::new(cli.gemini_api_key))),
                Backend::new("openai", 2, Box::new(OpenAiClient::new(cli.openai_api_key))),
                Backend::new("cohere", 3, Box::new(CohereClient::new(cli.cohere_api_key))),
            ]);
            let coordinator = QueryCoordinator::new(index, chain);

            let outcome = coordinator
                .answer(&question, max_chunks)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("backend: {}", outcome.backend_name);
            println!("answer:\n{}", outcome.answer_text);

            if let Some(detail) = &outcome.error_detail {
                println!("error_detail: {detail}");
            }

            if show_chunks {
                for (position, chunk) in outcome.relevant_chunks.iter().enumerate() {
                    println!("[chunk {position}]\n{chunk}");
                }
            }
        }
        Command::Stats => {
            let stats = index.stats().await;
            println!("total_vectors: {}", stats.total_vectors);
            if let Some(error) = stats.error {
                println!("stats_degraded: {error}");
            }
        }
    }

    Ok(())
}
