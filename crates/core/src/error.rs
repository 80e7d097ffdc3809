use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("index rejected document: {0}")]
    IndexRejected(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("index storage error: {0}")]
    Storage(String),

    #[error("search request failed: {0}")]
    Request(String),

    #[error("question is empty")]
    EmptyQuestion,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{backend} returned status {status}: {detail}")]
    Api {
        backend: String,
        status: u16,
        detail: String,
    },

    #[error("unexpected {backend} response shape: {detail}")]
    MalformedResponse { backend: String, detail: String },

    #[error("no api key configured for {backend}")]
    MissingCredentials { backend: String },
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
