use crate::error::IngestError;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub window_tokens: usize,
    pub overlap_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_tokens: 1_000,
            overlap_tokens: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.window_tokens == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "window_tokens must be greater than zero".to_string(),
            ));
        }
        if self.overlap_tokens >= self.window_tokens {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap_tokens {} must be smaller than window_tokens {}",
                self.overlap_tokens, self.window_tokens
            )));
        }
        Ok(())
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn chunk_text(text: &str, config: ChunkingConfig) -> Result<Vec<String>, IngestError> {
    config.validate()?;

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let step = config.window_tokens - config.overlap_tokens;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + config.window_tokens).min(tokens.len());
        chunks.push(tokens[start..end].join(" "));
        if end == tokens.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}
