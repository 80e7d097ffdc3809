pub mod cohere;
pub mod gemini;
pub mod openai;

pub use cohere::CohereClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
