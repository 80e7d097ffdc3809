use crate::models::{GenerationRequest, GenerationResult};
use crate::traits::ModelClient;
use tracing::{debug, info, warn};

pub const UNAVAILABLE_ANSWER: &str = "Sorry, all model providers are currently unavailable.";

pub struct Backend {
    pub name: String,
    pub priority: u8,
    client: Box<dyn ModelClient>,
}

impl Backend {
    pub fn new(name: impl Into<String>, priority: u8, client: Box<dyn ModelClient>) -> Self {
        Self {
            name: name.into(),
            priority,
            client,
        }
    }
}

pub struct GenerationChain {
    backends: Vec<Backend>,
}

impl GenerationChain {
    pub fn new(mut backends: Vec<Backend>) -> Self {
        // stable sort, equal priorities keep their given order
        backends.sort_by_key(|backend| backend.priority);
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends
            .iter()
            .map(|backend| backend.name.as_str())
            .collect()
    }

    pub fn build_prompt(request: &GenerationRequest) -> String {
        format!(
            "Context: {}\n\nQuestion: {}\n\nAnswer:",
            request.context, request.question
        )
    }

    pub async fn generate_with_fallback(&self, request: &GenerationRequest) -> GenerationResult {
        let prompt = Self::build_prompt(request);
        let mut last_error: Option<String> = None;

        for backend in &self.backends {
            debug!(backend = %backend.name, priority = backend.priority, "attempting generation");

            match backend.client.complete(&prompt).await {
                Ok(answer_text) => {
                    info!(backend = %backend.name, "generation succeeded");
                    return GenerationResult {
                        answer_text,
                        backend_name: backend.name.clone(),
                        succeeded: true,
                        error_detail: None,
                    };
                }
                Err(error) => {
                    warn!(
                        backend = %backend.name,
                        error = %error,
                        "generation attempt failed, moving to next backend"
                    );
                    last_error = Some(error.to_string());
                }
            }
        }

        GenerationResult {
            answer_text: UNAVAILABLE_ANSWER.to_string(),
            backend_name: "none".to_string(),
            succeeded: false,
            error_detail: last_error.or_else(|| Some("no backends configured".to_string())),
        }
    }
}
