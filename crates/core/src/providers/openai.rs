use crate::error::ProviderError;
use crate::traits::ModelClient;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const BACKEND: &str = "openai";
const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub struct OpenAiClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(api_key: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn first_choice(response: ChatCompletionResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::MalformedResponse {
            backend: BACKEND.to_string(),
            detail: "no message content in first choice".to_string(),
        })
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ProviderError::MissingCredentials {
                backend: BACKEND.to_string(),
            })?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
            max_tokens: 500,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                backend: BACKEND.to_string(),
                status: status.as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|error| ProviderError::MalformedResponse {
                    backend: BACKEND.to_string(),
                    detail: error.to_string(),
                })?;

        first_choice(parsed)
    }
}
