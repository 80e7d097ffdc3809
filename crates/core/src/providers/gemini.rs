use crate::error::ProviderError;
use crate::traits::ModelClient;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const BACKEND: &str = "gemini";
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl GeminiClient {
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

fn answer_text(payload: &Value) -> Result<String, ProviderError> {
    payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(|text| text.to_string())
        .ok_or_else(|| ProviderError::MalformedResponse {
            backend: BACKEND.to_string(),
            detail: "no candidate text in response".to_string(),
        })
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ProviderError::MissingCredentials {
                backend: BACKEND.to_string(),
            })?;

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.endpoint, self.model
            ))
            .header("x-goog-api-key", api_key)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
            }))
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

        let payload: Value = response.json().await?;
        answer_text(&payload)
    }
}
