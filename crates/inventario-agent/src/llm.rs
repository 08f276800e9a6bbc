//! `generateContent`-style generative model client.

use std::time::Duration;

use async_trait::async_trait;
use inventario_client::join_path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::AgentError;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Settings for chat instructions and answers.
    pub const CHAT: GenerationConfig = GenerationConfig {
        temperature: 0.1,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 2048,
    };

    /// Settings for reports, which echo whole records back.
    pub const REPORT: GenerationConfig = GenerationConfig {
        max_output_tokens: 8192,
        ..GenerationConfig::CHAT
    };
}

/// A text-in, text-out model.  One call is one attempt; callers never retry.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, AgentError>;
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationConfig,
}

/// Client for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client,
        }
    }

    pub fn set_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API root, e.g. to point at a local stub.
    pub fn set_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> Result<Url, AgentError> {
        let path = format!("models/{}:generateContent", self.model);
        let mut url = Url::parse(&join_path(&self.endpoint, &path))
            .map_err(|e| AgentError::InvalidQuery(format!("invalid model endpoint: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

/// `candidates[0].content.parts[0].text` of a generateContent response.
pub fn candidate_text(body: &Value) -> Option<&str> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, AgentError> {
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
            generation_config: config,
        };
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), ?config, "calling language model");

        let resp = self.client.post(self.url()?).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Status { status: status.as_u16(), body });
        }

        let bytes = resp.bytes().await?;
        let json: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AgentError::InvalidAiResponse(format!("model reply is not JSON: {e}")))?;
        let text = candidate_text(&json).ok_or(AgentError::EmptyResponse)?;
        info!(model = %self.model, response_chars = text.chars().count(), "language model responded");
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: "hola" }] }],
            generation_config: &GenerationConfig::REPORT,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hola");
        assert_eq!(v["generationConfig"]["topK"], 40);
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_url_carries_model_and_key() {
        let c = GeminiClient::new("secret").set_endpoint("http://127.0.0.1:9/v1beta/");
        let url = c.url().unwrap();
        assert_eq!(url.path(), "/v1beta/models/gemini-2.5-pro:generateContent");
        assert_eq!(url.query(), Some("key=secret"));
    }

    #[test]
    fn test_candidate_text_extraction() {
        let body = json!({"candidates":[{"content":{"parts":[{"text":"{}"}]}}]});
        assert_eq!(candidate_text(&body), Some("{}"));
        assert_eq!(candidate_text(&json!({"candidates":[]})), None);
        let blank = json!({"candidates":[{"content":{"parts":[{"text":"  "}]}}]});
        assert_eq!(candidate_text(&blank), None);
    }
}
