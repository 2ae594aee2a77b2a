//! OpenAI-compatible parameter extractor
//!
//! Used by the CLI host. Agent runtimes that embed the plugin bring their own
//! [`ParamExtractor`].

use crate::config::LlmConfig;
use crate::runtime::ParamExtractor;
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Debug, Deserialize)]
struct ChatContent {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client that asks the model for a single JSON object
pub struct LlmExtractor {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl LlmExtractor {
    pub fn new(base_url: String, model: String, api_key: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            model,
            api_key,
        })
    }

    /// Read the API key from the env var named in `config`
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            Error::Config(format!(
                "{} environment variable not set",
                config.api_key_env
            ))
        })?;
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            SecretString::from(api_key),
        )
    }
}

impl std::fmt::Debug for LlmExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmExtractor")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl ParamExtractor for LlmExtractor {
    async fn extract(&self, context: &str, schema: &Value) -> Result<Value> {
        let system = format!(
            "Extract parameters from the conversation. Reply with exactly one JSON object \
             matching this JSON schema and nothing else:\n{}",
            serde_json::to_string_pretty(schema)?
        );
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: context.to_string(),
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        tracing::debug!(url = %url, model = %self.model, "Requesting parameter extraction");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Extraction(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "model request failed with status {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Extraction(format!("invalid model response: {}", e)))?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Extraction("no content in model response".to_string()))?;

        parse_json_object(&text)
    }
}

/// Pull the first JSON object out of a model reply, tolerating code fences and prose
pub fn parse_json_object(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(unfenced) {
        return Ok(value);
    }

    let start = unfenced.find('{');
    let end = unfenced.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            match serde_json::from_str::<Value>(&unfenced[start..=end]) {
                Ok(value @ Value::Object(_)) => Ok(value),
                _ => Err(Error::Extraction(
                    "model returned malformed JSON".to_string(),
                )),
            }
        }
        _ => Err(Error::Extraction(
            "model returned no JSON object".to_string(),
        )),
    }
}
