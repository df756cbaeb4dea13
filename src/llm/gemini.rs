//! Gemini REST provider.
//!
//! One instance per request, built from the caller's `x-api-key` credential.
//! The key travels to Google in the `x-goog-api-key` header, never in the URL,
//! so it cannot end up in access logs that capture query strings.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{LlmProvider, ProviderFactory};
use super::types::{ChatMessage, ChatRequest};
use crate::core::config::GeminiConfig;
use crate::core::credential::ApiCredential;
use crate::core::errors::ApiError;

const GOOGLE_API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiProvider {
    api_base: String,
    chat_model: String,
    embed_model: String,
    credential: ApiCredential,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig, credential: ApiCredential) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            embed_model: config.embed_model.clone(),
            credential,
            client: Client::new(),
        }
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        let res = self
            .client
            .post(url)
            .header(GOOGLE_API_KEY_HEADER, self.credential.reveal())
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::upstream(0, e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::upstream(status.as_u16(), text));
        }

        res.json().await.map_err(ApiError::internal)
    }
}

/// Maps internal chat messages onto Gemini's `generateContent` payload.
///
/// Leading system messages become the `systemInstruction`; any system message
/// appearing mid-conversation (tool observations) is carried as a user turn,
/// since Gemini only accepts `user` and `model` roles in `contents`.
fn build_generate_request(messages: &[ChatMessage], request: &ChatRequest) -> Value {
    let mut system_parts: Vec<Value> = Vec::new();
    let mut contents: Vec<Value> = Vec::new();

    for message in messages {
        match message.role.as_str() {
            "system" if contents.is_empty() => {
                system_parts.push(json!({ "text": message.content }));
            }
            role => {
                let gemini_role = if role == "assistant" { "model" } else { "user" };
                contents.push(json!({
                    "role": gemini_role,
                    "parts": [{ "text": message.content }],
                }));
            }
        }
    }

    let mut body = json!({ "contents": contents });

    if !system_parts.is_empty() {
        body["systemInstruction"] = json!({ "parts": system_parts });
    }

    let mut generation_config = serde_json::Map::new();
    if let Some(t) = request.temperature {
        generation_config.insert("temperature".to_string(), json!(t));
    }
    if let Some(m) = request.max_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(m));
    }
    if !generation_config.is_empty() {
        body["generationConfig"] = Value::Object(generation_config);
    }

    body
}

fn build_embed_request(model: &str, inputs: &[String]) -> Value {
    let requests: Vec<Value> = inputs
        .iter()
        .map(|text| {
            json!({
                "model": format!("models/{}", model),
                "content": { "parts": [{ "text": text }] },
            })
        })
        .collect();

    json!({ "requests": requests })
}

fn extract_completion(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base, self.chat_model
        );
        let body = build_generate_request(&request.messages, &request);

        let payload = self.post(&url, &body).await?;

        extract_completion(&payload)
            .ok_or_else(|| ApiError::upstream(200, "completion response had no text".to_string()))
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/models/{}:batchEmbedContents",
            self.api_base, self.embed_model
        );
        let body = build_embed_request(&self.embed_model, inputs);

        let payload = self.post(&url, &body).await?;

        let mut embeddings = Vec::new();
        if let Some(data) = payload["embeddings"].as_array() {
            for item in data {
                if let Some(vals) = item["values"].as_array() {
                    let vec: Vec<f32> = vals
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    embeddings.push(vec);
                }
            }
        }

        if embeddings.len() != inputs.len() {
            return Err(ApiError::upstream(
                200,
                format!(
                    "embedding response had {} vectors for {} inputs",
                    embeddings.len(),
                    inputs.len()
                ),
            ));
        }

        Ok(embeddings)
    }
}

/// Builds one transient `GeminiProvider` per request credential.
pub struct GeminiProviderFactory {
    config: GeminiConfig,
}

impl GeminiProviderFactory {
    pub fn new(config: GeminiConfig) -> Self {
        Self { config }
    }
}

impl ProviderFactory for GeminiProviderFactory {
    fn create(&self, credential: &ApiCredential) -> Arc<dyn LlmProvider> {
        Arc::new(GeminiProvider::new(&self.config, credential.clone()))
    }
}
