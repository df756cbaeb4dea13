use std::sync::Arc;

use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::credential::ApiCredential;
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;

    /// generate embeddings, one vector per input
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

/// Builds a short-lived provider client for one request's credential.
///
/// The credential is never cached; each request gets its own client and the
/// client dies with the request.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, credential: &ApiCredential) -> Arc<dyn LlmProvider>;
}
