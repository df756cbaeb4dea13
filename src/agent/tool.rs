//! Retrieval tool adapter.
//!
//! Wraps the knowledge index as the agent's single callable capability: a
//! free-text query in, concatenated chunk text out. Name and description are
//! part of the prompt the model reasons over.

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::knowledge::KnowledgeStore;
use crate::llm::LlmProvider;

pub const TOOL_NAME: &str = "jain_scripture_search";
pub const TOOL_DESCRIPTION: &str = "दिगंबर जैन ग्रंथों और शास्त्रों के अंश खोजने के लिए उपयोगी।";

const NO_MATCH_OBSERVATION: &str = "कोई प्रासंगिक अंश नहीं मिला।";

pub struct ScriptureSearchTool {
    store: Arc<dyn KnowledgeStore>,
    provider: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl ScriptureSearchTool {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        provider: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            provider,
            top_k,
        }
    }

    /// Embeds the query and returns the most similar chunk texts, separated
    /// by blank lines.
    pub async fn search(&self, query: &str) -> Result<String, ApiError> {
        let embeddings = self.provider.embed(&[query.to_string()]).await?;
        let query_vector = embeddings
            .first()
            .ok_or_else(|| ApiError::internal("embedding provider returned no vector"))?;

        let results = self.store.search(query_vector, self.top_k).await?;
        if results.is_empty() {
            return Ok(NO_MATCH_OBSERVATION.to_string());
        }

        Ok(results
            .into_iter()
            .map(|r| r.chunk.content)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}
