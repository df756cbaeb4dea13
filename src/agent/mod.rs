//! Conversational agent: a bounded ReAct loop over one retrieval tool.
//!
//! Each question runs think → act → observe cycles until the model produces a
//! final answer or the step budget runs out. Malformed model output is
//! tolerated: the loop appends a format reminder and retries instead of
//! failing the request.

pub mod prompt;
pub mod tool;

use std::sync::Arc;

use serde_json::Value;

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

use prompt::{agent_instructions, FORMAT_REMINDER, MAX_STEPS_ANSWER};
use tool::{ScriptureSearchTool, TOOL_DESCRIPTION, TOOL_NAME};

pub struct ScriptureAgent {
    provider: Arc<dyn LlmProvider>,
    tool: ScriptureSearchTool,
    max_steps: usize,
}

impl ScriptureAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, tool: ScriptureSearchTool) -> Self {
        Self {
            provider,
            tool,
            max_steps: 6,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Answers `question` against the session's prior turns.
    ///
    /// The caller appends the resulting turn to the session history; this
    /// method only reads it.
    pub async fn run(
        &self,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String, ApiError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(agent_instructions(
            TOOL_NAME,
            TOOL_DESCRIPTION,
        )));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(question));

        for step in 0..self.max_steps {
            tracing::debug!("reasoning step {}/{}", step + 1, self.max_steps);

            let response = self
                .provider
                .chat(ChatRequest::new(messages.clone()))
                .await?;

            match parse_agent_decision(&response) {
                AgentDecision::Final(content) => return Ok(content),
                AgentDecision::ToolCall { name, args } => {
                    if name != TOOL_NAME {
                        messages.push(ChatMessage::system(format!(
                            "Tool `{}` does not exist. The only available tool is `{}`.",
                            name, TOOL_NAME
                        )));
                        continue;
                    }

                    let query = args
                        .get("query")
                        .and_then(|v| v.as_str())
                        .unwrap_or(question);

                    match self.tool.search(query).await {
                        Ok(observation) => {
                            messages.push(ChatMessage::system(format!(
                                "Tool `{}` result:\n{}",
                                name, observation
                            )));
                        }
                        Err(err) => {
                            tracing::warn!("retrieval tool failed: {}", err);
                            messages.push(ChatMessage::system(format!(
                                "Tool `{}` failed: {}",
                                name, err
                            )));
                        }
                    }
                }
                AgentDecision::Malformed => {
                    messages.push(ChatMessage::system(FORMAT_REMINDER.to_string()));
                }
            }
        }

        Ok(MAX_STEPS_ANSWER.to_string())
    }
}

enum AgentDecision {
    Final(String),
    ToolCall { name: String, args: Value },
    Malformed,
}

fn parse_agent_decision(text: &str) -> AgentDecision {
    let trimmed = text.trim();

    if let Some(json_value) = parse_json_from_text(trimmed) {
        return parse_decision_from_value(&json_value).unwrap_or(AgentDecision::Malformed);
    }

    // JSON-like output that failed to parse is retried; plain prose is
    // accepted as the final answer.
    if trimmed.contains('{') {
        AgentDecision::Malformed
    } else {
        AgentDecision::Final(trimmed.to_string())
    }
}

fn parse_json_from_text(text: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Some(v);
    }

    // Look for a JSON block inside surrounding prose
    if let Some(start) = text.find('{') {
        if let Some(end) = text.rfind('}') {
            if let Ok(v) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Some(v);
            }
        }
    }

    None
}

fn parse_decision_from_value(value: &Value) -> Option<AgentDecision> {
    let action_type = value
        .get("type")
        .or_else(|| value.get("action"))
        .and_then(|v| v.as_str())
        .unwrap_or("");

    if action_type == "tool_call" {
        let name = value
            .get("tool_name")
            .or_else(|| value.get("name"))
            .or_else(|| value.get("tool"))
            .and_then(|v| v.as_str())?;
        let args = value
            .get("tool_args")
            .or_else(|| value.get("args"))
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        return Some(AgentDecision::ToolCall {
            name: name.to_string(),
            args,
        });
    }

    if action_type == "final" {
        let content = value
            .get("content")
            .or_else(|| value.get("message"))
            .or_else(|| value.get("response"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        return Some(AgentDecision::Final(content));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::knowledge::{ChunkSearchResult, KnowledgeStore, StoredChunk};

    /// Provider returning scripted responses and recording every request.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn recorded(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ApiError::internal("script exhausted"))
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct SingleChunkStore;

    #[async_trait]
    impl KnowledgeStore for SingleChunkStore {
        async fn insert_batch(
            &self,
            _items: Vec<(StoredChunk, Vec<f32>)>,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn search(
            &self,
            _query_embedding: &[f32],
            _limit: usize,
        ) -> Result<Vec<ChunkSearchResult>, ApiError> {
            Ok(vec![ChunkSearchResult {
                chunk: StoredChunk::new("अहिंसा परमो धर्म।", "doc", 0),
                score: 0.9,
            }])
        }

        async fn count(&self) -> Result<usize, ApiError> {
            Ok(1)
        }
    }

    fn agent_with(provider: Arc<ScriptedProvider>) -> ScriptureAgent {
        let tool = ScriptureSearchTool::new(Arc::new(SingleChunkStore), provider.clone(), 4);
        ScriptureAgent::new(provider, tool)
    }

    #[tokio::test]
    async fn tool_call_then_final_answer() {
        let provider = ScriptedProvider::new(vec![
            r#"{"type":"tool_call","tool_name":"jain_scripture_search","tool_args":{"query":"अहिंसा"}}"#,
            r#"{"type":"final","content":"अहिंसा परम धर्म है।"}"#,
        ]);
        let agent = agent_with(provider.clone());

        let answer = agent.run("अहिंसा क्या है?", &[]).await.unwrap();
        assert_eq!(answer, "अहिंसा परम धर्म है।");

        // The second model call must carry the tool observation.
        let requests = provider.recorded();
        assert_eq!(requests.len(), 2);
        let observation = &requests[1].messages.last().unwrap().content;
        assert!(observation.contains("अहिंसा परमो धर्म।"));
    }

    #[tokio::test]
    async fn malformed_output_is_retried_not_fatal() {
        let provider = ScriptedProvider::new(vec![
            r#"{"type":"tool_call","tool_name": broken json"#,
            r#"{"type":"final","content":"ठीक है।"}"#,
        ]);
        let agent = agent_with(provider.clone());

        let answer = agent.run("प्रश्न", &[]).await.unwrap();
        assert_eq!(answer, "ठीक है।");

        let requests = provider.recorded();
        let reminder = &requests[1].messages.last().unwrap().content;
        assert_eq!(reminder, FORMAT_REMINDER);
    }

    #[tokio::test]
    async fn plain_prose_counts_as_final_answer() {
        let provider = ScriptedProvider::new(vec!["सीधा उत्तर।"]);
        let agent = agent_with(provider.clone());

        let answer = agent.run("प्रश्न", &[]).await.unwrap();
        assert_eq!(answer, "सीधा उत्तर।");
    }

    #[tokio::test]
    async fn unknown_tool_is_corrected_and_loop_continues() {
        let provider = ScriptedProvider::new(vec![
            r#"{"type":"tool_call","tool_name":"web_search","tool_args":{}}"#,
            r#"{"type":"final","content":"उत्तर"}"#,
        ]);
        let agent = agent_with(provider.clone());

        let answer = agent.run("प्रश्न", &[]).await.unwrap();
        assert_eq!(answer, "उत्तर");

        let requests = provider.recorded();
        assert!(requests[1]
            .messages
            .last()
            .unwrap()
            .content
            .contains("does not exist"));
    }

    #[tokio::test]
    async fn step_budget_exhaustion_returns_fixed_answer() {
        let provider = ScriptedProvider::new(vec![
            r#"{"type":"tool_call","tool_name":"jain_scripture_search","tool_args":{"query":"a"}}"#,
            r#"{"type":"tool_call","tool_name":"jain_scripture_search","tool_args":{"query":"b"}}"#,
        ]);
        let agent = agent_with(provider.clone()).with_max_steps(2);

        let answer = agent.run("प्रश्न", &[]).await.unwrap();
        assert_eq!(answer, MAX_STEPS_ANSWER);
    }

    #[tokio::test]
    async fn history_is_forwarded_to_the_model() {
        let provider = ScriptedProvider::new(vec![r#"{"type":"final","content":"उत्तर"}"#]);
        let agent = agent_with(provider.clone());

        let history = vec![
            ChatMessage::user("पहला प्रश्न"),
            ChatMessage::assistant("पहला उत्तर"),
        ];
        agent.run("दूसरा प्रश्न", &history).await.unwrap();

        let requests = provider.recorded();
        let contents: Vec<&str> = requests[0]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert!(contents.contains(&"पहला प्रश्न"));
        assert!(contents.contains(&"पहला उत्तर"));
        assert_eq!(*contents.last().unwrap(), "दूसरा प्रश्न");
    }
}
