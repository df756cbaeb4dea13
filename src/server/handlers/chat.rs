use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::agent::prompt::EMPTY_KNOWLEDGE_ANSWER;
use crate::agent::tool::ScriptureSearchTool;
use crate::agent::ScriptureAgent;
use crate::core::credential::require_api_key;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatParams {
    pub query: String,
    pub session_id: String,
}

/// `POST /chat` — answers `query` for `session_id` using the caller's
/// credential.
///
/// An empty knowledge index short-circuits with a fixed informational answer
/// before any provider call; otherwise the agent reasons over the retrieval
/// tool and the session's prior turns, and the new turn is appended to the
/// session history.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ChatParams>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = require_api_key(&headers)?;

    if params.query.trim().is_empty() {
        return Err(ApiError::BadRequest("Empty query".to_string()));
    }

    if state.knowledge.count().await? == 0 {
        return Ok(Json(json!({ "answer": EMPTY_KNOWLEDGE_ANSWER })));
    }

    let provider = state.providers.create(&credential);
    let tool = ScriptureSearchTool::new(
        state.knowledge.clone(),
        provider.clone(),
        state.config.knowledge.top_k,
    );
    let agent = ScriptureAgent::new(provider, tool)
        .with_max_steps(state.config.agent.max_steps);

    let history = state.sessions.history(&params.session_id).await;
    let answer = agent.run(&params.query, &history).await?;

    state
        .sessions
        .append_turn(&params.session_id, &params.query, &answer)
        .await;

    Ok(Json(json!({ "answer": answer })))
}
