use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::credential::require_api_key;
use crate::core::errors::ApiError;
use crate::knowledge::{chunker, StoredChunk};
use crate::state::AppState;

const INLINE_TEXT_SOURCE: &str = "inline-text";

/// `POST /upload` — multipart form with an optional `text` field and/or a
/// `file` field, plus the caller's `x-api-key` header.
///
/// Rejects with a 400 error payload when neither is present; on success the
/// content is chunked, embedded with the caller's credential, and merged into
/// the shared knowledge index.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let credential = require_api_key(&headers)?;

    let mut inline_text: Option<String> = None;
    let mut file_content: Option<(String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("text") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid text field: {}", e)))?;
                if !text.trim().is_empty() {
                    inline_text = Some(text);
                }
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "uploaded-file".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid file field: {}", e)))?;
                let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                    ApiError::BadRequest("File is not valid UTF-8 text".to_string())
                })?;
                if !text.trim().is_empty() {
                    file_content = Some((file_name, text));
                }
            }
            _ => {}
        }
    }

    // File content takes precedence over an inline text field.
    let (source, content) = match (file_content, inline_text) {
        (Some((name, text)), _) => (name, text),
        (None, Some(text)) => (INLINE_TEXT_SOURCE.to_string(), text),
        (None, None) => return Err(ApiError::BadRequest("No content".to_string())),
    };

    let chunks = chunker::split_text(&content, state.config.knowledge.chunk_size);

    let provider = state.providers.create(&credential);
    let embeddings = provider.embed(&chunks).await?;

    let items: Vec<(StoredChunk, Vec<f32>)> = chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(index, (text, embedding))| {
            (StoredChunk::new(text, source.clone(), index as i64), embedding)
        })
        .collect();

    let inserted = items.len();
    state.knowledge.insert_batch(items).await?;

    tracing::info!("indexed {} chunks from {}", inserted, source);

    Ok(Json(json!({ "message": "Knowledge updated." })))
}
