//! HTTP client used by the `shastra-chat` terminal binary.
//!
//! Every server response is folded into a display string: non-success
//! statuses render as an error string carrying the status and body, and a
//! body that fails to parse as JSON renders as an explicit invalid-response
//! message. Nothing in here panics on server output.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::core::credential::API_KEY_HEADER;

const BODY_SNIPPET_LEN: usize = 200;

pub struct ChatApi {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ChatApi {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Asks a question; always returns displayable text.
    pub async fn chat(&self, query: &str, session_id: &str) -> String {
        let url = format!("{}/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("query", query), ("session_id", session_id)])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await;

        match response {
            Ok(res) => {
                let status = res.status().as_u16();
                let body = res.text().await.unwrap_or_default();
                render_answer(status, &body)
            }
            Err(err) => format!("Error: could not reach the server: {}", err),
        }
    }

    /// Uploads a text file into the knowledge base.
    pub async fn upload_file(&self, path: &Path) -> String {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => return format!("Error: could not read {}: {}", path.display(), err),
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.txt".to_string());

        let part = match Part::bytes(bytes).file_name(file_name).mime_str("text/plain") {
            Ok(part) => part,
            Err(err) => return format!("Error: could not build upload: {}", err),
        };
        let form = Form::new().part("file", part);

        let url = format!("{}/upload", self.base_url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await;

        match response {
            Ok(res) => {
                let status = res.status().as_u16();
                let body = res.text().await.unwrap_or_default();
                render_upload(status, &body)
            }
            Err(err) => format!("Error: could not reach the server: {}", err),
        }
    }
}

/// Folds a `/chat` response into displayable text.
pub fn render_answer(status: u16, body: &str) -> String {
    if !(200..300).contains(&status) {
        return format!(
            "Error: server returned status {}: {}",
            status,
            snippet(body)
        );
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("answer").and_then(|v| v.as_str()) {
            Some(answer) => answer.to_string(),
            None => format!(
                "Error: invalid response from server (status {}): {}",
                status,
                snippet(body)
            ),
        },
        Err(_) => format!(
            "Error: invalid response from server (status {}): {}",
            status,
            snippet(body)
        ),
    }
}

/// Folds an `/upload` response into displayable text.
pub fn render_upload(status: u16, body: &str) -> String {
    if !(200..300).contains(&status) {
        return format!(
            "Error: server returned status {}: {}",
            status,
            snippet(body)
        );
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "Error: invalid response from server (status {}): {}",
                    status,
                    snippet(body)
                )
            }),
        Err(_) => format!(
            "Error: invalid response from server (status {}): {}",
            status,
            snippet(body)
        ),
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    trimmed.chars().take(BODY_SNIPPET_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_answer_is_extracted() {
        let body = r#"{"answer":"अहिंसा परम धर्म है।"}"#;
        assert_eq!(render_answer(200, body), "अहिंसा परम धर्म है।");
    }

    #[test]
    fn non_success_status_renders_status_and_body() {
        let rendered = render_answer(401, r#"{"error":"Missing or empty x-api-key header"}"#);
        assert!(rendered.contains("401"));
        assert!(rendered.contains("x-api-key"));
    }

    #[test]
    fn html_error_page_renders_invalid_response_message() {
        let rendered = render_answer(200, "<html><body>Internal Server Error</body></html>");
        assert!(rendered.contains("invalid response from server"));
        assert!(rendered.contains("200"));
    }

    #[test]
    fn json_without_answer_field_is_invalid() {
        let rendered = render_answer(200, r#"{"unexpected":true}"#);
        assert!(rendered.contains("invalid response from server"));
    }

    #[test]
    fn upload_message_is_extracted() {
        let body = r#"{"message":"Knowledge updated."}"#;
        assert_eq!(render_upload(200, body), "Knowledge updated.");
    }

    #[test]
    fn empty_body_snippet_is_marked() {
        let rendered = render_answer(502, "");
        assert!(rendered.contains("502"));
        assert!(rendered.contains("<empty body>"));
    }
}
