use std::fmt;

use axum::http::HeaderMap;

use crate::core::errors::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Caller-supplied Gemini API key, scoped to a single request.
///
/// Never stored server-side and never written to logs: both `Debug` and
/// `Display` render a fixed placeholder.
#[derive(Clone)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key, for building the outgoing provider request.
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiCredential(****)")
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Extracts the provider credential from the request headers.
pub fn require_api_key(headers: &HeaderMap) -> Result<ApiCredential, ApiError> {
    let value = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    Ok(ApiCredential::new(value))
}
