//! Typed application configuration.
//!
//! Loaded from an optional `config.yml` (override the location with
//! `SHASTRA_CONFIG_PATH`); every field has a serde default so a missing or
//! partial file falls back to the built-in values. The listen port can
//! additionally be overridden with the `PORT` environment variable.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;
use crate::core::errors::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub knowledge: KnowledgeConfig,
    pub agent: AgentConfig,
    pub gemini: GeminiConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Number of chunks returned per retrieval.
    pub top_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            top_k: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Upper bound on reasoning-loop iterations per question.
    pub max_steps: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_steps: 6 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_base: String,
    pub chat_model: String,
    pub embed_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            chat_model: "gemini-2.5-flash".to_string(),
            embed_model: "text-embedding-001".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of concurrently retained sessions.
    pub capacity: usize,
    /// Idle minutes before a session's history is dropped.
    pub ttl_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            ttl_minutes: 60,
        }
    }
}

impl Config {
    pub fn load(paths: &AppPaths) -> Result<Self, ApiError> {
        let mut config = match config_path(paths) {
            Some(path) => {
                let raw = fs::read_to_string(&path).map_err(|e| {
                    ApiError::internal(format!("Failed to read {}: {}", path.display(), e))
                })?;
                serde_yaml::from_str(&raw).map_err(|e| {
                    ApiError::internal(format!("Invalid config {}: {}", path.display(), e))
                })?
            }
            None => Config::default(),
        };

        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            config.server.port = port;
        }

        Ok(config)
    }
}

fn config_path(paths: &AppPaths) -> Option<PathBuf> {
    if let Ok(path) = env::var("SHASTRA_CONFIG_PATH") {
        let path = PathBuf::from(path);
        return path.exists().then_some(path);
    }

    let default = paths.data_dir.join("config.yml");
    default.exists().then_some(default)
}
