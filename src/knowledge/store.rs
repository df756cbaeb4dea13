//! KnowledgeStore trait — abstract interface for the persistent chunk index.
//!
//! The index is a strict union of all uploads: inserts only, never
//! deduplicating, never replacing. The primary implementation is
//! `SqliteKnowledgeStore` in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::core::errors::ApiError;

/// A stored document chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Source label (file name or "inline-text").
    pub source: String,
    /// SHA-256 hash of the content, for provenance.
    pub content_hash: String,
    /// Position of the chunk within its upload.
    pub chunk_index: i64,
    /// RFC 3339 insertion timestamp.
    pub created_at: String,
}

impl StoredChunk {
    pub fn new(content: impl Into<String>, source: impl Into<String>, chunk_index: i64) -> Self {
        let content = content.into();
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let content_hash = format!("{:x}", hasher.finalize());

        Self {
            chunk_id: Uuid::new_v4().to_string(),
            content,
            source: source.into(),
            content_hash,
            chunk_index,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Similarity score (higher = better).
    pub score: f32,
}

/// Abstract trait for the knowledge index.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Insert chunks with their embedding vectors. All-or-nothing per call.
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError>;

    /// Return the `limit` chunks most similar to the query embedding,
    /// ranked by similarity descending.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<usize, ApiError>;
}
