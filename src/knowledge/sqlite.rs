//! SQLite-backed knowledge index.
//!
//! Chunk metadata and embedding vectors live in one SQLite database under the
//! data directory; search is brute-force cosine similarity over all rows.
//! SQLite serializes concurrent writers, so simultaneous uploads cannot lose
//! each other's chunks.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkSearchResult, KnowledgeStore, StoredChunk};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
}

impl SqliteKnowledgeStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.index_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS knowledge_chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                content_hash TEXT NOT NULL DEFAULT '',
                chunk_index INTEGER NOT NULL DEFAULT 0,
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT ''
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON knowledge_chunks(source)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        StoredChunk {
            chunk_id: row.get("chunk_id"),
            content: row.get("content"),
            source: row.get("source"),
            content_hash: row.get("content_hash"),
            chunk_index: row.get("chunk_index"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (chunk, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);

            sqlx::query(
                "INSERT INTO knowledge_chunks (chunk_id, content, source, content_hash, chunk_index, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&chunk.chunk_id)
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(&chunk.content_hash)
            .bind(chunk.chunk_index)
            .bind(&blob)
            .bind(&chunk.created_at)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError> {
        let rows = sqlx::query(
            "SELECT chunk_id, content, source, content_hash, chunk_index, embedding, created_at
             FROM knowledge_chunks",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<ChunkSearchResult> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored_emb);

                Some(ChunkSearchResult {
                    chunk: Self::row_to_chunk(row),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(1));

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM knowledge_chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("knowledge.db")
    }

    #[tokio::test]
    async fn insert_and_search_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteKnowledgeStore::with_path(test_db_path(&dir))
            .await
            .unwrap();

        store
            .insert_batch(vec![
                (StoredChunk::new("ahimsa", "doc", 0), vec![1.0, 0.0, 0.0]),
                (StoredChunk::new("aparigraha", "doc", 1), vec![0.0, 1.0, 0.0]),
                (StoredChunk::new("anekantavada", "doc", 2), vec![0.9, 0.1, 0.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "ahimsa");
        assert_eq!(results[1].chunk.content, "anekantavada");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn uploads_are_additive_never_deduplicating() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteKnowledgeStore::with_path(test_db_path(&dir))
            .await
            .unwrap();

        let batch = || {
            vec![
                (StoredChunk::new("same text", "doc", 0), vec![1.0, 0.0]),
                (StoredChunk::new("same text", "doc", 1), vec![1.0, 0.0]),
            ]
        };

        store.insert_batch(batch()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        store.insert_batch(batch()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn reopening_the_store_preserves_search_results() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = test_db_path(&dir);
        let query = [0.6, 0.8, 0.0];

        let before = {
            let store = SqliteKnowledgeStore::with_path(db_path.clone()).await.unwrap();
            store
                .insert_batch(vec![
                    (StoredChunk::new("alpha", "doc", 0), vec![0.6, 0.8, 0.0]),
                    (StoredChunk::new("beta", "doc", 1), vec![0.0, 0.0, 1.0]),
                    (StoredChunk::new("gamma", "doc", 2), vec![0.8, 0.6, 0.0]),
                ])
                .await
                .unwrap();
            store.search(&query, 3).await.unwrap()
        };

        let reopened = SqliteKnowledgeStore::with_path(db_path).await.unwrap();
        let after = reopened.search(&query, 3).await.unwrap();

        let ids = |results: &[ChunkSearchResult]| {
            results
                .iter()
                .map(|r| r.chunk.chunk_id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&before), ids(&after));
    }

    #[tokio::test]
    async fn empty_store_counts_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteKnowledgeStore::with_path(test_db_path(&dir))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
