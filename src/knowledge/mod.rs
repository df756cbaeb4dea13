pub mod chunker;
pub mod sqlite;
pub mod store;

pub use sqlite::SqliteKnowledgeStore;
pub use store::{ChunkSearchResult, KnowledgeStore, StoredChunk};
