use std::sync::Arc;

use crate::core::config::{AppPaths, Config};
use crate::core::errors::ApiError;
use crate::knowledge::{KnowledgeStore, SqliteKnowledgeStore};
use crate::llm::{GeminiProviderFactory, ProviderFactory};
use crate::sessions::SessionMemory;

/// Global application state shared across all routes.
///
/// Holds the configuration, the knowledge index handle (opened once at
/// startup), the in-memory session map, and the factory that builds a
/// transient Gemini client per request credential.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: Config,
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub sessions: Arc<SessionMemory>,
    pub providers: Arc<dyn ProviderFactory>,
}

impl AppState {
    pub async fn initialize() -> Result<Arc<Self>, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let config = Config::load(&paths)?;

        let knowledge = Arc::new(SqliteKnowledgeStore::new(&paths).await?);
        let sessions = Arc::new(SessionMemory::new(&config.sessions));
        let providers = Arc::new(GeminiProviderFactory::new(config.gemini.clone()));

        Ok(Arc::new(AppState {
            paths,
            config,
            knowledge,
            sessions,
            providers,
        }))
    }
}
