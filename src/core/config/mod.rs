pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AgentConfig, Config, GeminiConfig, KnowledgeConfig, ServerConfig, SessionConfig,
};
