//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, ConversationBackend, ConversationConfig, DatabaseConfig, LlmConfig, LogFormat,
    LoggingConfig, SchemaConfig, ServerConfig, WorkflowConfig,
};
