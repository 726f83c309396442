use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeskbotError>;

#[derive(Debug, Error)]
pub enum DeskbotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("tool `{0}` not found")]
    ToolNotFound(String),

    #[error("tool `{name}` invocation failed: {source}")]
    ToolInvocation {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("order `{0}` not found")]
    OrderNotFound(String),

    #[error("language model error: {0}")]
    LanguageModel(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
