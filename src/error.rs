use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("tool `{0}` is not registered")]
    ToolNotFound(String),

    #[error("tool `{name}` invocation failed: {source}")]
    ToolInvocation {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("language model error: {0}")]
    LanguageModel(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("retrieval error: {0}")]
    Retrieval(String),

    #[error("could not parse LLM output: `{raw}`")]
    Parse { raw: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("agent stopped after {max} iterations without a final answer")]
    IterationsExhausted { max: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl ScoutError {
    /// Failures of an upstream provider (model, embeddings, search, network).
    ///
    /// Only these make the orchestrator switch to its secondary strategy.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            ScoutError::LanguageModel(_)
                | ScoutError::Embedding(_)
                | ScoutError::Retrieval(_)
                | ScoutError::ToolInvocation { .. }
                | ScoutError::Timeout { .. }
        )
    }

    pub(crate) fn tool(
        name: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ScoutError::ToolInvocation {
            name: name.into(),
            source: Box::new(err),
        }
    }
}
