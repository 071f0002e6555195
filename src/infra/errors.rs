// src/infra/errors.rs — Error types for brandloop

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrandloopError {
    // Boundary errors (the LLM call itself)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    // The boundary answered, but not with a usable document
    #[error("Could not parse {stage} reply: {message}")]
    Parse { stage: String, message: String },

    // Session store misuse
    #[error("No active session. Call create_session() first.")]
    NoActiveSession,

    #[error("Session '{id}' not found")]
    SessionNotFound { id: String },

    // Caller errors
    #[error("Invalid workflow input: {0}")]
    InvalidInput(String),

    #[error("Prompt template error: {0}")]
    Prompt(#[from] minijinja::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrandloopError {
    pub fn parse(stage: &str, message: impl Into<String>) -> Self {
        BrandloopError::Parse {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// True for failures of the LLM call itself (transport, HTTP status, rate limit).
    pub fn is_boundary(&self) -> bool {
        matches!(
            self,
            BrandloopError::Provider { .. } | BrandloopError::RateLimited { .. }
        )
    }

    /// Whether the orchestrator's stage retry should try again after this error.
    ///
    /// Boundary and parse failures (and anything unclassified) are retried.
    /// Session-store misuse and invalid input are caller bugs and surface at once.
    pub fn is_stage_retryable(&self) -> bool {
        !matches!(
            self,
            BrandloopError::NoActiveSession
                | BrandloopError::SessionNotFound { .. }
                | BrandloopError::InvalidInput(_)
                | BrandloopError::Config(_)
        )
    }
}
