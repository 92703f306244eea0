use thiserror::Error;

/// Errors shared across the Flow crates.
///
/// Library code that only shuffles bytes around uses `anyhow`; anything a
/// caller is expected to branch on (bad input, missing records) surfaces as a
/// `FlowError` so the gateway and client can map it to a status or a degraded
/// value.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("llm error: {0}")]
    Llm(String),

    /// Stops an agent chain instead of being recorded and skipped.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl FlowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;
