use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Missing {what}: {context}")]
    MissingData { what: String, context: String },

    #[error("Flag assignment exhausted all strategies; unassigned edges: {}", edges.join("; "))]
    AmbiguousMatch { edges: Vec<String> },

    #[error("Malformed {what}: {context}")]
    MalformedInput { what: String, context: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CompileError {
    pub fn missing(what: impl Into<String>, context: impl Into<String>) -> Self {
        CompileError::MissingData {
            what: what.into(),
            context: context.into(),
        }
    }

    pub fn malformed(what: impl Into<String>, context: impl Into<String>) -> Self {
        CompileError::MalformedInput {
            what: what.into(),
            context: context.into(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
