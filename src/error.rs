use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DigestGateError {
    #[error("invalid rule pattern {pattern:?}: {reason}")]
    InvalidRule { pattern: String, reason: String },

    #[error("invalid keyword list: {reason}")]
    InvalidKeywords { reason: String },

    #[error("config parse error in {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DigestGateError>;
