use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid provider: {0}")]
    InvalidProvider(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("embedding request failed ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("http client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
