use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Task not found: {0}")]
    TaskNotFound(u32),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BeingError>;
