use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Nl2SqlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Database file not found at {}", .0.display())]
    DatabaseMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<rusqlite::Error> for Nl2SqlError {
    fn from(err: rusqlite::Error) -> Self {
        Nl2SqlError::Database(err.to_string())
    }
}

impl From<csv::Error> for Nl2SqlError {
    fn from(err: csv::Error) -> Self {
        Nl2SqlError::Csv(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Nl2SqlError>;
