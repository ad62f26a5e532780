use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    ConnectionFailed(String),
    SourceNotFound(String),
    SourceEmpty(String),
    NoValidRows(String),
    InvalidUserChoice(String),
    TableNotFound(String),
    DatabaseError(String),
    WriteFailed(String),
    ParseError(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ConnectionFailed(msg) => write!(f, "Database connection failed: {}", msg),
            AppError::SourceNotFound(msg) => write!(f, "Source not found: {}", msg),
            AppError::SourceEmpty(msg) => write!(f, "Source is empty: {}", msg),
            AppError::NoValidRows(msg) => write!(f, "No valid rows: {}", msg),
            AppError::InvalidUserChoice(msg) => write!(f, "Invalid choice: {}", msg),
            AppError::TableNotFound(msg) => write!(f, "Table not found: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
