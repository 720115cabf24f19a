//! Error types for the query resolution engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    // =============================
    // Dataset Errors
    // =============================

    #[error("Dataset is empty: statistics are undefined")]
    EmptyDataset,

    #[error("Duplicate symbol in dataset: {0}")]
    DuplicateSymbol(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Stock data file not found (tried: {})", format_paths(.attempted))]
    DatasetNotFound { attempted: Vec<PathBuf> },

    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord { line: u64, message: String },

    // =============================
    // Reasoning Agent Errors
    // =============================

    #[error("Reasoning agent not configured")]
    AgentUnavailable,

    #[error("Reasoning agent failed: {0}")]
    AgentExecution(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
