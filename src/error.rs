//! Error types for Talkbook.

use thiserror::Error;

/// Library-level error type for Talkbook operations.
#[derive(Error, Debug)]
pub enum TalkbookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown series '{0}'. Run 'talkbook list' to see configured series.")]
    SeriesNotFound(String),

    #[error("Playlist discovery failed: {0}")]
    Discovery(String),

    #[error("Metadata lookup failed: {0}")]
    Metadata(String),

    #[error("Book assembly failed: {0}")]
    Build(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing file: {0}")]
    MissingFile(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("External tool timed out: {0}")]
    ToolTimeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Talkbook operations.
pub type Result<T> = std::result::Result<T, TalkbookError>;
