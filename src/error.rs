use thiserror::Error;

/// Errors surfaced by storage, export and path construction.
///
/// Interactive operations (gestures, counter mutations) never return these;
/// they clamp or ignore bad input instead.
#[derive(Debug, Error)]
pub enum TasbeehError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, TasbeehError>;
