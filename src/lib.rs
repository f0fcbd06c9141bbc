//! # Starlog - GitHub stars archiver
//!
//! Starlog downloads a user's starred repositories from the GitHub GraphQL
//! API and re-emits them into one of several sinks.
//!
//! Starlog provides:
//! - A paginated GraphQL fetch loop producing newline-delimited JSON pages
//! - A `Printer` contract (header / line / flush) implemented by every sink
//! - Flat sinks: JSON lines, CSV, and a bulk-index two-line stream
//! - A relational sink: normalized SQLite schema, migration bootstrap, and
//!   one all-or-nothing transaction per ingestion run
//! - A small FTS5 search to validate ingested data

pub mod config;
pub mod date;
pub mod github;
pub mod ingest;
pub mod model;
pub mod printer;
pub mod search;
pub mod storage;

// Re-exports for convenient access
pub use date::DateFormat;
pub use model::{Page, StarredEdge};
pub use printer::{OutputFormat, Printer};

/// Result type alias for Starlog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Starlog operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{field} timestamp {text:?}: {source}")]
    Timestamp {
        field: &'static str,
        text: String,
        source: chrono::ParseError,
    },

    #[error("invalid date format: {0:?}")]
    BadDateFormat(String),

    #[error("unknown output format: {0}")]
    UnknownFormat(String),

    #[error("migration {name}: {source}")]
    Migration { name: String, source: Box<Error> },

    #[error("input line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("repo {repo}: {source}")]
    Record { repo: String, source: Box<Error> },

    #[error("GraphQL error: {0}")]
    GraphQl(String),
}

impl Error {
    /// Wrap an error with the natural key of the record being processed.
    pub(crate) fn for_repo(repo: &str, source: Error) -> Error {
        Error::Record {
            repo: repo.to_string(),
            source: Box::new(source),
        }
    }
}
