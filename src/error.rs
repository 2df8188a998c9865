//! Error types for the feed handler

use thiserror::Error;

/// Stream-level failures. Any of these ends the current run.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Truncated stream: frame promised {expected} bytes, only {available} arrived")]
    Truncated { expected: usize, available: usize },

    #[error("I/O error while reading feed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    Metrics(String),
}

/// Per-message anomalies. The offending message is skipped and the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("Order reference {reference} is not live")]
    DanglingReference { reference: u64 },

    #[error("Order reference {reference} added while still live")]
    ReferenceCollision { reference: u64 },

    #[error("Message '{tag}' too short: {len} bytes, layout needs {needed}")]
    MessageTooShort { tag: char, len: usize, needed: usize },
}

impl BookError {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            BookError::DanglingReference { .. } => "dangling_reference",
            BookError::ReferenceCollision { .. } => "reference_collision",
            BookError::MessageTooShort { .. } => "message_too_short",
        }
    }
}

impl FeedError {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Truncated { .. } => "truncated",
            FeedError::Io(_) => "io",
            FeedError::ConfigError(_) => "config",
            FeedError::Metrics(_) => "metrics",
        }
    }
}

impl From<prometheus::Error> for FeedError {
    fn from(err: prometheus::Error) -> Self {
        FeedError::Metrics(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
