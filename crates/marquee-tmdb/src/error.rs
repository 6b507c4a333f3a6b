use thiserror::Error;

/// Errors produced when talking to the metadata provider.
#[derive(Error, Debug)]
pub enum TmdbError {
    /// Transport-level failure (connection refused, timeout, TLS, ...).
    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Provider returned status {0}")]
    Status(u16),

    /// The record does not exist, or the payload was missing the fields
    /// that identify a real record (a person without a name, a movie
    /// without a title).
    #[error("Record not found on provider")]
    NotFound,

    /// The payload did not parse as the expected shape.
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TmdbError>;
