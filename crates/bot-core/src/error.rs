//! Error types shared by the core and its adapters

use thiserror::Error;

/// Failures of the chat transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the source-hosting service.
#[derive(Error, Debug)]
pub enum HostingError {
    #[error("Invalid or unauthorized token")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// The file changed between read and write.
    #[error("File `{0}` was changed remotely since it was read")]
    StaleRevision(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {0}")]
    Api(String),
}

/// Failures of a single token lookup.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Response has no token")]
    MissingToken,

    #[error("Lookup timed out")]
    Timeout,
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
pub type HostingResult<T> = std::result::Result<T, HostingError>;
