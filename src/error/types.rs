//! Error types
//!
//! Defines the errors raised while starting the server and while reading
//! request heads. Access decisions are never errors: a restricted path falls
//! through to the next handler like a missing file.

use std::io;

use thiserror::Error;

/// Malformed or oversized HTTP request heads
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Empty request")]
    EmptyRequest,
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),
    #[error("Unsupported HTTP version: {0}")]
    UnsupportedVersion(String),
    #[error("Invalid request target: {0}")]
    InvalidTarget(String),
    #[error("Malformed header line: {0}")]
    MalformedHeader(String),
    #[error("Request head exceeds {0} bytes")]
    HeadTooLarge(usize),
}

impl ProtocolError {
    /// HTTP status used to answer the client
    pub fn status_code(&self) -> u16 {
        match self {
            ProtocolError::HeadTooLarge(_) => 431,
            _ => 400,
        }
    }
}

/// Server start-up and connection errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
