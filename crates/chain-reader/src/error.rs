//! Error types for chain reads

use std::time::Duration;

use thiserror::Error;

/// Reader error type
#[derive(Error, Debug)]
pub enum ReaderError {
    /// RPC error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC call did not finish in time
    #[error("RPC call '{method}' timed out after {after:?}")]
    Timeout { method: &'static str, after: Duration },

    /// Message handed to fee estimation is not usable
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Node returned no fee, usually because the message blockhash expired
    #[error("Fee unavailable: node returned no fee for message")]
    FeeUnavailable,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A polled source had nothing new to report
    #[error("No update available")]
    NoUpdate,

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ReaderError {
    /// Whether this error only signals the absence of new data
    pub fn is_no_update(&self) -> bool {
        matches!(self, ReaderError::NoUpdate)
    }
}

impl From<solana_client::client_error::ClientError> for ReaderError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        ReaderError::Rpc(err.to_string())
    }
}

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        ReaderError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ReaderError {
    fn from(err: serde_json::Error) -> Self {
        ReaderError::Serialization(err.to_string())
    }
}

pub type ReaderResult<T> = Result<T, ReaderError>;
