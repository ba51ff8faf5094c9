//! Error types for valkey-admin

use std::io;
use thiserror::Error;

/// Top-level error returned by every public operation
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    #[error("Invalid argument {argument} = '{value}': expected {expected}")]
    InvalidArgument {
        argument: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Error reply sent back by the store (WRONGTYPE, OOM, ...)
    #[error("Store error: {0}")]
    Store(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Connection-related errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("All {attempted} endpoints unreachable (last error: {last_error})")]
    AllEndpointsUnreachable { attempted: usize, last_error: String },

    #[error("Connection lost: {0}")]
    Lost(#[source] io::Error),

    #[error("Connection closed")]
    Closed,
}

/// Reply did not have the shape the command promises
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unexpected response to {command}: got {actual}")]
    UnexpectedResponse {
        command: String,
        actual: String,
    },

    #[error("Invalid float in reply: {0}")]
    InvalidFloat(String),
}

/// Introspection text did not match the expected layout
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("CLUSTER NODES line {line} has {fields} fields, expected at least 8")]
    ClusterNodeLine { line: usize, fields: usize },

    #[error("Invalid node address: {0}")]
    NodeAddress(String),

    #[error("Invalid replication info: {0}")]
    ReplicationInfo(String),
}

/// Transport failures become `ConnectionError::Lost`. An `AdminError` that a
/// routing layer carried through an `io::Error` is unwrapped unchanged.
impl From<io::Error> for AdminError {
    fn from(e: io::Error) -> Self {
        match e.downcast::<AdminError>() {
            Ok(inner) => inner,
            Err(e) => AdminError::Connection(ConnectionError::Lost(e)),
        }
    }
}

impl AdminError {
    pub(crate) fn unexpected(command: &str, actual: &crate::utils::RespValue) -> Self {
        AdminError::Protocol(ProtocolError::UnexpectedResponse {
            command: command.to_string(),
            actual: format!("{:?}", actual),
        })
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
