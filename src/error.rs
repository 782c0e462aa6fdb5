//! Error types shared by the façade, the future handles and the transports.
//!
//! # Design Decisions
//! - A wait that runs out of time is `Error::Timeout` and nothing else; it is
//!   never stored on a handle, so it cannot be confused with a failure of the
//!   operation itself.
//! - Operation failures are `Clone` so the same failure can be handed back on
//!   every `result` call.
//! - Transport errors are flattened to their display text at the boundary.

use std::time::Duration;
use thiserror::Error;

/// Raised by a blocking wait whose timeout elapsed before the operation
/// reached a terminal state.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("timed out after {waited:?} waiting for the result")]
pub struct TimeoutError {
    /// How long the caller was prepared to wait.
    pub waited: Duration,
}

/// Errors surfaced by the client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The caller's wait expired. The operation may still complete.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// The request description could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The timeout passed to a wait was not usable.
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    /// The connection to the remote host could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The transport failed after the connection was made.
    #[error("transport error: {0}")]
    Transport(String),

    /// Reading the response body failed.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The operation's own deadline elapsed before a response arrived.
    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),

    /// Produced by `Response::error_for_status` for 4xx/5xx responses.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded into the requested type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The execution context went away before the operation finished.
    #[error("operation cancelled before completion")]
    Cancelled,

    /// The execution context or a transport could not be created.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The client configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True only for an expired wait, never for an operation failure.
    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// True if the operation's own deadline expired.
    pub fn is_request_timeout(&self) -> bool {
        matches!(self, Error::RequestTimeout(_))
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, Error::Connect(_))
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
