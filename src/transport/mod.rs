//! Transport backends.
//!
//! # Data Flow
//! ```text
//! PreparedRequest
//!     → Transport::send (runs on the reactor)
//!         → hyper_backend.rs   (hyper-util legacy client)
//!         → reqwest_backend.rs (reqwest client)
//!     → Response | Error
//! ```
//!
//! # Design Decisions
//! - Backends are interchangeable behind `Transport`; the façade never names one
//! - `send` returns a `'static` boxed future so it can be spawned
//! - Connection pooling stays inside each backend
//! - Backend errors are mapped to `Error::Connect`, `Error::Transport` or
//!   `Error::Body` with their full source chain

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::config::{TransportConfig, TransportKind};
use crate::error::Result;
use crate::http::{PreparedRequest, Response};

pub mod hyper_backend;
pub mod reqwest_backend;

pub use hyper_backend::HyperTransport;
pub use reqwest_backend::ReqwestTransport;

/// Something that can perform a prepared request.
pub trait Transport: Send + Sync + 'static {
    /// Short backend name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Perform the request. Must resolve exactly once.
    fn send(&self, request: PreparedRequest) -> BoxFuture<'static, Result<Response>>;
}

/// Build the backend selected in the configuration.
///
/// Call from within the reactor's context; some backends register with the
/// current runtime on construction.
pub fn build_transport(config: &TransportConfig) -> Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match config.kind {
        TransportKind::Hyper => Arc::new(HyperTransport::new(config)),
        TransportKind::Reqwest => Arc::new(ReqwestTransport::new(config)?),
    };
    tracing::debug!(transport = transport.name(), "Transport initialized");
    Ok(transport)
}

/// Render an error with its whole `source()` chain.
pub(crate) fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
