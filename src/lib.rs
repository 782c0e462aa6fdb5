//! Asynchronous HTTP client with blocking, timed result retrieval.
//!
//! Requests are described as plain data, dispatched onto a background
//! runtime without blocking, and resolved through [`HttpFuture`] handles.
//! A wait that runs out of time is reported as [`Error::Timeout`] and never
//! recorded as a failure of the request itself.
//!
//! ```no_run
//! use std::time::Duration;
//! use deferred_http::{ClientConfig, HttpClient, RequestDescriptor};
//!
//! let client = HttpClient::new(ClientConfig::default())?;
//! let one = client.get("http://localhost:8000/1");
//! let two = client.dispatch(RequestDescriptor::post("http://localhost:8000/double").form("number", 3));
//! println!("{}", one.result(Duration::from_secs(1))?.text());
//! println!("{}", two.result(Duration::from_secs(1))?.text());
//! # Ok::<(), deferred_http::Error>(())
//! ```

pub mod client;
pub mod config;
pub mod deferred;
pub mod error;
pub mod http;
pub mod observability;
pub mod resilience;
pub mod runtime;
pub mod transport;

pub use client::{HttpClient, HttpFuture};
pub use config::ClientConfig;
pub use deferred::DeferredState;
pub use error::{Error, Result, TimeoutError};
pub use http::{Method, RequestDescriptor, Response};
pub use transport::Transport;
