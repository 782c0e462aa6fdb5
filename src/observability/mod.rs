//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Client operations produce:
//!     → logging.rs (structured log events, request ID in every span)
//!     → metrics.rs (counters, gauges, histograms)
//! ```
//!
//! # Design Decisions
//! - The library only emits; the binary installs the subscriber
//! - Request ID flows through the dispatch span and the outgoing header

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
