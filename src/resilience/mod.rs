//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatched request:
//!     → timeouts.rs (enforce the operation deadline)
//!     → transport
//! ```
//!
//! # Design Decisions
//! - The operation deadline is separate from how long a caller waits
//! - Retries are left to callers; the client sends each request once

pub mod timeouts;

pub use timeouts::with_deadline;
