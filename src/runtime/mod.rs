//! Execution-context adapter.
//!
//! Synchronous callers never touch Tokio directly: the client hands work to a
//! `Reactor`, and results come back through `Deferred` cells.

pub mod reactor;

pub use reactor::Reactor;
