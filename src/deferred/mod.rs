//! Deferred results.
//!
//! A `Deferred` is the read side of a single asynchronous operation; the
//! matching `Resolver` is moved into the task doing the work. Callers block
//! on the deferred with a timeout from any thread.

pub mod cell;

pub use cell::{deferred, Deferred, DeferredState, Resolver};
pub(crate) use cell::timed;
