//! HTTP client façade.
//!
//! # Data Flow
//! ```text
//! caller thread                     reactor
//! ─────────────                     ───────
//! dispatch(descriptor)
//!   → prepare (validate, encode)
//!   → spawn ─────────────────────▶  with_deadline(transport.send(..))
//!   ◀ HttpFuture (pending)                 │
//! result(timeout) ... blocks ...           ▼
//!   ◀ Response | Error ◀────────── Resolver::resolve(outcome)
//! ```

pub mod facade;
pub mod future;

pub use facade::HttpClient;
pub use future::HttpFuture;
