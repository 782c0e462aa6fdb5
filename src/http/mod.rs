//! HTTP data types.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor (caller data)
//!     → request.rs (validate, encode params/form/body, merge headers)
//!     → PreparedRequest (handed to a transport)
//!     → transport performs I/O
//!     → response.rs (buffered Response)
//! ```

pub mod request;
pub mod response;

pub use request::{Method, PreparedRequest, RequestDefaults, RequestDescriptor, X_REQUEST_ID};
pub use response::Response;
