//! Operation deadlines.
//!
//! # Responsibilities
//! - Wrap transport calls with the request's own deadline
//! - Report an expired deadline as an operation failure
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - An expired deadline is `Error::RequestTimeout`, never the wait-level
//!   `Error::Timeout`; it is recorded on the handle like any other failure

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Run `fut`, failing with `RequestTimeout` if `deadline` elapses first.
pub async fn with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::RequestTimeout(limit)),
        },
    }
}
