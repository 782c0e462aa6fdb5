//! Client metrics.
//!
//! # Metrics
//! - `http_client_requests_total` (counter): completed operations by method,
//!   transport and outcome
//! - `http_client_request_duration_seconds` (histogram): dispatch to terminal
//!   state
//! - `http_client_in_flight` (gauge): operations not yet terminal
//!
//! Values go to whatever `metrics` recorder the application installed; with
//! none installed the calls are no-ops.

use std::time::Instant;

use crate::error::Error;

/// Outcome label for a finished operation.
pub fn outcome_label(outcome: Result<u16, &Error>) -> &'static str {
    match outcome {
        Ok(status) if status < 400 => "success",
        Ok(_) => "http_error",
        Err(Error::Connect(_)) => "connect_error",
        Err(Error::RequestTimeout(_)) => "timeout",
        Err(Error::InvalidRequest(_)) => "invalid",
        Err(Error::Cancelled) => "cancelled",
        Err(_) => "error",
    }
}

/// Holds one unit of the in-flight gauge; released on drop, including when
/// the task owning it is dropped unfinished.
#[derive(Debug)]
pub struct InFlight {
    start: Instant,
}

impl InFlight {
    pub fn start() -> Self {
        metrics::gauge!("http_client_in_flight").increment(1.0);
        Self {
            start: Instant::now(),
        }
    }

    pub fn started_at(&self) -> Instant {
        self.start
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::gauge!("http_client_in_flight").decrement(1.0);
    }
}

pub fn record_completion(method: &str, transport: &'static str, outcome: &'static str, start: Instant) {
    let duration = start.elapsed().as_secs_f64();
    metrics::counter!(
        "http_client_requests_total",
        "method" => method.to_string(),
        "transport" => transport,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "http_client_request_duration_seconds",
        "method" => method.to_string(),
        "transport" => transport
    )
    .record(duration);
}
