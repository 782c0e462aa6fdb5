//! Handle returned by `HttpClient::dispatch`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::deferred::{timed, Deferred, DeferredState};
use crate::error::{Error, Result};
use crate::http::{Method, Response};
use crate::runtime::Reactor;

/// Handle to one dispatched request.
///
/// Clones observe the same operation and may be waited on from different
/// threads. Waiting never alters the operation: a wait that runs out of time
/// returns `Error::Timeout` and the request keeps going. A handle keeps the
/// client's runtime alive, so it stays usable after the client is dropped.
#[derive(Debug, Clone)]
pub struct HttpFuture {
    inner: Deferred<Response>,
    request_id: Uuid,
    method: Method,
    url: String,
    dispatched_at: Instant,
    _reactor: Option<Arc<Reactor>>,
}

impl HttpFuture {
    pub(crate) fn new(inner: Deferred<Response>, request_id: Uuid, method: Method, url: String) -> Self {
        Self {
            inner,
            request_id,
            method,
            url,
            dispatched_at: Instant::now(),
            _reactor: None,
        }
    }

    pub(crate) fn keep_alive(mut self, reactor: Arc<Reactor>) -> Self {
        self._reactor = Some(reactor);
        self
    }

    /// Block up to `timeout` for the response.
    ///
    /// Returns the response, the request's own failure, or `Error::Timeout`
    /// if neither arrived in time. Calling again after completion returns an
    /// equal response without sending anything.
    pub fn result(&self, timeout: Duration) -> Result<Response> {
        let (outcome, waited) = timed(|| self.inner.result(timeout));
        if let Err(Error::Timeout(_)) = &outcome {
            tracing::debug!(
                request_id = %self.request_id,
                waited_ms = waited.as_millis() as u64,
                "Wait timed out, request still in flight"
            );
        }
        outcome
    }

    /// `result` with the timeout in (fractional) seconds. Infinity waits
    /// without limit.
    pub fn result_secs(&self, timeout_secs: f64) -> Result<Response> {
        if timeout_secs.is_nan() || timeout_secs < 0.0 {
            return Err(Error::InvalidTimeout(format!(
                "{} is not a non-negative number of seconds",
                timeout_secs
            )));
        }
        match Duration::try_from_secs_f64(timeout_secs) {
            Ok(timeout) => self.result(timeout),
            // Too large to represent, which includes infinity.
            Err(_) => self.wait(),
        }
    }

    /// Block until the request finishes.
    pub fn wait(&self) -> Result<Response> {
        self.inner.wait()
    }

    /// The response or failure if already finished; never blocks.
    pub fn try_result(&self) -> Option<Result<Response>> {
        self.inner.try_result()
    }

    /// The request's own failure, independent of any caller's wait.
    pub fn original_failure(&self) -> Option<Error> {
        self.inner.original_failure()
    }

    pub fn state(&self) -> DeferredState {
        self.inner.state()
    }

    pub fn is_done(&self) -> bool {
        self.inner.is_done()
    }

    /// Correlation ID, also sent as `x-request-id` when enabled.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Time since dispatch.
    pub fn elapsed(&self) -> Duration {
        self.dispatched_at.elapsed()
    }
}
