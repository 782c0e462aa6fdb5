//! The client façade.
//!
//! # Responsibilities
//! - Prepare request descriptors (pure CPU work, on the caller's thread)
//! - Spawn the transport call onto the reactor and return a handle at once
//! - Apply the operation deadline, log and record metrics per request
//!
//! # Design Decisions
//! - `dispatch` is infallible: a bad descriptor yields an already-failed
//!   handle, so every failure surfaces through `result`
//! - Concurrent requests share only the transport's connection pool
//! - Clones, handles and in-flight requests all share one reactor; an owned
//!   runtime shuts down only once the last of them is gone

use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::future::HttpFuture;
use crate::config::{validate_config, ClientConfig};
use crate::deferred::deferred;
use crate::error::{Error, Result};
use crate::http::{RequestDefaults, RequestDescriptor};
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::runtime::Reactor;
use crate::transport::{build_transport, Transport};

struct Inner {
    reactor: Arc<Reactor>,
    transport: Arc<dyn Transport>,
    defaults: RequestDefaults,
    metrics_enabled: bool,
}

/// Asynchronous HTTP client with blocking, timed result retrieval.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("transport", &self.inner.transport.name())
            .field("owned_runtime", &self.inner.reactor.is_owned())
            .finish()
    }
}

impl HttpClient {
    /// Build a client with its own runtime and the configured transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        check(&config)?;
        let reactor = Reactor::new(&config.runtime)?;
        let transport = {
            let _entered = reactor.handle().enter();
            build_transport(&config.transport)?
        };
        Self::assemble(&config, reactor, transport)
    }

    /// Build a client with its own runtime around a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        check(&config)?;
        let reactor = Reactor::new(&config.runtime)?;
        Self::assemble(&config, reactor, transport)
    }

    /// Build a client that runs on an existing runtime.
    pub fn with_runtime_handle(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        handle: Handle,
    ) -> Result<Self> {
        check(&config)?;
        Self::assemble(&config, Reactor::from_handle(handle), transport)
    }

    fn assemble(config: &ClientConfig, reactor: Reactor, transport: Arc<dyn Transport>) -> Result<Self> {
        let defaults = RequestDefaults::from_config(config)?;
        tracing::info!(
            transport = transport.name(),
            owned_runtime = reactor.is_owned(),
            "HTTP client ready"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                reactor: Arc::new(reactor),
                transport,
                defaults,
                metrics_enabled: config.observability.metrics_enabled,
            }),
        })
    }

    pub fn transport_name(&self) -> &'static str {
        self.inner.transport.name()
    }

    /// Send a request in the background and return its handle immediately.
    pub fn dispatch(&self, descriptor: RequestDescriptor) -> HttpFuture {
        let request_id = Uuid::new_v4();
        let method = descriptor.method;
        let (cell, resolver) = deferred();
        let future = HttpFuture::new(cell, request_id, method, descriptor.url.clone())
            .keep_alive(Arc::clone(&self.inner.reactor));

        let prepared = match descriptor.prepare(&self.inner.defaults, request_id) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Request rejected");
                if self.inner.metrics_enabled {
                    let label = metrics::outcome_label(Err(&e));
                    metrics::record_completion(method.as_str(), self.transport_name(), label, Instant::now());
                }
                resolver.resolve(Err(e));
                return future;
            }
        };

        let transport = Arc::clone(&self.inner.transport);
        let span = tracing::debug_span!(
            "http_request",
            request_id = %request_id,
            method = %method,
            url = %prepared.url,
            transport = transport.name()
        );
        let in_flight = self.inner.metrics_enabled.then(metrics::InFlight::start);
        let reactor = Arc::clone(&self.inner.reactor);

        self.inner.reactor.spawn(
            async move {
                let _reactor = reactor;
                tracing::debug!("Request started");
                let deadline = prepared.deadline;
                let outcome = with_deadline(deadline, transport.send(prepared)).await;

                match &outcome {
                    Ok(response) => tracing::debug!(status = response.status(), "Request completed"),
                    Err(e) => tracing::warn!(error = %e, "Request failed"),
                }
                if let Some(in_flight) = in_flight {
                    let label = metrics::outcome_label(outcome.as_ref().map(|r| r.status()));
                    metrics::record_completion(method.as_str(), transport.name(), label, in_flight.started_at());
                }
                resolver.resolve(outcome);
            }
            .instrument(span),
        );

        future
    }

    /// Dispatch every descriptor; handles are returned in input order.
    pub fn dispatch_all<I>(&self, descriptors: I) -> Vec<HttpFuture>
    where
        I: IntoIterator<Item = RequestDescriptor>,
    {
        descriptors.into_iter().map(|d| self.dispatch(d)).collect()
    }

    pub fn get(&self, url: impl Into<String>) -> HttpFuture {
        self.dispatch(RequestDescriptor::get(url))
    }

    /// POST `fields` as an urlencoded form.
    pub fn post_form<I, K, V>(&self, url: impl Into<String>, fields: I) -> HttpFuture
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let descriptor = fields
            .into_iter()
            .fold(RequestDescriptor::post(url), |d, (k, v)| d.form(k, v));
        self.dispatch(descriptor)
    }
}

fn check(config: &ClientConfig) -> Result<()> {
    validate_config(config).map_err(|errors| {
        Error::Config(
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use crate::deferred::DeferredState;
    use crate::http::{Method, PreparedRequest, Response, X_REQUEST_ID};
    use bytes::Bytes;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Echoes the request back after an optional delay.
    #[derive(Default)]
    struct EchoTransport {
        delay: Duration,
        calls: AtomicUsize,
        seen: Mutex<Vec<PreparedRequest>>,
    }

    impl Transport for EchoTransport {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn send(&self, request: PreparedRequest) -> BoxFuture<'static, Result<Response>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                let body = format!("{} {}", request.method, request.url);
                Ok(Response::new(200, Vec::new(), Bytes::from(body)))
            })
        }
    }

    /// Fails after a delay.
    struct FailingTransport(Duration);

    impl Transport for FailingTransport {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn send(&self, _request: PreparedRequest) -> BoxFuture<'static, Result<Response>> {
            let delay = self.0;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Err(Error::Connect("connection refused".into()))
            })
        }
    }

    fn client_with(transport: Arc<dyn Transport>) -> HttpClient {
        HttpClient::with_transport(ClientConfig::default(), transport).unwrap()
    }

    #[test]
    fn dispatch_returns_before_the_transport_finishes() {
        let transport = Arc::new(EchoTransport {
            delay: Duration::from_millis(300),
            ..Default::default()
        });
        let client = client_with(transport);

        let start = Instant::now();
        let future = client.get("http://localhost/slow");
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(future.state(), DeferredState::Pending);

        let response = future.result(Duration::from_secs(5)).unwrap();
        assert_eq!(response.text(), "GET http://localhost/slow");
    }

    #[test]
    fn each_handle_gets_its_own_response() {
        let client = client_with(Arc::new(EchoTransport::default()));
        let futures = client.dispatch_all(
            (0..16).map(|n| RequestDescriptor::get(format!("http://localhost/{}", n))),
        );
        for (n, future) in futures.iter().enumerate() {
            let response = future.result(Duration::from_secs(5)).unwrap();
            assert_eq!(response.text(), format!("GET http://localhost/{}", n));
        }
    }

    #[test]
    fn repeated_results_do_not_resend() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(transport.clone());

        let future = client.get("http://localhost/1");
        let first = future.result(Duration::from_secs(5)).unwrap();
        let second = future.result(Duration::from_secs(5)).unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_descriptor_fails_the_handle() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(transport.clone());

        let future = client.get("::not a url::");
        assert!(matches!(future.original_failure(), Some(Error::InvalidRequest(_))));
        assert!(matches!(
            future.result(Duration::from_millis(10)),
            Err(Error::InvalidRequest(_))
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn late_failure_is_observed_after_a_timed_out_wait() {
        let client = client_with(Arc::new(FailingTransport(Duration::from_millis(200))));
        let future = client.get("http://localhost/1");

        let err = future.result(Duration::from_millis(10)).unwrap_err();
        assert!(err.is_wait_timeout());
        assert!(future.original_failure().is_none());

        let err = future.result(Duration::from_secs(5)).unwrap_err();
        assert!(err.is_connect());
        assert!(future.original_failure().unwrap().is_connect());
    }

    #[test]
    fn deadline_is_an_operation_failure() {
        let transport = Arc::new(EchoTransport {
            delay: Duration::from_secs(5),
            ..Default::default()
        });
        let client = client_with(transport);

        let future = client.dispatch(
            RequestDescriptor::get("http://localhost/slow").timeout(Duration::from_millis(50)),
        );
        let err = future.result(Duration::from_secs(5)).unwrap_err();
        assert_eq!(err, Error::RequestTimeout(Duration::from_millis(50)));
        assert_eq!(future.original_failure(), Some(err));
    }

    #[test]
    fn handle_outlives_its_client() {
        let transport = Arc::new(EchoTransport {
            delay: Duration::from_millis(200),
            ..Default::default()
        });
        let future = {
            let client = client_with(transport.clone());
            client.get("http://localhost/1")
        };

        let response = future.result(Duration::from_secs(5)).unwrap();
        assert_eq!(response.text(), "GET http://localhost/1");
        assert!(future.original_failure().is_none());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn request_runs_after_client_and_handle_are_dropped() {
        let transport = Arc::new(EchoTransport {
            delay: Duration::from_millis(50),
            ..Default::default()
        });
        drop(client_with(transport.clone()).get("http://localhost/1"));

        let start = Instant::now();
        while transport.calls.load(Ordering::SeqCst) == 0 {
            assert!(start.elapsed() < Duration::from_secs(5), "request was never sent");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn borrowed_runtime_shutdown_cancels_pending_requests() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let transport = Arc::new(EchoTransport {
            delay: Duration::from_secs(30),
            ..Default::default()
        });
        let client =
            HttpClient::with_runtime_handle(ClientConfig::default(), transport, runtime.handle().clone()).unwrap();
        let future = client.get("http://localhost/never");
        drop(runtime);

        assert_eq!(future.result(Duration::from_secs(5)).unwrap_err(), Error::Cancelled);
        assert_eq!(future.original_failure(), Some(Error::Cancelled));
    }

    #[test]
    fn request_id_and_form_reach_the_transport() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(transport.clone());

        let future = client.post_form("http://localhost/double", [("number", 3)]);
        future.result(Duration::from_secs(5)).unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::Post);
        assert_eq!(&seen[0].body[..], b"number=3");
        assert_eq!(
            seen[0].headers[X_REQUEST_ID],
            future.request_id().to_string().as_str()
        );
    }

    #[test]
    fn runs_on_a_borrowed_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let client = HttpClient::with_runtime_handle(
            ClientConfig::default(),
            Arc::new(EchoTransport::default()),
            runtime.handle().clone(),
        )
        .unwrap();

        let response = client.get("http://localhost/1").result(Duration::from_secs(5)).unwrap();
        assert_eq!(response.text(), "GET http://localhost/1");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ClientConfig {
            transport: TransportConfig {
                connect_timeout_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = HttpClient::new(config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    /// Remembers every counter registered, with its labels.
    #[derive(Default)]
    struct CounterLog(Mutex<Vec<String>>);

    impl ::metrics::Recorder for CounterLog {
        fn describe_counter(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}
        fn describe_gauge(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}
        fn describe_histogram(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}

        fn register_counter(&self, key: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Counter {
            let labels: Vec<String> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
            self.0.lock().unwrap().push(format!("{} {}", key.name(), labels.join(",")));
            ::metrics::Counter::noop()
        }

        fn register_gauge(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Gauge {
            ::metrics::Gauge::noop()
        }

        fn register_histogram(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Histogram {
            ::metrics::Histogram::noop()
        }
    }

    #[test]
    fn rejected_request_is_counted() {
        let recorder = CounterLog::default();
        let client = client_with(Arc::new(EchoTransport::default()));

        let future = ::metrics::with_local_recorder(&recorder, || client.get("::not a url::"));
        assert!(matches!(future.original_failure(), Some(Error::InvalidRequest(_))));

        let counters = recorder.0.lock().unwrap();
        assert_eq!(
            counters.as_slice(),
            ["http_client_requests_total method=GET,transport=echo,outcome=invalid"]
        );
    }
}
