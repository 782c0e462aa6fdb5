//! Shared test server for integration tests.
//!
//! Each test builds its own `ServerConfig`; nothing is registered globally.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Form, RawQuery, Request},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use deferred_http::config::{ClientConfig, TransportKind};

pub const ROUTE_1_RESPONSE: &str = "HEY BUDDY";
pub const ROUTE_2_RESPONSE: &str = "BYE BUDDY";

pub const SLOW_DELAY: Duration = Duration::from_secs(2);
pub const TIMEOUT: Duration = Duration::from_secs(1);

pub const TRANSPORTS: [TransportKind; 2] = [TransportKind::Hyper, TransportKind::Reqwest];

/// What a route does.
#[derive(Debug, Clone)]
pub enum Route {
    /// GET returning a fixed body.
    Text(String),
    /// POST reading form field `number`, responding with twice its value.
    Double,
    /// GET that answers with an empty body after a delay.
    Slow(Duration),
    /// GET echoing the raw query string.
    EchoQuery,
    /// GET echoing the value of a request header.
    EchoHeader(&'static str),
}

/// Route table for one server instance.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    routes: Vec<(String, Route)>,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The routes every suite expects: `/1`, `/2`, `/double`, `/slow_request`.
    pub fn standard() -> Self {
        Self::new()
            .route("/1", Route::Text(ROUTE_1_RESPONSE.into()))
            .route("/2", Route::Text(ROUTE_2_RESPONSE.into()))
            .route("/double", Route::Double)
            .route("/slow_request", Route::Slow(SLOW_DELAY))
            .route("/echo", Route::EchoQuery)
            .route("/request-id", Route::EchoHeader("x-request-id"))
    }

    pub fn route(mut self, path: &str, route: Route) -> Self {
        self.routes.push((path.to_string(), route));
        self
    }

    fn router(&self) -> Router {
        let mut router = Router::new();
        for (path, route) in &self.routes {
            router = match route.clone() {
                Route::Text(body) => router.route(
                    path,
                    get(move || {
                        let body = body.clone();
                        async move { body }
                    }),
                ),
                Route::Double => router.route(path, post(double)),
                Route::Slow(delay) => router.route(
                    path,
                    get(move || async move {
                        tokio::time::sleep(delay).await;
                        String::new()
                    }),
                ),
                Route::EchoQuery => {
                    router.route(path, get(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }))
                }
                Route::EchoHeader(name) => router.route(
                    path,
                    get(move |headers: HeaderMap| async move {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string()
                    }),
                ),
            };
        }
        router
    }
}

async fn double(Form(form): Form<HashMap<String, String>>) -> Result<String, StatusCode> {
    let number: i64 = form
        .get("number")
        .and_then(|n| n.parse().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    Ok((number * 2).to_string())
}

/// A running server on an ephemeral port, serving from its own thread.
pub struct TestServer {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn start(config: ServerConfig) -> Self {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = config
            .router()
            .layer(middleware::from_fn(move |request: Request, next: Next| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    next.run(request).await
                }
            }))
            .layer(TraceLayer::new_for_http());

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                axum::serve(listener, app).await
            })
            .unwrap();
        });

        Self { addr, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Requests received so far, across all routes.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// An address nothing is listening on.
pub fn refused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub fn config_for(kind: TransportKind) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.transport.kind = kind;
    config.transport.connect_timeout_ms = 1_000;
    config.observability.metrics_enabled = false;
    config
}
