//! hyper-util backend.

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::http::{PreparedRequest, Response};
use crate::transport::{error_chain, Transport};

/// Transport over the hyper-util legacy pooled client. Plain HTTP only.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.connect_timeout()));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build(connector);

        Self { client }
    }
}

impl Transport for HyperTransport {
    fn name(&self) -> &'static str {
        "hyper"
    }

    fn send(&self, request: PreparedRequest) -> BoxFuture<'static, Result<Response>> {
        let client = self.client.clone();
        Box::pin(async move {
            let mut builder = hyper::Request::builder()
                .method(hyper::Method::from(request.method))
                .uri(request.url.as_str());
            if let Some(headers) = builder.headers_mut() {
                headers.extend(request.headers);
            }
            let req = builder
                .body(Full::new(request.body))
                .map_err(|e| Error::InvalidRequest(e.to_string()))?;

            let response = client.request(req).await.map_err(|e| {
                if e.is_connect() {
                    Error::Connect(error_chain(&e))
                } else {
                    Error::Transport(error_chain(&e))
                }
            })?;

            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| Error::Body(error_chain(&e)))?
                .to_bytes();

            Ok(Response::from_parts(parts.status.as_u16(), &parts.headers, body))
        })
    }
}
