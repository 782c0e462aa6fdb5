//! reqwest backend.

use futures_util::future::BoxFuture;

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::http::{PreparedRequest, Response};
use crate::transport::{error_chain, Transport};

/// Transport over `reqwest::Client`. System proxies are ignored.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .no_proxy()
            .build()
            .map_err(|e| Error::Runtime(error_chain(&e)))?;
        Ok(Self { client })
    }
}

fn classify(error: reqwest::Error) -> Error {
    let message = error_chain(&error);
    if error.is_connect() {
        Error::Connect(message)
    } else if error.is_builder() {
        Error::InvalidRequest(message)
    } else if error.is_body() || error.is_decode() {
        Error::Body(message)
    } else {
        Error::Transport(message)
    }
}

impl Transport for ReqwestTransport {
    fn name(&self) -> &'static str {
        "reqwest"
    }

    fn send(&self, request: PreparedRequest) -> BoxFuture<'static, Result<Response>> {
        let client = self.client.clone();
        Box::pin(async move {
            let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
                .map_err(|e| Error::InvalidRequest(e.to_string()))?;

            let mut builder = client.request(method, request.url);
            for (name, value) in request.headers.iter() {
                builder = builder.header(name.as_str(), value.as_bytes());
            }
            if !request.body.is_empty() {
                builder = builder.body(request.body);
            }

            let response = builder.send().await.map_err(classify)?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::Body(error_chain(&e)))?;

            Ok(Response::new(status, headers, body))
        })
    }
}
