//! Request description and preparation.
//!
//! # Responsibilities
//! - Describe a request as plain data (`RequestDescriptor`)
//! - Accept the loose submission shape `{method, headers, url, params, data}`
//! - Encode query params, form data and bodies into a `PreparedRequest`
//! - Merge default headers and the request ID
//!
//! # Design Decisions
//! - Preparation is pure CPU work so `dispatch` never blocks on it
//! - Caller headers override defaults; content type is only set when absent
//! - Exactly one body source (form data, JSON or raw) per request

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Err(Error::InvalidRequest(format!("unsupported method '{}'", other))),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl From<Method> for hyper::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => hyper::Method::GET,
            Method::Post => hyper::Method::POST,
            Method::Put => hyper::Method::PUT,
            Method::Patch => hyper::Method::PATCH,
            Method::Delete => hyper::Method::DELETE,
            Method::Head => hyper::Method::HEAD,
            Method::Options => hyper::Method::OPTIONS,
        }
    }
}

/// A request described as plain data.
///
/// Deserializes from `{method, url, headers, params, data}`; scalar values in
/// `params` and `data` are stringified, so `{"number": 3}` sends `number=3`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestDescriptor {
    #[serde(default)]
    pub method: Method,

    pub url: String,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Appended to the URL query.
    #[serde(default, deserialize_with = "scalar_map")]
    pub params: BTreeMap<String, String>,

    /// Sent as an `application/x-www-form-urlencoded` body.
    #[serde(default, deserialize_with = "scalar_map")]
    pub data: BTreeMap<String, String>,

    /// Sent as an `application/json` body.
    #[serde(default)]
    pub json: Option<serde_json::Value>,

    /// Sent verbatim.
    #[serde(default)]
    pub body: Option<String>,

    /// Content type for `body`; defaults to plain text.
    #[serde(default)]
    pub content_type: Option<String>,

    /// Deadline for the operation itself, in seconds when deserialized.
    #[serde(default, deserialize_with = "optional_secs")]
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn form(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(name.into(), value.to_string());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::InvalidRequest(format!("JSON body: {}", e)))?;
        self.json = Some(value);
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate and encode into the form a transport consumes.
    pub fn prepare(self, defaults: &RequestDefaults, request_id: Uuid) -> Result<PreparedRequest> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| Error::InvalidRequest(format!("invalid URL '{}': {}", self.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidRequest(format!("unsupported scheme '{}'", url.scheme())));
        }
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }

        let sources = usize::from(!self.data.is_empty())
            + usize::from(self.json.is_some())
            + usize::from(self.body.is_some());
        if sources > 1 {
            return Err(Error::InvalidRequest(
                "only one of data, json or body may be set".to_string(),
            ));
        }

        let (body, content_type) = if !self.data.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.data.iter())
                .finish();
            (Bytes::from(encoded), Some("application/x-www-form-urlencoded".to_string()))
        } else if let Some(json) = &self.json {
            let encoded = serde_json::to_vec(json)
                .map_err(|e| Error::InvalidRequest(format!("JSON body: {}", e)))?;
            (Bytes::from(encoded), Some("application/json".to_string()))
        } else if let Some(body) = self.body {
            let content_type = self
                .content_type
                .unwrap_or_else(|| "text/plain; charset=utf-8".to_string());
            (Bytes::from(body), Some(content_type))
        } else {
            (Bytes::new(), None)
        };

        let mut headers = defaults.headers.clone();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidRequest(format!("invalid header name '{}'", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidRequest(format!("invalid value for header '{}'", name)))?;
            headers.insert(name, value);
        }
        if let Some(content_type) = content_type {
            if !headers.contains_key(header::CONTENT_TYPE) {
                let value = HeaderValue::from_str(&content_type)
                    .map_err(|_| Error::InvalidRequest("invalid content type".to_string()))?;
                headers.insert(header::CONTENT_TYPE, value);
            }
        }
        if defaults.propagate_request_id {
            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                headers.insert(HeaderName::from_static(X_REQUEST_ID), value);
            }
        }

        Ok(PreparedRequest {
            method: self.method,
            url,
            headers,
            body,
            deadline: self.timeout.or(defaults.request_timeout),
            request_id,
        })
    }
}

/// Settings applied to every request a client prepares.
#[derive(Debug, Clone, Default)]
pub struct RequestDefaults {
    pub headers: HeaderMap,
    pub request_timeout: Option<Duration>,
    pub propagate_request_id: bool,
}

impl RequestDefaults {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.transport.user_agent)
            .map_err(|_| Error::InvalidRequest("invalid user agent".to_string()))?;
        headers.insert(header::USER_AGENT, user_agent);
        for (name, value) in &config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidRequest(format!("invalid header name '{}'", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidRequest(format!("invalid value for header '{}'", name)))?;
            headers.insert(name, value);
        }
        Ok(Self {
            headers,
            request_timeout: config.transport.request_timeout(),
            propagate_request_id: config.transport.propagate_request_id,
        })
    }
}

/// A validated request ready for a transport.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Deadline for the whole operation, if any.
    pub deadline: Option<Duration>,
    pub request_id: Uuid,
}

fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    use serde_json::Value;

    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(D::Error::custom(format!(
                        "value for '{}' must be a scalar, got {}",
                        key, other
                    )))
                }
            };
            Ok((key, value))
        })
        .collect()
}

fn optional_secs<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid timeout {}: {}", secs, e))),
    }
}
