//! Completed responses.
//!
//! # Design Decisions
//! - The body is buffered; a response is produced once per completed request
//! - Any HTTP status is a successful operation; `error_for_status` opts in to
//!   treating 4xx/5xx as failures
//! - `Clone` is cheap (`Bytes`), so repeated `result` calls hand out copies

use std::borrow::Cow;

use bytes::Bytes;
use hyper::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// A buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    /// Build from transport-native parts. Non-UTF-8 header values are
    /// converted lossily.
    pub fn from_parts(status: u16, headers: &HeaderMap, body: Bytes) -> Self {
        let headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        Self::new(status, headers, body)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of the named header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text; invalid UTF-8 is replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Turn a 4xx/5xx response into `Error::Status`.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status >= 400 {
            return Err(Error::Status {
                status: self.status,
                body: self.text().into_owned(),
            });
        }
        Ok(self)
    }
}
