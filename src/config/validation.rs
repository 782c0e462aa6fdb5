//! Configuration validation.
//!
//! Serde handles syntax; this pass checks values that parse but cannot work.
//! Every problem is reported, not just the first.

use hyper::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("runtime.worker_threads must be at least 1")]
    NoWorkerThreads,

    #[error("transport.connect_timeout_ms must be greater than 0")]
    ZeroConnectTimeout,

    #[error("transport.user_agent is not a valid header value")]
    InvalidUserAgent,

    #[error("default header '{0}' has an invalid name")]
    InvalidHeaderName(String),

    #[error("default header '{0}' has an invalid value")]
    InvalidHeaderValue(String),

    #[error("observability.log_level '{0}' is not a known level")]
    UnknownLogLevel(String),
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.runtime.worker_threads == 0 {
        errors.push(ValidationError::NoWorkerThreads);
    }
    if config.transport.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if HeaderValue::from_str(&config.transport.user_agent).is_err() {
        errors.push(ValidationError::InvalidUserAgent);
    }
    for (name, value) in &config.default_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        } else if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeaderValue(name.clone()));
        }
    }
    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn reports_all_errors() {
        let mut config = ClientConfig::default();
        config.runtime.worker_threads = 0;
        config.transport.connect_timeout_ms = 0;
        config.default_headers.insert("bad header".into(), "x".into());
        config.default_headers.insert("x-ok".into(), "line\nbreak".into());
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::NoWorkerThreads));
        assert!(errors.contains(&ValidationError::InvalidHeaderName("bad header".into())));
        assert!(errors.contains(&ValidationError::InvalidHeaderValue("x-ok".into())));
    }
}
