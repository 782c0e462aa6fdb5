//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for the HTTP client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Transport backend settings.
    pub transport: TransportConfig,

    /// Background execution context settings.
    pub runtime: RuntimeConfig,

    /// Headers added to every request unless the request sets them itself.
    pub default_headers: BTreeMap<String, String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Which transport engine performs the network I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// hyper-util legacy client.
    #[default]
    Hyper,
    /// reqwest client.
    Reqwest,
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hyper" => Ok(TransportKind::Hyper),
            "reqwest" => Ok(TransportKind::Reqwest),
            other => Err(format!("unknown transport '{}'", other)),
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Backend selection.
    pub kind: TransportKind,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Deadline for the whole operation in milliseconds. 0 disables it.
    pub request_timeout_ms: u64,

    /// Idle connections kept per host.
    pub pool_max_idle_per_host: usize,

    /// User-Agent header value.
    pub user_agent: String,

    /// Attach `x-request-id` to outgoing requests.
    pub propagate_request_id: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Hyper,
            connect_timeout_ms: 5_000,
            request_timeout_ms: 0,
            pool_max_idle_per_host: 8,
            user_agent: concat!("deferred-http/", env!("CARGO_PKG_VERSION")).to_string(),
            propagate_request_id: true,
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// `None` when no operation deadline is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Execution context configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads of the owned runtime.
    pub worker_threads: usize,

    /// Name given to the worker threads.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            thread_name: "deferred-http-worker".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Record request metrics through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
