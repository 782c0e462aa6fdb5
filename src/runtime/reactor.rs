//! Background execution context.
//!
//! # Responsibilities
//! - Own (or borrow) the Tokio runtime the transports run on
//! - Spawn dispatched operations without blocking the caller
//! - Shut the owned runtime down once no client, handle or request uses it
//!
//! # Design Decisions
//! - Owned runtimes are multi-threaded so one slow endpoint cannot starve
//!   other in-flight requests
//! - The reactor is shared through `Arc` by clients, handles and spawned
//!   requests, so an owned runtime never drops a request before it finishes
//! - A borrowed handle is never shut down by the reactor; if its owner shuts
//!   it down, unfinished handles resolve to `Error::Cancelled`
//! - The last reference may be released on a worker thread, so shutdown
//!   never blocks

use std::future::Future;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};

/// The execution context shared by a client and its clones.
#[derive(Debug)]
pub struct Reactor {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl Reactor {
    /// Start an owned multi-thread runtime.
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name(config.thread_name.clone())
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(e.to_string()))?;

        tracing::debug!(
            worker_threads = config.worker_threads,
            thread_name = %config.thread_name,
            "Reactor started"
        );

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Run on a runtime owned by someone else.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            runtime: None,
        }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Whether dropping this reactor shuts a runtime down.
    pub fn is_owned(&self) -> bool {
        self.runtime.is_some()
    }

    /// Spawn a detached task. Returns immediately.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        drop(self.handle.spawn(fut));
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            tracing::debug!("Reactor shut down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn owned_reactor_runs_tasks() {
        let reactor = Reactor::new(&RuntimeConfig::default()).unwrap();
        assert!(reactor.is_owned());

        let (tx, rx) = mpsc::channel();
        reactor.spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let _ = tx.send(42);
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn worker_threads_are_named() {
        let config = RuntimeConfig {
            worker_threads: 1,
            thread_name: "reactor-test".to_string(),
        };
        let reactor = Reactor::new(&config).unwrap();

        let (tx, rx) = mpsc::channel();
        reactor.spawn(async move {
            let _ = tx.send(std::thread::current().name().map(str::to_string));
        });
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("reactor-test"));
    }

    #[test]
    fn borrowed_handle_is_not_owned() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let reactor = Reactor::from_handle(runtime.handle().clone());
        assert!(!reactor.is_owned());
    }
}
