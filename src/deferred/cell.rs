//! One-shot result cell with blocking, timed observation.
//!
//! # State Transitions
//! ```text
//! Pending → Succeeded(T)   Resolver::resolve(Ok(..))
//! Pending → Failed(Error)  Resolver::resolve(Err(..)) or Resolver dropped
//! ```
//!
//! A terminal state is set at most once: `resolve` consumes the resolver and
//! there is exactly one resolver per cell. Waiting never changes the state,
//! so an expired wait leaves `original_failure` untouched.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{Error, Result, TimeoutError};

/// Snapshot of a cell's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug)]
enum Slot<T> {
    Pending,
    Succeeded(T),
    Failed(Error),
}

#[derive(Debug)]
struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    // A poisoned lock only means a waiter panicked; the slot is still
    // consistent because every write is a single assignment.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read side of the cell. Cheap to clone; every clone observes the same
/// operation.
#[derive(Debug)]
pub struct Deferred<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Write side of the cell, owned by whoever performs the operation.
#[derive(Debug)]
pub struct Resolver<T> {
    shared: Option<Arc<Shared<T>>>,
}

/// Create a connected pending cell and its resolver.
pub fn deferred<T>() -> (Deferred<T>, Resolver<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Pending),
        ready: Condvar::new(),
    });
    (
        Deferred {
            shared: Arc::clone(&shared),
        },
        Resolver {
            shared: Some(shared),
        },
    )
}

impl<T: Clone> Deferred<T> {
    /// A cell that is already terminal.
    pub fn ready(outcome: Result<T>) -> Self {
        let (deferred, resolver) = deferred();
        resolver.resolve(outcome);
        deferred
    }

    /// Block up to `timeout` for the terminal state.
    ///
    /// Returns the value or the operation's own error once terminal. If the
    /// timeout elapses first, returns `Error::Timeout` and records nothing.
    pub fn result(&self, timeout: Duration) -> Result<T> {
        let guard = self.shared.lock();
        let (guard, _) = self
            .shared
            .ready
            .wait_timeout_while(guard, timeout, |slot| matches!(slot, Slot::Pending))
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &*guard {
            Slot::Pending => Err(TimeoutError { waited: timeout }.into()),
            Slot::Succeeded(value) => Ok(value.clone()),
            Slot::Failed(error) => Err(error.clone()),
        }
    }

    /// Block until the terminal state, however long that takes.
    pub fn wait(&self) -> Result<T> {
        let guard = self.shared.lock();
        let guard = self
            .shared
            .ready
            .wait_while(guard, |slot| matches!(slot, Slot::Pending))
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &*guard {
            Slot::Pending => unreachable!("wait_while returned while pending"),
            Slot::Succeeded(value) => Ok(value.clone()),
            Slot::Failed(error) => Err(error.clone()),
        }
    }

    /// Non-blocking observation; `None` while pending.
    pub fn try_result(&self) -> Option<Result<T>> {
        match &*self.shared.lock() {
            Slot::Pending => None,
            Slot::Succeeded(value) => Some(Ok(value.clone())),
            Slot::Failed(error) => Some(Err(error.clone())),
        }
    }
}

impl<T> Deferred<T> {
    /// The failure of the operation itself. `None` while pending, on
    /// success, and after any number of expired waits.
    pub fn original_failure(&self) -> Option<Error> {
        match &*self.shared.lock() {
            Slot::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> DeferredState {
        match &*self.shared.lock() {
            Slot::Pending => DeferredState::Pending,
            Slot::Succeeded(_) => DeferredState::Succeeded,
            Slot::Failed(_) => DeferredState::Failed,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state() != DeferredState::Pending
    }
}

impl<T> Resolver<T> {
    /// Move the cell to its terminal state and wake every waiter.
    pub fn resolve(mut self, outcome: Result<T>) {
        if let Some(shared) = self.shared.take() {
            settle(&shared, outcome);
        }
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            settle(&shared, Err(Error::Cancelled));
        }
    }
}

fn settle<T>(shared: &Shared<T>, outcome: Result<T>) {
    let mut slot = shared.lock();
    if matches!(*slot, Slot::Pending) {
        *slot = match outcome {
            Ok(value) => Slot::Succeeded(value),
            Err(error) => Slot::Failed(error),
        };
    }
    drop(slot);
    shared.ready.notify_all();
}

/// Measure how long an observation took; used by callers that log waits.
pub(crate) fn timed<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}
