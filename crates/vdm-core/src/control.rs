//! Per-request cancellation.
//!
//! Every fetch registers an abort token here; the drain loop checks the
//! token between chunks and stops with `FetchError::Cancelled` when it is
//! set. A server shutting down can abort everything in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Cancellation flag handed to a running fetch.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Registry of in-flight fetch requests.
#[derive(Debug, Default)]
pub struct FetchControl {
    requests: RwLock<HashMap<u64, AbortToken>>,
    next_id: AtomicU64,
}

impl FetchControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request; returns its id and abort token.
    pub fn register(&self) -> (u64, AbortToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = AbortToken::default();
        self.requests
            .write()
            .expect("control lock poisoned")
            .insert(id, token.clone());
        (id, token)
    }

    /// Unregister a finished request (success or failure).
    pub fn unregister(&self, id: u64) {
        self.requests
            .write()
            .expect("control lock poisoned")
            .remove(&id);
    }

    /// Request cancellation of one in-flight fetch. Returns false when the
    /// id is unknown (already finished).
    pub fn abort(&self, id: u64) -> bool {
        match self
            .requests
            .read()
            .expect("control lock poisoned")
            .get(&id)
        {
            Some(token) => {
                token.abort();
                true
            }
            None => false,
        }
    }

    /// Abort everything in flight (shutdown path).
    pub fn abort_all(&self) {
        for token in self
            .requests
            .read()
            .expect("control lock poisoned")
            .values()
        {
            token.abort();
        }
    }

    /// Number of registered in-flight requests.
    pub fn in_flight(&self) -> usize {
        self.requests.read().expect("control lock poisoned").len()
    }
}
