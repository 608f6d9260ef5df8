//! Deterministic collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use geocache::{Coordinate, LookupError, RemoteCategoryLookup};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Lookup double that records every call and answers from a settable response.
///
/// With a gate, each fetch waits for a semaphore permit before answering, so
/// tests can hold requests in flight.
pub struct MockLookup {
    response: Mutex<Result<Vec<String>, String>>,
    calls: AtomicUsize,
    keys: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockLookup {
    pub fn returning(labels: &[&str]) -> Arc<Self> {
        Arc::new(Self::new(Ok(to_strings(labels)), None))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self::new(Err(message.to_string()), None))
    }

    /// Answers with `labels` once the returned semaphore receives a permit.
    pub fn gated(labels: &[&str]) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let lookup = Arc::new(Self::new(Ok(to_strings(labels)), Some(gate.clone())));
        (lookup, gate)
    }

    /// Fails with `message` once the returned semaphore receives a permit.
    pub fn gated_failing(message: &str) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let lookup = Arc::new(Self::new(Err(message.to_string()), Some(gate.clone())));
        (lookup, gate)
    }

    fn new(response: Result<Vec<String>, String>, gate: Option<Arc<Semaphore>>) -> Self {
        Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
            gate,
        }
    }

    pub fn respond_with(&self, labels: &[&str]) {
        *self.response.lock() = Ok(to_strings(labels));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().clone()
    }
}

#[async_trait]
impl RemoteCategoryLookup for MockLookup {
    async fn fetch(&self, query_key: &str) -> Result<Vec<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().push(query_key.to_string());

        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| LookupError::with_source("gate closed", e))?;
        }

        self.response.lock().clone().map_err(LookupError::new)
    }
}

pub fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
