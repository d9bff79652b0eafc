//! In-memory provider shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use download_bucket::error::ProviderError;
use download_bucket::providers::{Object, ObjectReader, Provider, ProviderResult};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::io::DuplexStream;

#[derive(Default)]
pub struct MemoryProvider {
    listing: Vec<Object>,
    bodies: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    stalled: HashSet<String>,
    list_failure: bool,
    fetched: Mutex<Vec<String>>,
    // Write halves of stalled bodies; held so their readers never see EOF.
    open_streams: Mutex<Vec<DuplexStream>>,
    closed: AtomicBool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object whose listed size matches its body.
    pub fn with_object(self, key: &str, body: &[u8]) -> Self {
        self.with_declared_size(key, body, body.len() as u64)
    }

    /// Object listed with `size` while serving `body`.
    pub fn with_declared_size(mut self, key: &str, body: &[u8], size: u64) -> Self {
        self.listing.push(Object::new(key, size));
        self.bodies.insert(key.to_string(), body.to_vec());
        self
    }

    pub fn with_marker(mut self, key: &str) -> Self {
        self.listing.push(Object::new(key, 0));
        self
    }

    /// Opening `key` fails.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// `key` opens but its body never produces data or EOF.
    pub fn stalled(mut self, key: &str) -> Self {
        self.stalled.insert(key.to_string());
        self
    }

    pub fn list_failure(mut self) -> Self {
        self.list_failure = true;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_objects(&self, prefix: &str) -> ProviderResult<Vec<Object>> {
        if self.list_failure {
            return Err(ProviderError::List {
                prefix: prefix.to_string(),
                message: "access denied".to_string(),
            });
        }
        Ok(self.listing.clone())
    }

    async fn download_object(&self, key: &str) -> ProviderResult<ObjectReader> {
        self.fetched.lock().unwrap().push(key.to_string());

        if self.failing.contains(key) {
            return Err(ProviderError::Fetch {
                key: key.to_string(),
                message: "simulated transport failure".to_string(),
            });
        }
        if self.stalled.contains(key) {
            let (writer, reader) = tokio::io::duplex(64);
            self.open_streams.lock().unwrap().push(writer);
            return Ok(Box::new(reader));
        }

        let body = self.bodies.get(key).cloned().unwrap_or_default();
        Ok(Box::new(Cursor::new(body)))
    }

    async fn object_info(&self, key: &str) -> ProviderResult<Object> {
        self.listing
            .iter()
            .find(|o| o.key == key)
            .cloned()
            .ok_or_else(|| ProviderError::Head {
                key: key.to_string(),
                message: "not found".to_string(),
            })
    }

    async fn close(&self) -> ProviderResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
