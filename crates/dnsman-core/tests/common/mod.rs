//! Test doubles shared by the manager contract tests
//!
//! The doubles count calls and keep a fake "remote" record table so tests
//! can tell cached answers apart from backend answers.

#![allow(dead_code)]

use dnsman_core::config::{BackendConfig, RecordTarget};
use dnsman_core::error::{Error, Result};
use dnsman_core::traits::{DnsBackend, DnsBackendFactory, PublicAddressLookup};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A DnsBackend that records calls and serves a fake remote table
#[derive(Clone, Default)]
pub struct MockBackend {
    update_calls: Arc<AtomicUsize>,
    resolve_calls: Arc<AtomicUsize>,
    fail_updates: Arc<AtomicBool>,
    fail_resolves: Arc<AtomicBool>,
    remote: Arc<Mutex<HashMap<String, String>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A second handle sharing counters and remote table with this one
    ///
    /// The manager takes ownership of one handle, the test keeps the other.
    pub fn handle(&self) -> Self {
        self.clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_call_count(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_resolves(&self, fail: bool) {
        self.fail_resolves.store(fail, Ordering::SeqCst);
    }

    /// Change a record behind the manager's back
    pub fn set_remote(&self, name: &str, address: &str) {
        self.remote
            .lock()
            .unwrap()
            .insert(name.to_string(), address.to_string());
    }

    pub fn remote(&self, name: &str) -> Option<String> {
        self.remote.lock().unwrap().get(name).cloned()
    }
}

#[async_trait::async_trait]
impl DnsBackend for MockBackend {
    async fn update(&self, target: &RecordTarget, address: &str) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::backend("mock", "update rejected"));
        }

        self.set_remote(&target.name, address);
        Ok(())
    }

    async fn resolve(&self, target: &RecordTarget) -> Result<String> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_resolves.load(Ordering::SeqCst) {
            return Err(Error::backend("mock", "lookup failed"));
        }

        self.remote(&target.name)
            .ok_or_else(|| Error::not_found(target.name.clone()))
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

/// Factory handing out MockBackend handles and counting constructions
#[derive(Clone, Default)]
pub struct MockFactory {
    pub backend: MockBackend,
    create_calls: Arc<AtomicUsize>,
}

impl MockFactory {
    pub fn new(backend: &MockBackend) -> Self {
        Self {
            backend: backend.handle(),
            create_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl DnsBackendFactory for MockFactory {
    fn create(&self, _config: &BackendConfig) -> Result<Box<dyn DnsBackend>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.backend.handle()))
    }
}

/// A lookup that always answers with a fixed address, or always fails
pub struct StaticLookup {
    address: Option<String>,
    calls: AtomicUsize,
}

impl StaticLookup {
    pub fn new(address: &str) -> Self {
        Self {
            address: Some(address.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            address: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PublicAddressLookup for StaticLookup {
    async fn public_address(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.address
            .clone()
            .ok_or_else(|| Error::http("connection refused"))
    }
}

pub const HOST: &str = "host.example.com";
pub const ADDR_1: &str = "203.0.113.5";
pub const ADDR_2: &str = "203.0.113.77";

pub fn host() -> RecordTarget {
    RecordTarget::new(HOST)
}
