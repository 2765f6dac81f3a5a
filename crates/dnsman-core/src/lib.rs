// # dnsman-core
//
// Core library for keeping DNS records pointed at the caller's public
// address.
//
// ## Architecture Overview
//
// - **DnsBackend**: Trait for pushing and resolving records at one provider
// - **PublicAddressLookup**: Trait for discovering the caller's public address
// - **DnsManager**: Backend plus last-pushed cache; skips redundant remote calls
// - **BackendRegistry**: Builds a DnsManager from a backend selector
// - **sync**: One refresh or check pass over a list of records
//
// ## Design Principles
//
// 1. **One contract**: Every backend exposes the same update/resolve pair
// 2. **Composition**: The manager wraps a backend, it never extends one
// 3. **No speculation**: The cache only records updates a backend confirmed
// 4. **Caller-driven**: No background tasks, retries or scheduling in the core

pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
pub mod sync;
pub mod traits;

// Re-export core types for convenience
pub use config::{BackendConfig, BackendKind, DnsmanConfig, IpLookupConfig, IpVersion, RecordTarget};
pub use error::{Error, Result};
pub use manager::{DnsManager, UpdateOutcome};
pub use registry::BackendRegistry;
pub use traits::{DnsBackend, DnsBackendFactory, PublicAddressLookup, get_public_address};
