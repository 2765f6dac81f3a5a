// # DNS Backend Trait
//
// Defines the capability contract every DNS-update backend satisfies.
//
// ## Implementations
//
// - Cloudflare API: `dnsman-cloudflare` crate
// - DynDNS and No-IP update protocol: `dnsman-dyndns` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsman_core::{DnsBackend, RecordTarget};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let backend = /* DnsBackend implementation */;
//     let target = RecordTarget::new("host.example.com");
//
//     backend.update(&target, "203.0.113.5").await?;
//     assert_eq!(backend.resolve(&target).await?, "203.0.113.5");
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::{BackendConfig, RecordTarget};

/// Trait for DNS backend implementations
///
/// A backend knows how to push an address to one provider and how to ask
/// what that provider currently holds. Caching, dedup and deciding whether
/// a call is needed all belong to [`crate::DnsManager`].
///
/// Backends must not retry, sleep, spawn tasks or fall back to another
/// provider: a failed remote call is returned as an error and the caller
/// decides what happens next.
///
/// Addresses are passed as text and are not validated here; a backend may
/// reject input its provider would not accept.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    /// Set the target's record to `address`
    ///
    /// # Idempotency
    ///
    /// Calling this twice with the same arguments leaves the provider in the
    /// same state and is not an error.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::AuthorizationMissing`] if the credential is missing or rejected
    /// - [`crate::Error::AmbiguousRecord`] if the lookup matched more than one record
    /// - [`crate::Error::Backend`] for any other provider failure
    async fn update(&self, target: &RecordTarget, address: &str) -> Result<(), crate::Error>;

    /// The address the provider currently associates with the target
    ///
    /// # Errors
    ///
    /// - [`crate::Error::NotFound`] if no record exists
    /// - [`crate::Error::Backend`] if the lookup fails
    async fn resolve(&self, target: &RecordTarget) -> Result<String, crate::Error>;

    /// Backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}

/// Helper trait for constructing backends from configuration
///
/// Construction binds credentials but performs no network I/O.
pub trait DnsBackendFactory: Send + Sync {
    /// Create a DnsBackend instance from configuration
    fn create(&self, config: &BackendConfig) -> Result<Box<dyn DnsBackend>, crate::Error>;
}
