//! Backend registry and manager factory
//!
//! Backend crates depend on `dnsman-core`, so the core cannot construct
//! them directly. Each backend crate registers a factory per
//! [`BackendKind`] it implements and the registry turns a selector into a
//! ready [`DnsManager`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnsman_core::{BackendConfig, BackendRegistry};
//!
//! let registry = BackendRegistry::new();
//! dnsman_cloudflare::register(&registry);
//! dnsman_dyndns::register(&registry);
//!
//! let manager = registry.create_manager_by_name(
//!     "cloudflare",
//!     &BackendConfig::with_api_token(token),
//! )?;
//! ```

use crate::config::{BackendConfig, BackendKind};
use crate::error::{Error, Result};
use crate::manager::DnsManager;
use crate::traits::DnsBackendFactory;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of backend factories keyed by [`BackendKind`]
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct BackendRegistry {
    backends: RwLock<HashMap<BackendKind, Box<dyn DnsBackendFactory>>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `kind`, replacing any previous one
    pub fn register_backend(&self, kind: BackendKind, factory: Box<dyn DnsBackendFactory>) {
        let mut backends = self.backends.write().unwrap_or_else(PoisonError::into_inner);
        backends.insert(kind, factory);
    }

    /// Construct a manager for `kind`
    ///
    /// # Returns
    ///
    /// - `Ok(DnsManager)`: manager with an empty cache
    /// - `Err(Error::InvalidBackendKind)`: no factory registered for `kind`
    /// - `Err(Error)`: the backend factory rejected `config`
    pub fn create_manager(&self, kind: BackendKind, config: &BackendConfig) -> Result<DnsManager> {
        let backends = self.backends.read().unwrap_or_else(PoisonError::into_inner);

        let factory = backends.get(&kind).ok_or_else(|| {
            Error::invalid_backend_kind(format!("{} (not registered)", kind))
        })?;

        let backend = factory.create(config)?;
        tracing::debug!("Created {} backend", backend.backend_name());

        Ok(DnsManager::new(backend))
    }

    /// Parse `selector` and construct a manager for it
    ///
    /// An unknown selector fails with [`Error::InvalidBackendKind`] before
    /// any factory runs.
    pub fn create_manager_by_name(&self, selector: &str, config: &BackendConfig) -> Result<DnsManager> {
        let kind: BackendKind = selector.parse()?;
        self.create_manager(kind, config)
    }

    /// Check if a backend kind is registered
    pub fn has_backend(&self, kind: BackendKind) -> bool {
        let backends = self.backends.read().unwrap_or_else(PoisonError::into_inner);
        backends.contains_key(&kind)
    }

    /// List all registered backend kinds
    pub fn list_backends(&self) -> Vec<BackendKind> {
        let backends = self.backends.read().unwrap_or_else(PoisonError::into_inner);
        backends.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingFactory;

    impl DnsBackendFactory for FailingFactory {
        fn create(&self, _config: &BackendConfig) -> Result<Box<dyn crate::DnsBackend>> {
            Err(Error::auth("no credential"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = BackendRegistry::new();

        assert!(!registry.has_backend(BackendKind::NoIp));

        registry.register_backend(BackendKind::NoIp, Box::new(FailingFactory));

        assert!(registry.has_backend(BackendKind::NoIp));
        assert_eq!(registry.list_backends(), vec![BackendKind::NoIp]);
    }

    #[test]
    fn test_unregistered_kind_is_invalid() {
        let registry = BackendRegistry::new();
        let err = registry
            .create_manager(BackendKind::Cloudflare, &BackendConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBackendKind(_)));
    }

    #[test]
    fn test_factory_error_propagates() {
        let registry = BackendRegistry::new();
        registry.register_backend(BackendKind::DynDns, Box::new(FailingFactory));

        let err = registry
            .create_manager(BackendKind::DynDns, &BackendConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::AuthorizationMissing(_)));
    }
}
