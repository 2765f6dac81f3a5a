//! DNS manager
//!
//! The DnsManager is responsible for:
//! - Holding the one backend selected at construction
//! - Remembering the last address pushed for each hostname
//! - Skipping backend calls the cache proves unnecessary
//!
//! ## Update Flow
//!
//! ```text
//!  update_hostname(target, address)
//!           │
//!           ▼
//!   ┌────────────────┐   hit    ┌──────────────┐
//!   │  last-pushed   │────────▶ │    Cached    │
//!   │     cache      │          └──────────────┘
//!   └────────────────┘
//!           │ miss / different address
//!           ▼
//!   ┌────────────────┐   err    ┌──────────────┐
//!   │  DnsBackend    │────────▶ │ UpdateFailed │  (cache untouched)
//!   │   ::update     │          └──────────────┘
//!   └────────────────┘
//!           │ ok
//!           ▼
//!   cache[name] = address ───▶ Pushed
//! ```
//!
//! ## Verification
//!
//! [`DnsManager::is_hostname_current`] trusts the cache first and only asks
//! the backend when the cache has no matching entry. A record changed
//! out-of-band after a successful update is therefore still reported as
//! current until the manager pushes a different address.

use crate::config::RecordTarget;
use crate::error::{Error, Result};
use crate::traits::DnsBackend;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Result of [`DnsManager::update_hostname`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The cache already held this address; the backend was not called
    Cached,
    /// The backend confirmed the update and the cache was refreshed
    Pushed,
}

/// Backend plus last-pushed cache
///
/// ## Threading
///
/// Updates take `&mut self`; a manager shared between tasks needs an
/// external lock. The cache is never persisted and never evicted.
pub struct DnsManager {
    /// Backend selected at construction
    backend: Box<dyn DnsBackend>,

    /// hostname -> last address confirmed pushed through this manager
    last_pushed: HashMap<String, String>,
}

impl DnsManager {
    /// Create a manager around `backend` with an empty cache
    pub fn new(backend: Box<dyn DnsBackend>) -> Self {
        Self {
            backend,
            last_pushed: HashMap::new(),
        }
    }

    /// Point the target's record at `address`, unless this manager already did
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateOutcome::Cached)`: the cache already maps the hostname to `address`
    /// - `Ok(UpdateOutcome::Pushed)`: the backend accepted the update
    /// - `Err(Error::UpdateFailed)`: the backend failed; the cache is unchanged
    pub async fn update_hostname(&mut self, target: &RecordTarget, address: &str) -> Result<UpdateOutcome> {
        if self.is_cached(&target.name, address) {
            debug!("{} already set to {}, skipping update", target.name, address);
            return Ok(UpdateOutcome::Cached);
        }

        if let Err(e) = self.backend.update(target, address).await {
            warn!(
                "Update of {} to {} via {} failed: {}",
                target.name,
                address,
                self.backend.backend_name(),
                e
            );
            return Err(Error::update_failed(&target.name, e));
        }

        let previous = self
            .last_pushed
            .insert(target.name.clone(), address.to_string());
        info!(
            "Updated {} -> {} via {} (previous: {:?})",
            target.name,
            address,
            self.backend.backend_name(),
            previous
        );

        Ok(UpdateOutcome::Pushed)
    }

    /// Check whether the target already points at `address`
    ///
    /// A matching cache entry answers `true` without a remote call.
    /// Otherwise the backend resolves the record and the result is compared
    /// with `address`. The cache is never written here.
    pub async fn is_hostname_current(&self, target: &RecordTarget, address: &str) -> Result<bool> {
        if self.is_cached(&target.name, address) {
            debug!("{} cached as {}", target.name, address);
            return Ok(true);
        }

        let resolved = self
            .backend
            .resolve(target)
            .await
            .map_err(|e| Error::resolve_failed(&target.name, e))?;

        debug!("{} resolves to {} via {}", target.name, resolved, self.backend.backend_name());
        Ok(resolved == address)
    }

    /// Last address pushed for `hostname`, if any
    pub fn cached_address(&self, hostname: &str) -> Option<&str> {
        self.last_pushed.get(hostname).map(String::as_str)
    }

    /// Name of the underlying backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    fn is_cached(&self, hostname: &str, address: &str) -> bool {
        self.last_pushed
            .get(hostname)
            .is_some_and(|cached| cached == address)
    }
}

impl std::fmt::Debug for DnsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsManager")
            .field("backend", &self.backend.backend_name())
            .field("last_pushed", &self.last_pushed)
            .finish()
    }
}
