// # Public Address Lookup Trait
//
// Defines how the caller's externally-visible address is obtained.
//
// ## Implementations
//
// - HTTP echo services: `dnsman-ip-http` crate

use async_trait::async_trait;

/// Source of the caller's current public address
///
/// Implementations return the address as text. Any error is fatal to the
/// update attempt that asked for it.
#[async_trait]
pub trait PublicAddressLookup: Send + Sync {
    /// Fetch the current public address
    async fn public_address(&self) -> Result<String, crate::Error>;
}

/// Fetch the public address, wrapping any failure as [`crate::Error::PublicAddress`]
pub async fn get_public_address(lookup: &dyn PublicAddressLookup) -> Result<String, crate::Error> {
    match lookup.public_address().await {
        Ok(address) => {
            tracing::debug!("Public address: {}", address);
            Ok(address)
        }
        Err(crate::Error::PublicAddress(msg)) => Err(crate::Error::PublicAddress(msg)),
        Err(e) => Err(crate::Error::public_address(e.to_string())),
    }
}
