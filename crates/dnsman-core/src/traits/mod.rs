//! Core traits for dnsman
//!
//! - [`DnsBackend`]: Push and resolve records at one DNS provider
//! - [`PublicAddressLookup`]: Discover the caller's public address

pub mod address_lookup;
pub mod backend;

pub use address_lookup::{PublicAddressLookup, get_public_address};
pub use backend::{DnsBackend, DnsBackendFactory};
