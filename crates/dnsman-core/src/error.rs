//! Error types for dnsman
//!
//! Every failure surfaced by a backend, the manager or the factory is one of
//! these variants. Manager operations wrap backend failures with the
//! operation and hostname they belong to.

use thiserror::Error;

/// Result type alias for dnsman operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dnsman
#[derive(Error, Debug)]
pub enum Error {
    /// Selector outside the supported backend enumeration
    #[error("invalid DNS manager backend: {0}")]
    InvalidBackendKind(String),

    /// Backend has no valid credential
    #[error("not authorized: {0}")]
    AuthorizationMissing(String),

    /// More than one remote record matched a single target
    #[error("found {count} matching records for {name}")]
    AmbiguousRecord {
        /// Record name that was looked up
        name: String,
        /// Number of matches returned by the backend
        count: usize,
    },

    /// Remote call failed or returned an unexpected shape
    #[error("backend error ({backend}): {message}")]
    Backend {
        /// Backend name
        backend: String,
        /// Provider error detail
        message: String,
    },

    /// `DnsManager::update_hostname` failed in the backend
    #[error("update failed for {hostname}: {source}")]
    UpdateFailed {
        hostname: String,
        #[source]
        source: Box<Error>,
    },

    /// `DnsManager::is_hostname_current` could not resolve the hostname
    #[error("resolve failed for {hostname}: {source}")]
    ResolveFailed {
        hostname: String,
        #[source]
        source: Box<Error>,
    },

    /// Record or zone not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Public address could not be determined
    #[error("cannot retrieve public address: {0}")]
    PublicAddress(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// System resolver failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid backend kind error
    pub fn invalid_backend_kind(selector: impl Into<String>) -> Self {
        Self::InvalidBackendKind(selector.into())
    }

    /// Create an authorization error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthorizationMissing(msg.into())
    }

    /// Create an ambiguous record error
    pub fn ambiguous(name: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousRecord {
            name: name.into(),
            count,
        }
    }

    /// Create a backend-specific error
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Wrap a backend failure raised while updating `hostname`
    pub fn update_failed(hostname: impl Into<String>, source: Error) -> Self {
        Self::UpdateFailed {
            hostname: hostname.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a backend failure raised while resolving `hostname`
    pub fn resolve_failed(hostname: impl Into<String>, source: Error) -> Self {
        Self::ResolveFailed {
            hostname: hostname.into(),
            source: Box::new(source),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a public address lookup error
    pub fn public_address(msg: impl Into<String>) -> Self {
        Self::PublicAddress(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// The innermost error, skipping `UpdateFailed`/`ResolveFailed` wrappers
    pub fn root(&self) -> &Error {
        match self {
            Self::UpdateFailed { source, .. } | Self::ResolveFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
