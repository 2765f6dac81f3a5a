//! Configuration types for dnsman
//!
//! This module defines the record targets, the backend selector and the
//! settings each backend variant is built from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Default HTTP timeout for backend and lookup requests (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default public-address services, tried in order
pub const DEFAULT_IP_LOOKUP_URLS: &[&str] = &[
    "https://api.ipify.org",
    "https://ifconfig.me/ip",
    "https://icanhazip.com",
];

/// Main dnsman configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsmanConfig {
    /// Backend variant to drive
    pub backend: BackendKind,

    /// Settings handed to the backend factory
    #[serde(default)]
    pub backend_config: BackendConfig,

    /// DNS records to maintain
    pub records: Vec<RecordTarget>,

    /// Public address lookup settings
    #[serde(default)]
    pub ip_lookup: IpLookupConfig,

    /// Seconds between refresh passes; 0 runs a single pass
    #[serde(default)]
    pub refresh_interval_secs: u64,
}

impl DnsmanConfig {
    /// Create a configuration for `backend` with no records
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            backend_config: BackendConfig::default(),
            records: Vec::new(),
            ip_lookup: IpLookupConfig::default(),
            refresh_interval_secs: 0,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.records.is_empty() {
            return Err(crate::Error::config("No records configured"));
        }

        for record in &self.records {
            record.validate()?;
        }

        self.backend_config.validate_for(self.backend)?;
        self.ip_lookup.validate()?;

        Ok(())
    }
}

/// Closed set of supported backend variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Cloudflare API (managed provider, zone aware, token auth)
    Cloudflare,
    /// DynDNS update protocol at update.ddns.org
    DynDns,
    /// DynDNS update protocol at dynupdate.no-ip.com
    NoIp,
}

impl BackendKind {
    /// All supported kinds
    pub const ALL: [BackendKind; 3] = [BackendKind::Cloudflare, BackendKind::DynDns, BackendKind::NoIp];

    /// Selector name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Cloudflare => "cloudflare",
            BackendKind::DynDns => "dyndns",
            BackendKind::NoIp => "noip",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloudflare" => Ok(BackendKind::Cloudflare),
            "dyndns" => Ok(BackendKind::DynDns),
            "noip" | "no-ip" => Ok(BackendKind::NoIp),
            _ => Err(crate::Error::invalid_backend_kind(s)),
        }
    }
}

/// Settings shared by all backend factories
///
/// Each variant reads only the fields it needs: Cloudflare uses `api_token`
/// and `zone_id`, the DynDNS-protocol variants use `username`/`password`.
/// `endpoint` overrides the variant's fixed base URL.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Bearer token (Cloudflare)
    #[serde(default)]
    pub api_token: Option<String>,

    /// Pre-resolved zone id (Cloudflare); skips the zone lookup
    #[serde(default)]
    pub zone_id: Option<String>,

    /// Basic-auth user (DynDNS protocol)
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password (DynDNS protocol)
    #[serde(default)]
    pub password: Option<String>,

    /// Base URL override
    #[serde(default)]
    pub endpoint: Option<String>,

    /// HTTP timeout in seconds (0 = default)
    #[serde(default)]
    pub timeout_secs: u64,

    /// Address family preferred when reading a record back through DNS
    #[serde(default)]
    pub ip_version: IpVersion,
}

impl BackendConfig {
    /// Configuration carrying only an API token
    pub fn with_api_token(token: impl Into<String>) -> Self {
        Self {
            api_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Configuration carrying basic-auth credentials
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Effective HTTP timeout
    pub fn timeout(&self) -> std::time::Duration {
        match self.timeout_secs {
            0 => std::time::Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            secs => std::time::Duration::from_secs(secs),
        }
    }

    /// Validate the fields `kind` depends on
    pub fn validate_for(&self, kind: BackendKind) -> Result<(), crate::Error> {
        if let Some(endpoint) = &self.endpoint
            && !endpoint.starts_with("https://")
            && !endpoint.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "Backend endpoint must use HTTP or HTTPS scheme. Got: {}",
                endpoint
            )));
        }

        match kind {
            BackendKind::Cloudflare => {
                if self.api_token.as_deref().is_none_or(str::is_empty) {
                    return Err(crate::Error::config("Cloudflare API token is required"));
                }
            }
            BackendKind::DynDns | BackendKind::NoIp => {
                if self.username.is_some() != self.password.is_some() {
                    return Err(crate::Error::config(
                        "Username and password must be set together",
                    ));
                }
            }
        }

        Ok(())
    }
}

// Credentials never reach log output
impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .field("zone_id", &self.zone_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("ip_version", &self.ip_version)
            .finish()
    }
}

/// A DNS record to maintain: fully-qualified name plus its zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordTarget {
    /// Fully-qualified domain name (e.g., "host.example.com")
    pub name: String,

    /// Zone the record belongs to (e.g., "example.com")
    pub zone: String,
}

impl RecordTarget {
    /// Create a target, deriving the zone from the record name
    ///
    /// "host.example.com" -> "example.com", "host.example.co.uk" ->
    /// "example.co.uk". Use [`RecordTarget::with_zone`] when the heuristic
    /// does not match the provider's zone layout.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let zone = derive_zone(&name);
        Self { name, zone }
    }

    /// Create a target with an explicit zone
    pub fn with_zone(name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone: zone.into(),
        }
    }

    /// Parse `name` or `name@zone`
    pub fn parse(value: &str) -> Result<Self, crate::Error> {
        let value = value.trim();
        let target = match value.split_once('@') {
            Some((name, zone)) => Self::with_zone(name.trim(), zone.trim()),
            None => Self::new(value),
        };
        target.validate()?;
        Ok(target)
    }

    /// Validate that the name is a plausible domain inside its zone
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.name)?;
        validate_domain_name(&self.zone)?;

        if self.name != self.zone && !self.name.ends_with(&format!(".{}", self.zone)) {
            return Err(crate::Error::config(format!(
                "Record {} is not inside zone {}",
                self.name, self.zone
            )));
        }

        Ok(())
    }
}

impl fmt::Display for RecordTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (zone {})", self.name, self.zone)
    }
}

const SECOND_LEVEL_SUFFIXES: &[&str] = &["ac", "co", "com", "edu", "gov", "ne", "net", "or", "org"];

fn derive_zone(name: &str) -> String {
    let parts: Vec<&str> = name.trim_end_matches('.').split('.').collect();
    if parts.len() < 2 {
        return name.to_string();
    }

    // Second-level public suffixes under country TLDs (co.uk, com.au)
    let tld = parts[parts.len() - 1];
    let sld = parts[parts.len() - 2];
    if parts.len() >= 3 && tld.len() == 2 && SECOND_LEVEL_SUFFIXES.contains(&sld) {
        parts[parts.len() - 3..].join(".")
    } else {
        parts[parts.len() - 2..].join(".")
    }
}

/// Basic RFC 1035 name checks
fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// IP version filter for the public address lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 only
    V4,
    /// IPv6 only
    V6,
    /// Accept either
    #[default]
    Both,
}

impl IpVersion {
    /// Whether `ip` belongs to an accepted family
    pub fn accepts(&self, ip: &IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
            IpVersion::Both => true,
        }
    }
}

impl FromStr for IpVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v4" | "ipv4" | "4" => Ok(IpVersion::V4),
            "v6" | "ipv6" | "6" => Ok(IpVersion::V6),
            "both" | "any" => Ok(IpVersion::Both),
            other => Err(crate::Error::config(format!(
                "IP version '{}' is not valid. Valid: v4, v6, both",
                other
            ))),
        }
    }
}

/// Public address lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLookupConfig {
    /// Services queried in order until one answers
    #[serde(default = "default_ip_lookup_urls")]
    pub urls: Vec<String>,

    /// Accepted address family
    #[serde(default = "default_ip_version")]
    pub version: IpVersion,

    /// HTTP timeout in seconds
    #[serde(default = "default_ip_lookup_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpLookupConfig {
    /// Validate the lookup configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.urls.is_empty() {
            return Err(crate::Error::config("At least one IP lookup URL is required"));
        }

        for url in &self.urls {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "IP lookup URL must use HTTP or HTTPS scheme. Got: {}",
                    url
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP lookup timeout must be > 0"));
        }

        Ok(())
    }
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            urls: default_ip_lookup_urls(),
            version: default_ip_version(),
            timeout_secs: default_ip_lookup_timeout_secs(),
        }
    }
}

fn default_ip_lookup_urls() -> Vec<String> {
    DEFAULT_IP_LOOKUP_URLS.iter().map(|s| s.to_string()).collect()
}

fn default_ip_version() -> IpVersion {
    IpVersion::default()
}

fn default_ip_lookup_timeout_secs() -> u64 {
    10
}
