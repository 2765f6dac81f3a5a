// # DynDNS Protocol Backends
//
// Legacy dynamic-DNS update services that speak the DynDNS `/nic/update`
// protocol. One type covers every such service; only the endpoint and the
// display name differ.
//
// - DynDNS: https://update.ddns.org
// - No-IP:  https://dynupdate.no-ip.com
//
// ## Protocol
//
// ```http
// GET /nic/update?hostname=host.example.com&myip=203.0.113.5
// Authorization: Basic <username:password>   (only when configured)
// User-Agent: dnsman/<version>
// ```
//
// The plain-text body starts with a return code: `good` and `nochg` mean
// success, anything else is an error.
//
// The protocol has no read operation, so `resolve` asks the system
// resolver what the hostname currently points at, preferring the
// configured address family when the name has both A and AAAA records.

use async_trait::async_trait;
use dnsman_core::config::{BackendConfig, BackendKind, IpVersion, RecordTarget};
use dnsman_core::traits::{DnsBackend, DnsBackendFactory};
use dnsman_core::{BackendRegistry, Error, Result};
use std::net::IpAddr;

/// DynDNS update endpoint
pub const DYNDNS_ENDPOINT: &str = "https://update.ddns.org";

/// No-IP update endpoint
pub const NOIP_ENDPOINT: &str = "https://dynupdate.no-ip.com";

const USER_AGENT: &str = concat!("dnsman/", env!("CARGO_PKG_VERSION"));

/// Interpret a `/nic/update` response body
fn parse_update_response(backend: &str, body: &str) -> Result<()> {
    let code = body.split_whitespace().next().unwrap_or_default();

    match code {
        "good" | "nochg" => Ok(()),
        "badauth" => Err(Error::auth(format!("{} rejected the credentials", backend))),
        "nohost" => Err(Error::not_found(format!("{}: hostname not registered", backend))),
        "notfqdn" => Err(Error::backend(backend, "hostname is not a fully-qualified domain name")),
        "numhost" => Err(Error::backend(backend, "too many hosts in one request")),
        "abuse" => Err(Error::backend(backend, "hostname blocked for abuse")),
        "badagent" => Err(Error::backend(backend, "user agent rejected")),
        "!donator" => Err(Error::backend(backend, "feature not available for this account")),
        "911" | "dnserr" => Err(Error::backend(backend, format!("server-side error ({})", code))),
        "" => Err(Error::backend(backend, "empty response")),
        other => Err(Error::backend(backend, format!("unexpected response: {}", other))),
    }
}

/// First address of the preferred family, falling back to the first one
fn pick_address(addrs: impl IntoIterator<Item = IpAddr>, version: IpVersion) -> Option<IpAddr> {
    let mut fallback = None;
    for ip in addrs {
        if version.accepts(&ip) {
            return Some(ip);
        }
        fallback.get_or_insert(ip);
    }
    fallback
}

/// Backend for a DynDNS-protocol update service
pub struct DynDnsBackend {
    /// Service name, used in logs and errors
    name: &'static str,

    /// Base URL of the update service
    endpoint: String,

    /// Basic-auth credentials, if the service needs them
    credentials: Option<(String, String)>,

    /// Family preferred by `resolve`
    ip_version: IpVersion,

    /// HTTP client for update requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for DynDnsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynDnsBackend")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("username", &self.credentials.as_ref().map(|(user, _)| user))
            .field("ip_version", &self.ip_version)
            .finish()
    }
}

impl DynDnsBackend {
    /// Create a backend for the service at `endpoint`
    pub fn new(name: &'static str, endpoint: &str, config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            (None, None) => None,
            _ => {
                return Err(Error::auth(format!(
                    "{} needs both username and password",
                    name
                )));
            }
        };

        Ok(Self {
            name,
            endpoint: config
                .endpoint
                .as_deref()
                .unwrap_or(endpoint)
                .trim_end_matches('/')
                .to_string(),
            credentials,
            ip_version: config.ip_version,
            client,
        })
    }

    /// DynDNS backend (update.ddns.org)
    pub fn dyndns(config: &BackendConfig) -> Result<Self> {
        Self::new("dyndns", DYNDNS_ENDPOINT, config)
    }

    /// No-IP backend (dynupdate.no-ip.com)
    pub fn noip(config: &BackendConfig) -> Result<Self> {
        Self::new("noip", NOIP_ENDPOINT, config)
    }

    fn update_url(&self) -> String {
        format!("{}/nic/update", self.endpoint)
    }
}

#[async_trait]
impl DnsBackend for DynDnsBackend {
    async fn update(&self, target: &RecordTarget, address: &str) -> Result<()> {
        tracing::info!("Updating {} record: {} -> {}", self.name, target.name, address);

        let mut request = self
            .client
            .get(self.update_url())
            .query(&[("hostname", target.name.as_str()), ("myip", address)]);

        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::backend(self.name, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::backend(self.name, format!("Failed to read response: {}", e)))?;

        if status.as_u16() == 401 {
            return Err(Error::auth(format!("{} requires valid credentials", self.name)));
        }
        if !status.is_success() {
            return Err(Error::backend(
                self.name,
                format!("HTTP error: {} - {}", status, body.trim()),
            ));
        }

        parse_update_response(self.name, &body)?;
        tracing::info!("{} accepted {} -> {}: {}", self.name, target.name, address, body.trim());

        Ok(())
    }

    async fn resolve(&self, target: &RecordTarget) -> Result<String> {
        let addrs = tokio::net::lookup_host((target.name.as_str(), 0)).await?;

        let address = pick_address(addrs.map(|addr| addr.ip()), self.ip_version)
            .map(|ip| ip.to_string())
            .ok_or_else(|| Error::not_found(format!("No address for {}", target.name)))?;

        tracing::debug!("{} resolves to {}", target.name, address);
        Ok(address)
    }

    fn backend_name(&self) -> &'static str {
        self.name
    }
}

/// Factory for DynDNS-protocol backends
pub struct DynDnsFactory {
    kind: BackendKind,
}

impl DynDnsFactory {
    /// Factory producing DynDNS backends
    pub fn dyndns() -> Self {
        Self { kind: BackendKind::DynDns }
    }

    /// Factory producing No-IP backends
    pub fn noip() -> Self {
        Self { kind: BackendKind::NoIp }
    }
}

impl DnsBackendFactory for DynDnsFactory {
    fn create(&self, config: &BackendConfig) -> Result<Box<dyn DnsBackend>> {
        let backend = match self.kind {
            BackendKind::DynDns => DynDnsBackend::dyndns(config)?,
            BackendKind::NoIp => DynDnsBackend::noip(config)?,
            other => return Err(Error::invalid_backend_kind(other.to_string())),
        };
        Ok(Box::new(backend))
    }
}

/// Register the DynDNS and No-IP backends with a registry
pub fn register(registry: &BackendRegistry) {
    registry.register_backend(BackendKind::DynDns, Box::new(DynDnsFactory::dyndns()));
    registry.register_backend(BackendKind::NoIp, Box::new(DynDnsFactory::noip()));
}
