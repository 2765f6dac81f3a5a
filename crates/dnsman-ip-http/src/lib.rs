// # HTTP Public Address Lookup
//
// Asks plain-text "what is my IP" services for the caller's public address.
//
// ## Architecture
//
// Services are tried in the configured order; the first one that answers
// with a parseable address of the accepted family wins. There is no caching
// and no polling: every call to `public_address` performs fresh requests.

use dnsman_core::config::{IpLookupConfig, IpVersion};
use dnsman_core::traits::PublicAddressLookup;
use dnsman_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// HTTP-based public address lookup
#[derive(Debug)]
pub struct HttpAddressLookup {
    /// Services queried in order
    urls: Vec<String>,

    /// Accepted address family
    version: IpVersion,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpAddressLookup {
    /// Create a lookup from configuration
    pub fn new(config: &IpLookupConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            urls: config.urls.clone(),
            version: config.version,
            client,
        })
    }

    /// Create a lookup against a single service
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        Self::new(&IpLookupConfig {
            urls: vec![url.into()],
            ..IpLookupConfig::default()
        })
    }

    /// Fetch the address from one service
    async fn fetch_from(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("{} answered {}", url, response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response from {}: {}", url, e)))?;

        parse_address(&body, self.version)
    }
}

/// Parse a service response and apply the family filter
fn parse_address(body: &str, version: IpVersion) -> Result<IpAddr> {
    let text = body.trim();

    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::public_address(format!("Invalid IP address: {}", text)))?;

    if !version.accepts(&ip) {
        return Err(Error::public_address(format!("Expected {:?} address, got: {}", version, ip)));
    }

    Ok(ip)
}

#[async_trait::async_trait]
impl PublicAddressLookup for HttpAddressLookup {
    async fn public_address(&self) -> Result<String> {
        let mut last_error = None;

        for url in &self.urls {
            match self.fetch_from(url).await {
                Ok(ip) => {
                    tracing::debug!("Public address from {}: {}", url, ip);
                    return Ok(ip.to_string());
                }
                Err(e) => {
                    tracing::warn!("Public address lookup via {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        let detail = match last_error {
            Some(Error::PublicAddress(msg)) => msg,
            Some(e) => e.to_string(),
            None => "no lookup services configured".to_string(),
        };
        Err(Error::public_address(detail))
    }
}
