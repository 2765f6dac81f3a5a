// # Cloudflare DNS Backend
//
// Managed-provider backend for dnsman, built on the Cloudflare API v4.
//
// ## Flow
//
// Every update and resolve follows the same three steps:
//
// 1. Zone lookup: GET `/zones?name=<zone>` (skipped when a zone id is configured)
// 2. Record lookup: GET `/zones/:zone_id/dns_records?name=<fqdn>`
// 3. update: PUT `/zones/:zone_id/dns_records/:record_id`; resolve: read `content`
//
// Step 2 must match exactly one record. Several matches are reported as
// `Error::AmbiguousRecord` instead of picking one.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/

use async_trait::async_trait;
use dnsman_core::config::{BackendConfig, BackendKind, RecordTarget};
use dnsman_core::traits::{DnsBackend, DnsBackendFactory};
use dnsman_core::{BackendRegistry, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const BACKEND_NAME: &str = "cloudflare";

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

/// The fields of a DNS record this backend reads and writes back
#[derive(Debug, Clone, Deserialize, Serialize)]
struct DnsRecord {
    #[serde(skip_serializing)]
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proxied: Option<bool>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap `result`, turning `success: false` into a backend error
    fn into_result(self, context: &str) -> Result<T> {
        if !self.success {
            let detail = self
                .errors
                .iter()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::backend(BACKEND_NAME, format!("{} failed: {}", context, detail)));
        }

        self.result.ok_or_else(|| {
            Error::backend(BACKEND_NAME, format!("{}: response has no result", context))
        })
    }
}

/// Decode a response body and unwrap its envelope
fn parse_envelope<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(body)?;
    envelope.into_result(context)
}

/// Map a non-success HTTP status to an error
fn status_error(status: u16, body: &str, context: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "Cloudflare rejected the API token or its permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", context, body)),
        429 => Error::backend(
            BACKEND_NAME,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::backend(
            BACKEND_NAME,
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::backend(BACKEND_NAME, format!("{} failed: {} - {}", context, status, body)),
    }
}

/// Pick the only record named `name`, refusing to guess between several
fn select_single_record(name: &str, mut records: Vec<DnsRecord>) -> Result<DnsRecord> {
    match records.len() {
        0 => Err(Error::not_found(format!("DNS record not found: {}", name))),
        1 => Ok(records.remove(0)),
        count => Err(Error::ambiguous(name, count)),
    }
}

/// Cloudflare DNS backend
///
/// Holds its own HTTP client and bearer token; no state survives between
/// calls.
pub struct CloudflareBackend {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone ID (optional, looked up from the target's zone otherwise)
    zone_id: Option<String>,

    /// API base URL
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareBackend")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareBackend {
    /// Create a new Cloudflare backend
    ///
    /// # Errors
    ///
    /// - `Error::AuthorizationMissing` if `api_token` is empty
    /// - `Error::Http` if the HTTP client cannot be built
    pub fn new(api_token: impl Into<String>, zone_id: Option<String>) -> Result<Self> {
        Self::with_options(api_token, zone_id, CLOUDFLARE_API_BASE, BackendConfig::default().timeout())
    }

    /// Create a backend from factory configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::with_options(
            config.api_token.clone().unwrap_or_default(),
            config.zone_id.clone(),
            config.endpoint.as_deref().unwrap_or(CLOUDFLARE_API_BASE),
            config.timeout(),
        )
    }

    fn with_options(
        api_token: impl Into<String>,
        zone_id: Option<String>,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::auth("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id: zone_id.filter(|id| !id.is_empty()),
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// GET `url` and unwrap the Cloudflare envelope
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::backend(BACKEND_NAME, format!("HTTP request failed: {}", e)))?;

        Self::read_envelope(response, context).await
    }

    async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response, context: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status.as_u16(), &body, context));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::backend(BACKEND_NAME, format!("Failed to read response: {}", e)))?;

        parse_envelope(&body, context)
    }

    /// Zone id for the target, from configuration or a zone lookup
    async fn zone_id(&self, target: &RecordTarget) -> Result<String> {
        if let Some(ref zone_id) = self.zone_id {
            tracing::debug!("Using pre-configured zone ID");
            return Ok(zone_id.clone());
        }

        tracing::debug!("Looking up zone ID for zone: {}", target.zone);

        let url = format!("{}/zones", self.api_base);
        let zones: Vec<Zone> = self
            .get_json(&url, &[("name", target.zone.as_str())], "Zone lookup")
            .await?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", target.zone)))?;

        tracing::debug!("Zone ID: {}", zone.id);
        Ok(zone.id)
    }

    /// The single record matching the target's name
    async fn find_record(&self, zone_id: &str, target: &RecordTarget) -> Result<DnsRecord> {
        let url = format!("{}/zones/{}/dns_records", self.api_base, zone_id);
        let records: Vec<DnsRecord> = self
            .get_json(&url, &[("name", target.name.as_str())], "Record lookup")
            .await?;

        for record in &records {
            tracing::debug!(
                "Matched record {} {} {} (id {})",
                record.name,
                record.record_type,
                record.content,
                record.id
            );
        }

        select_single_record(&target.name, records)
    }
}

#[async_trait]
impl DnsBackend for CloudflareBackend {
    async fn update(&self, target: &RecordTarget, address: &str) -> Result<()> {
        let zone_id = self.zone_id(target).await?;
        let record = self.find_record(&zone_id, target).await?;

        if record.content == address {
            tracing::info!("DNS record already has correct address: {} -> {}", target.name, address);
            return Ok(());
        }

        tracing::info!(
            "Updating Cloudflare record: {} {} -> {} (was: {})",
            record.record_type,
            target.name,
            address,
            record.content
        );

        let url = format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record.id);
        let payload = DnsRecord {
            content: address.to_string(),
            ..record
        };

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::backend(BACKEND_NAME, format!("HTTP request failed: {}", e)))?;

        let updated: DnsRecord = Self::read_envelope(response, "Record update").await?;
        tracing::info!("DNS record updated: {} -> {}", updated.name, updated.content);

        Ok(())
    }

    async fn resolve(&self, target: &RecordTarget) -> Result<String> {
        let zone_id = self.zone_id(target).await?;
        let record = self.find_record(&zone_id, target).await?;
        Ok(record.content)
    }

    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }
}

/// Factory for creating Cloudflare backends
pub struct CloudflareFactory;

impl DnsBackendFactory for CloudflareFactory {
    fn create(&self, config: &BackendConfig) -> Result<Box<dyn DnsBackend>> {
        Ok(Box::new(CloudflareBackend::from_config(config)?))
    }
}

/// Register the Cloudflare backend with a registry
///
/// # Example
///
/// ```rust
/// use dnsman_core::{BackendKind, BackendRegistry};
///
/// let registry = BackendRegistry::new();
/// dnsman_cloudflare::register(&registry);
/// assert!(registry.has_backend(BackendKind::Cloudflare));
/// ```
pub fn register(registry: &BackendRegistry) {
    registry.register_backend(BackendKind::Cloudflare, Box::new(CloudflareFactory));
}
