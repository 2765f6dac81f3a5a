//! Single refresh and check passes over a set of records
//!
//! These helpers run one pass and return. Scheduling, retries and backoff
//! belong to whoever calls them (see `dnsmand`).

use crate::config::RecordTarget;
use crate::error::Result;
use crate::manager::{DnsManager, UpdateOutcome};
use crate::traits::{PublicAddressLookup, get_public_address};
use tracing::{error, info};

/// What happened to one record during a pass
#[derive(Debug)]
pub enum RecordStatus {
    /// Backend accepted a new address
    Pushed,
    /// Cache already held the address, nothing sent
    Cached,
    /// Record already points at the address
    Current,
    /// Record points elsewhere
    Stale,
    /// Backend call failed
    Failed(crate::Error),
}

impl From<UpdateOutcome> for RecordStatus {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Pushed => RecordStatus::Pushed,
            UpdateOutcome::Cached => RecordStatus::Cached,
        }
    }
}

/// Outcome of one pass
#[derive(Debug)]
pub struct RefreshReport {
    /// Public address the pass used
    pub address: String,
    /// Per-record status, in input order
    pub records: Vec<(String, RecordStatus)>,
}

impl RefreshReport {
    /// Number of records whose backend call failed
    pub fn failures(&self) -> usize {
        self.records
            .iter()
            .filter(|(_, status)| matches!(status, RecordStatus::Failed(_)))
            .count()
    }

    /// True when no record failed
    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// Look up the public address and push it to every target
///
/// A lookup failure aborts the pass. A failure on one record is recorded
/// in the report and the remaining records are still processed.
pub async fn refresh_once(
    manager: &mut DnsManager,
    lookup: &dyn PublicAddressLookup,
    targets: &[RecordTarget],
) -> Result<RefreshReport> {
    let address = get_public_address(lookup).await?;
    let mut records = Vec::with_capacity(targets.len());

    for target in targets {
        let status = match manager.update_hostname(target, &address).await {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                error!("{}", e);
                RecordStatus::Failed(e)
            }
        };
        records.push((target.name.clone(), status));
    }

    let report = RefreshReport { address, records };
    info!(
        "Refresh pass complete: {} record(s), {} failure(s)",
        report.records.len(),
        report.failures()
    );
    Ok(report)
}

/// Look up the public address and verify every target without updating
pub async fn check_once(
    manager: &DnsManager,
    lookup: &dyn PublicAddressLookup,
    targets: &[RecordTarget],
) -> Result<RefreshReport> {
    let address = get_public_address(lookup).await?;
    let mut records = Vec::with_capacity(targets.len());

    for target in targets {
        let status = match manager.is_hostname_current(target, &address).await {
            Ok(true) => RecordStatus::Current,
            Ok(false) => RecordStatus::Stale,
            Err(e) => {
                error!("{}", e);
                RecordStatus::Failed(e)
            }
        };
        records.push((target.name.clone(), status));
    }

    Ok(RefreshReport { address, records })
}
