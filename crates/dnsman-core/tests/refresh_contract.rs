//! Contract Test: refresh and check passes
//!
//! Constraints verified:
//! - A failed public address lookup aborts the pass before any backend call
//! - A failing record does not stop the remaining records
//! - Repeated passes with an unchanged address are served from the cache

mod common;

use common::*;
use dnsman_core::sync::{RecordStatus, check_once, refresh_once};
use dnsman_core::{DnsManager, Error, RecordTarget};
use tokio_test::{assert_err, assert_ok};

fn targets() -> Vec<RecordTarget> {
    vec![
        RecordTarget::new("host.example.com"),
        RecordTarget::new("www.example.com"),
    ]
}

#[tokio::test]
async fn lookup_failure_aborts_pass() {
    let backend = MockBackend::new();
    let mut manager = DnsManager::new(Box::new(backend.handle()));
    let lookup = StaticLookup::failing();

    let err = assert_err!(refresh_once(&mut manager, &lookup, &targets()).await);

    assert!(matches!(err, Error::PublicAddress(_)));
    assert_eq!(lookup.call_count(), 1);
    assert_eq!(backend.update_call_count(), 0);
}

#[tokio::test]
async fn second_pass_with_same_address_is_cached() {
    let backend = MockBackend::new();
    let mut manager = DnsManager::new(Box::new(backend.handle()));
    let lookup = StaticLookup::new(ADDR_1);

    let first = assert_ok!(refresh_once(&mut manager, &lookup, &targets()).await);
    let second = assert_ok!(refresh_once(&mut manager, &lookup, &targets()).await);

    assert!(first.is_success());
    assert!(first.records.iter().all(|(_, s)| matches!(s, RecordStatus::Pushed)));
    assert!(second.records.iter().all(|(_, s)| matches!(s, RecordStatus::Cached)));
    assert_eq!(second.address, ADDR_1);
    assert_eq!(backend.update_call_count(), 2);
}

#[tokio::test]
async fn failures_are_reported_per_record() {
    let backend = MockBackend::new();
    backend.set_fail_updates(true);
    let mut manager = DnsManager::new(Box::new(backend.handle()));
    let lookup = StaticLookup::new(ADDR_1);

    let report = assert_ok!(refresh_once(&mut manager, &lookup, &targets()).await);

    assert_eq!(report.failures(), 2);
    assert!(!report.is_success());
    assert_eq!(backend.update_call_count(), 2, "Every record must be attempted");
}

#[tokio::test]
async fn check_pass_reports_current_and_stale() {
    let backend = MockBackend::new();
    backend.set_remote("host.example.com", ADDR_1);
    backend.set_remote("www.example.com", ADDR_2);
    let manager = DnsManager::new(Box::new(backend.handle()));
    let lookup = StaticLookup::new(ADDR_1);

    let report = assert_ok!(check_once(&manager, &lookup, &targets()).await);

    assert!(matches!(report.records[0].1, RecordStatus::Current));
    assert!(matches!(report.records[1].1, RecordStatus::Stale));
    assert_eq!(backend.update_call_count(), 0);
}

#[tokio::test]
async fn check_pass_reports_resolve_failures() {
    let backend = MockBackend::new();
    let manager = DnsManager::new(Box::new(backend.handle()));
    let lookup = StaticLookup::new(ADDR_1);

    // No remote records exist, so every resolve is NotFound
    let report = assert_ok!(check_once(&manager, &lookup, &targets()).await);

    assert_eq!(report.failures(), 2);
    assert!(matches!(
        &report.records[0].1,
        RecordStatus::Failed(e) if matches!(e.root(), Error::NotFound(_))
    ));
}
