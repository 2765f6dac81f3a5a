//! Contract Test: manager factory
//!
//! Constraints verified:
//! - An unknown selector fails with InvalidBackendKind and constructs nothing
//! - A registered selector yields a manager with an empty cache
//! - Each backend kind maps to its own factory

mod common;

use common::*;
use dnsman_core::{BackendConfig, BackendKind, BackendRegistry, Error, UpdateOutcome};
use tokio_test::assert_ok;

fn registry_with(kind: BackendKind, factory: &MockFactory) -> BackendRegistry {
    let registry = BackendRegistry::new();
    registry.register_backend(kind, Box::new(factory.clone()));
    registry
}

#[test]
fn unknown_selector_constructs_nothing() {
    let factory = MockFactory::new(&MockBackend::new());
    let registry = BackendRegistry::new();
    for kind in BackendKind::ALL {
        registry.register_backend(kind, Box::new(factory.clone()));
    }

    for selector in ["route53", "", "cloudflare2", "3"] {
        let err = registry
            .create_manager_by_name(selector, &BackendConfig::default())
            .unwrap_err();
        assert!(
            matches!(err, Error::InvalidBackendKind(_)),
            "selector {:?} gave {:?}",
            selector,
            err
        );
    }

    assert_eq!(factory.create_call_count(), 0);
}

#[test]
fn selector_dispatches_to_matching_factory() {
    let noip = MockFactory::new(&MockBackend::new());
    let dyndns = MockFactory::new(&MockBackend::new());

    let registry = registry_with(BackendKind::NoIp, &noip);
    registry.register_backend(BackendKind::DynDns, Box::new(dyndns.clone()));

    assert_ok!(registry.create_manager_by_name("noip", &BackendConfig::default()));

    assert_eq!(noip.create_call_count(), 1);
    assert_eq!(dyndns.create_call_count(), 0);
}

#[tokio::test]
async fn new_manager_starts_with_empty_cache() {
    let backend = MockBackend::new();
    let factory = MockFactory::new(&backend);
    let registry = registry_with(BackendKind::Cloudflare, &factory);

    let mut manager = assert_ok!(
        registry.create_manager(BackendKind::Cloudflare, &BackendConfig::with_api_token("t"))
    );

    assert_eq!(manager.cached_address(HOST), None);
    assert_eq!(manager.backend_name(), "mock");

    let outcome = assert_ok!(manager.update_hostname(&host(), ADDR_1).await);
    assert_eq!(outcome, UpdateOutcome::Pushed);
    assert_eq!(backend.update_call_count(), 1);
}
