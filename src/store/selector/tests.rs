use super::*;
use crate::config::QdrantConfig;
use httpmock::prelude::*;
use serde_json::json;

fn config_with_qdrant(url: &str) -> Config {
    Config {
        qdrant: Some(QdrantConfig {
            url: url.to_string(),
            collection: "docs_chat".to_string(),
        }),
        ..Config::default()
    }
}

#[test]
fn unconfigured_selects_ephemeral_directly() {
    let active = select_backend(&Config::default()).expect("selection succeeds");
    assert_eq!(active.backend, Backend::Ephemeral);
    assert_eq!(active.store.name(), "memory");
    assert!(active.fallback_reason.is_none());
}

#[test]
fn successful_probe_selects_persistent() {
    let server = MockServer::start();
    let probe = server.mock(|when, then| {
        when.method(GET).path("/collections");
        then.status(200).json_body(json!({ "result": { "collections": [] } }));
    });

    let config = config_with_qdrant(&server.base_url());
    let active = select_backend_with(&config, 3, Duration::from_millis(10))
        .expect("selection succeeds");

    assert_eq!(active.backend, Backend::Persistent);
    assert_eq!(active.store.name(), "qdrant");
    assert!(active.fallback_reason.is_none());
    probe.assert_hits(1);
}

#[test]
fn exhausted_probes_fall_back_to_ephemeral_with_reason() {
    // Reserved port, connections are refused
    let config = config_with_qdrant("http://127.0.0.1:1");
    let active = select_backend_with(&config, 2, Duration::from_millis(10))
        .expect("fallback is not an error");

    assert_eq!(active.backend, Backend::Ephemeral);
    assert_eq!(active.store.name(), "memory");
    let reason = active.fallback_reason.expect("reason is recorded");
    assert!(reason.contains("2 attempts"));
}

#[test]
fn probe_is_retried_the_configured_number_of_times() {
    let server = MockServer::start();
    let probe = server.mock(|when, then| {
        when.method(GET).path("/collections");
        then.status(503);
    });

    let config = config_with_qdrant(&server.base_url());
    let active = select_backend_with(&config, 3, Duration::from_millis(10))
        .expect("fallback is not an error");

    assert_eq!(active.backend, Backend::Ephemeral);
    probe.assert_hits(3);
}

#[test]
fn fallback_store_remains_usable() {
    let config = config_with_qdrant("http://127.0.0.1:1");
    let active = select_backend_with(&config, 1, Duration::from_millis(1))
        .expect("fallback is not an error");

    assert!(active.store.query(&[1.0, 0.0], 8).expect("query works").is_empty());
}
