#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
//! Integration tests for the TLS-termination path of `exporter::serve`.
//!
//! Generating a real certificate chain just to exercise the rustls acceptor
//! would pull in a certificate-generation dependency for a single test, so
//! these stick to the error paths: a missing/invalid cert or key file must
//! surface as an error rather than a panic, before the listener ever binds.

use rds_exporter::collector::fetchers::mock::{
    MockInstanceTypeFetcher, MockInventoryFetcher, MockQuotaFetcher, MockTimeseriesFetcher,
};
use rds_exporter::collector::fetchers::{Quotas, Usage};
use rds_exporter::collector::{Collector, CollectorConfig};
use rds_exporter::config::ExporterConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

mod common;

fn empty_collector() -> Arc<Collector> {
    Arc::new(Collector::new(
        "123456789012",
        "us-east-1",
        CollectorConfig::default(),
        Arc::new(MockInventoryFetcher::ok(vec![], 0)),
        Arc::new(MockTimeseriesFetcher::new(
            BTreeMap::new(),
            Usage::default(),
        )),
        Arc::new(MockInstanceTypeFetcher::ok(BTreeMap::new())),
        Arc::new(MockQuotaFetcher::new(Quotas::default(), vec![])),
        "0.1.0",
        "deadbeef",
    ))
}

#[tokio::test]
async fn test_serve_errors_when_tls_cert_file_is_missing() {
    let port = common::get_available_port();
    let config = ExporterConfig {
        aws_regions: vec!["us-east-1".to_string()],
        aws_assume_role_arn: None,
        aws_assume_role_session: None,
        collector: CollectorConfig::default(),
        listen_address: format!("127.0.0.1:{port}"),
        metrics_path: "/metrics".to_string(),
        tls_cert_path: Some("/nonexistent/cert.pem".to_string()),
        tls_key_path: Some("/nonexistent/key.pem".to_string()),
    };

    let result = rds_exporter::exporter::serve(&config, vec![empty_collector()]).await;

    assert!(
        result.is_err(),
        "serve should fail to load a missing TLS certificate rather than panicking"
    );
    assert!(
        result.unwrap_err().to_string().contains("TLS"),
        "error should mention the TLS certificate/key loading step"
    );
}

#[tokio::test]
async fn test_serve_errors_when_tls_key_file_is_empty() {
    let port = common::get_available_port();
    let cert_dir = tempfile::tempdir().expect("failed to create temp dir");
    let cert_path = cert_dir.path().join("cert.pem");
    let key_path = cert_dir.path().join("key.pem");
    std::fs::write(&cert_path, "").expect("failed to write empty cert file");
    std::fs::write(&key_path, "").expect("failed to write empty key file");

    let config = ExporterConfig {
        aws_regions: vec!["us-east-1".to_string()],
        aws_assume_role_arn: None,
        aws_assume_role_session: None,
        collector: CollectorConfig::default(),
        listen_address: format!("127.0.0.1:{port}"),
        metrics_path: "/metrics".to_string(),
        tls_cert_path: Some(cert_path.to_string_lossy().into_owned()),
        tls_key_path: Some(key_path.to_string_lossy().into_owned()),
    };

    let result = rds_exporter::exporter::serve(&config, vec![empty_collector()]).await;

    assert!(
        result.is_err(),
        "an empty PEM file should not parse into a usable certificate chain"
    );
}

/// A config with only one of the two TLS paths set falls back to plain HTTP
/// (the `(Some, Some)` match arm in `serve` is the only TLS-enabling case).
#[tokio::test]
async fn test_serve_falls_back_to_plain_http_when_only_cert_path_is_set() {
    let port = common::get_available_port();
    let config = ExporterConfig {
        aws_regions: vec!["us-east-1".to_string()],
        aws_assume_role_arn: None,
        aws_assume_role_session: None,
        collector: CollectorConfig::default(),
        listen_address: format!("127.0.0.1:{port}"),
        metrics_path: "/metrics".to_string(),
        tls_cert_path: Some("/nonexistent/cert.pem".to_string()),
        tls_key_path: None,
    };

    let handle =
        tokio::spawn(async move { rds_exporter::exporter::serve(&config, vec![empty_collector()]).await });

    assert!(
        common::wait_for_server(port, 50).await,
        "server should bind plain HTTP since the TLS path pair is incomplete"
    );

    handle.abort();
}
