use anyhow::Result;
use rds_exporter::cli::{
    actions::{Action, LogFormat},
    commands,
};

#[test]
fn test_handler_happy_path_merges_regions_and_flags() -> Result<()> {
    let cmd = commands::new();
    let matches = cmd.get_matches_from(vec![
        "rds-exporter",
        "--aws-regions",
        "us-east-1,eu-west-1",
        "--aws-assume-role-arn",
        "arn:aws:iam::123456789012:role/rds-exporter",
        "--no-collect-usages",
        "--collect-instance-tags",
        "--listen-address",
        "0.0.0.0:9999",
    ]);

    let action = rds_exporter::cli::dispatch::handler(&matches)?;

    let Action::Run {
        config, debug, log_format,
    } = action;

    assert_eq!(config.aws_regions, vec!["us-east-1", "eu-west-1"]);
    assert_eq!(
        config.aws_assume_role_arn,
        Some("arn:aws:iam::123456789012:role/rds-exporter".to_string())
    );
    assert!(!config.collector.collect_usages);
    assert!(config.collector.collect_instance_tags);
    assert_eq!(config.listen_address, "0.0.0.0:9999");
    assert!(!debug);
    assert_eq!(log_format, LogFormat::Text);

    Ok(())
}

#[test]
fn test_handler_defaults_to_empty_region_list() -> Result<()> {
    let cmd = commands::new();
    let matches = cmd.get_matches_from(vec!["rds-exporter"]);

    let action = rds_exporter::cli::dispatch::handler(&matches)?;

    let Action::Run { config, .. } = action;
    assert!(config.aws_regions.is_empty());
    assert_eq!(config.listen_address, "0.0.0.0:9043");
    assert_eq!(config.metrics_path, "/metrics");
    assert!(config.collector.collect_instance_metrics);
    assert!(!config.collector.collect_instance_tags);

    Ok(())
}

#[test]
fn test_handler_debug_and_json_log_format() -> Result<()> {
    let cmd = commands::new();
    let matches =
        cmd.get_matches_from(vec!["rds-exporter", "--debug", "--log-format", "json"]);

    let action = rds_exporter::cli::dispatch::handler(&matches)?;

    let Action::Run {
        debug, log_format, ..
    } = action;
    assert!(debug);
    assert_eq!(log_format, LogFormat::Json);

    Ok(())
}

#[test]
fn test_handler_tls_paths_pass_through() -> Result<()> {
    let cmd = commands::new();
    let matches = cmd.get_matches_from(vec![
        "rds-exporter",
        "--tls-cert-path",
        "/etc/rds-exporter/cert.pem",
        "--tls-key-path",
        "/etc/rds-exporter/key.pem",
    ]);

    let action = rds_exporter::cli::dispatch::handler(&matches)?;

    let Action::Run { config, .. } = action;
    assert_eq!(
        config.tls_cert_path,
        Some("/etc/rds-exporter/cert.pem".to_string())
    );
    assert_eq!(
        config.tls_key_path,
        Some("/etc/rds-exporter/key.pem".to_string())
    );

    Ok(())
}
