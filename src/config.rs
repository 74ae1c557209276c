//! Config-file loading and CLI/env/file precedence merge (spec §6).
//!
//! The core only ever sees an already-merged [`ExporterConfig`]; the merge
//! itself lives here because it is a thin, external-collaborator concern,
//! grounded on `emamulandalib-aws-cw-tui`'s `config::config_manager`
//! (file-then-defaults loading, `dirs` for locating the user's config
//! directory) with the file format swapped for YAML per `SPEC_FULL.md` §10.

use crate::collector::CollectorConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional values read from `rds_exporter.yaml`. Every field is optional so
/// a file may override only the settings it cares about; anything left
/// unset falls through to the CLI/env default already resolved by clap.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub aws_regions: Option<Vec<String>>,
    pub aws_assume_role_arn: Option<String>,
    pub aws_assume_role_session: Option<String>,
    pub collect_instance_metrics: Option<bool>,
    pub collect_instance_tags: Option<bool>,
    pub collect_instance_types: Option<bool>,
    pub collect_logs_size: Option<bool>,
    pub collect_maintenances: Option<bool>,
    pub collect_quotas: Option<bool>,
    pub collect_usages: Option<bool>,
    pub listen_address: Option<String>,
    pub metrics_path: Option<String>,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    pub debug: Option<bool>,
    pub log_format: Option<String>,
}

/// Fully merged configuration the core and the HTTP layer run with.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub aws_regions: Vec<String>,
    pub aws_assume_role_arn: Option<String>,
    pub aws_assume_role_session: Option<String>,
    pub collector: CollectorConfig,
    pub listen_address: String,
    pub metrics_path: String,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
}

/// CLI-resolved values, already carrying clap's own env/default layer
/// (`PROMETHEUS_RDS_EXPORTER_*`). A field is `Some` only when the user passed
/// it explicitly on the command line or through its env var, distinct from
/// clap's baked-in default, so the file can still override a default.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub aws_regions: Option<Vec<String>>,
    pub aws_assume_role_arn: Option<String>,
    pub aws_assume_role_session: Option<String>,
    pub collect_instance_metrics: Option<bool>,
    pub collect_instance_tags: Option<bool>,
    pub collect_instance_types: Option<bool>,
    pub collect_logs_size: Option<bool>,
    pub collect_maintenances: Option<bool>,
    pub collect_quotas: Option<bool>,
    pub collect_usages: Option<bool>,
    pub listen_address: Option<String>,
    pub metrics_path: Option<String>,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
}

/// Merge CLI overrides over a loaded file config over built-in defaults.
/// Precedence is CLI > env (already folded into `CliOverrides` by clap) >
/// file > default, per spec §6.
#[must_use]
pub fn merge(cli: CliOverrides, file: FileConfig) -> ExporterConfig {
    let defaults = CollectorConfig::default();

    ExporterConfig {
        aws_regions: cli
            .aws_regions
            .or(file.aws_regions)
            .unwrap_or_default(),
        aws_assume_role_arn: cli.aws_assume_role_arn.or(file.aws_assume_role_arn),
        aws_assume_role_session: cli
            .aws_assume_role_session
            .or(file.aws_assume_role_session),
        collector: CollectorConfig {
            collect_instance_metrics: cli
                .collect_instance_metrics
                .or(file.collect_instance_metrics)
                .unwrap_or(defaults.collect_instance_metrics),
            collect_instance_tags: cli
                .collect_instance_tags
                .or(file.collect_instance_tags)
                .unwrap_or(defaults.collect_instance_tags),
            collect_instance_types: cli
                .collect_instance_types
                .or(file.collect_instance_types)
                .unwrap_or(defaults.collect_instance_types),
            collect_logs_size: cli
                .collect_logs_size
                .or(file.collect_logs_size)
                .unwrap_or(defaults.collect_logs_size),
            collect_maintenances: cli
                .collect_maintenances
                .or(file.collect_maintenances)
                .unwrap_or(defaults.collect_maintenances),
            collect_quotas: cli
                .collect_quotas
                .or(file.collect_quotas)
                .unwrap_or(defaults.collect_quotas),
            collect_usages: cli
                .collect_usages
                .or(file.collect_usages)
                .unwrap_or(defaults.collect_usages),
        },
        listen_address: cli
            .listen_address
            .or(file.listen_address)
            .unwrap_or_else(|| "0.0.0.0:9043".to_string()),
        metrics_path: cli
            .metrics_path
            .or(file.metrics_path)
            .unwrap_or_else(|| "/metrics".to_string()),
        tls_cert_path: cli.tls_cert_path.or(file.tls_cert_path),
        tls_key_path: cli.tls_key_path.or(file.tls_key_path),
    }
}

/// Look up the config file first in the current directory, then in the
/// user's home directory under `.config/rds_exporter/config.yaml` (spec §6).
#[must_use]
pub fn locate() -> Option<PathBuf> {
    let cwd_candidate = PathBuf::from("rds_exporter.yaml");
    if cwd_candidate.is_file() {
        return Some(cwd_candidate);
    }

    let home_candidate = dirs::home_dir()?.join(".config/rds_exporter/config.yaml");
    home_candidate.is_file().then_some(home_candidate)
}

/// Parse a YAML config file. An absent file is not an error: the caller
/// merges `FileConfig::default()` in that case.
///
/// # Errors
/// Returns an error if the file exists but can't be read or parsed as YAML.
pub fn load(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing config file {} as YAML", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_partial_config_file() {
        let yaml = "aws_regions:\n  - us-east-1\n  - eu-west-1\ncollect_usages: false\n";
        let config: FileConfig = serde_yaml::from_str(yaml).expect("valid yaml");
        assert_eq!(
            config.aws_regions,
            Some(vec!["us-east-1".to_string(), "eu-west-1".to_string()])
        );
        assert_eq!(config.collect_usages, Some(false));
        assert_eq!(config.collect_quotas, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        let yaml = "aws_regions:\n  - us-east-1\nnonexistent_key: true\n";
        let result: Result<FileConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn empty_file_yields_all_none() {
        let config: FileConfig = serde_yaml::from_str("").expect("empty yaml is valid");
        assert!(config.aws_regions.is_none());
        assert!(config.listen_address.is_none());
    }

    #[test]
    fn cli_overrides_win_over_file() {
        let file = FileConfig {
            listen_address: Some("127.0.0.1:9000".to_string()),
            collect_usages: Some(false),
            ..FileConfig::default()
        };
        let cli = CliOverrides {
            listen_address: Some("0.0.0.0:9100".to_string()),
            ..CliOverrides::default()
        };

        let merged = merge(cli, file);
        assert_eq!(merged.listen_address, "0.0.0.0:9100");
        assert!(!merged.collector.collect_usages);
    }

    #[test]
    fn file_overrides_win_over_defaults() {
        let file = FileConfig {
            collect_instance_tags: Some(true),
            aws_regions: Some(vec!["ap-southeast-1".to_string()]),
            ..FileConfig::default()
        };

        let merged = merge(CliOverrides::default(), file);
        assert!(merged.collector.collect_instance_tags);
        assert_eq!(merged.aws_regions, vec!["ap-southeast-1".to_string()]);
    }

    #[test]
    fn absent_everywhere_falls_back_to_builtin_defaults() {
        let merged = merge(CliOverrides::default(), FileConfig::default());
        assert_eq!(merged.listen_address, "0.0.0.0:9043");
        assert_eq!(merged.metrics_path, "/metrics");
        assert!(merged.collector.collect_instance_metrics);
        assert!(!merged.collector.collect_instance_tags);
        assert!(merged.aws_regions.is_empty());
    }
}
