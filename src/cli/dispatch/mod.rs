use crate::cli::actions::{Action, LogFormat};
use crate::config::{self, CliOverrides, FileConfig};
use anyhow::Result;
use std::path::PathBuf;

/// Three-valued boolean flag resolution for a `--collect-X`/`--no-collect-X`
/// pair: the negative flag wins if present (it is meant for overriding a
/// file/default that turned the collector on), otherwise the positive flag,
/// otherwise `None` so the file/default layer decides.
fn flag(matches: &clap::ArgMatches, name: &str) -> Option<bool> {
    if matches.get_flag(&format!("no-collect-{name}")) {
        Some(false)
    } else if matches.get_flag(&format!("collect-{name}")) {
        Some(true)
    } else {
        None
    }
}

fn string_arg(matches: &clap::ArgMatches, name: &str) -> Option<String> {
    matches.get_one::<String>(name).map(ToString::to_string)
}

fn cli_overrides(matches: &clap::ArgMatches) -> CliOverrides {
    CliOverrides {
        aws_regions: matches
            .get_many::<String>("aws-regions")
            .map(|values| values.map(ToString::to_string).collect()),
        aws_assume_role_arn: string_arg(matches, "aws-assume-role-arn"),
        aws_assume_role_session: string_arg(matches, "aws-assume-role-session"),
        collect_instance_metrics: flag(matches, "instance-metrics"),
        collect_instance_tags: flag(matches, "instance-tags"),
        collect_instance_types: flag(matches, "instance-types"),
        collect_logs_size: flag(matches, "logs-size"),
        collect_maintenances: flag(matches, "maintenances"),
        collect_quotas: flag(matches, "quotas"),
        collect_usages: flag(matches, "usages"),
        listen_address: string_arg(matches, "listen-address"),
        metrics_path: string_arg(matches, "metrics-path"),
        tls_cert_path: string_arg(matches, "tls-cert-path"),
        tls_key_path: string_arg(matches, "tls-key-path"),
    }
}

/// Resolve matches into the fully merged `Action::Run`.
///
/// # Errors
/// Returns an error if an explicit `--config` path, or a located default
/// config path, exists but cannot be read or parsed as YAML.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let file = match string_arg(matches, "config").map(PathBuf::from).or_else(config::locate) {
        Some(path) => config::load(&path)?,
        None => FileConfig::default(),
    };

    let config = config::merge(cli_overrides(matches), file);

    let log_format = match string_arg(matches, "log-format").as_deref() {
        Some("json") => LogFormat::Json,
        _ => LogFormat::Text,
    };

    Ok(Action::Run {
        config,
        debug: matches.get_flag("debug"),
        log_format,
    })
}
