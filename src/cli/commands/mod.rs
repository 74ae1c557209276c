use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// One `--collect-NAME` / `--no-collect-NAME` flag pair, mirroring the
/// teacher's `--collector.NAME`/`--no-collector.NAME` convention but against
/// a fixed set of seven booleans (spec §6) rather than a dynamic collector
/// registry.
fn collect_flag_pair(cmd: Command, name: &'static str, help: &'static str) -> Command {
    let env_name = format!(
        "PROMETHEUS_RDS_EXPORTER_COLLECT_{}",
        name.to_ascii_uppercase().replace('-', "_")
    );
    let no_env_name = format!(
        "PROMETHEUS_RDS_EXPORTER_NO_COLLECT_{}",
        name.to_ascii_uppercase().replace('-', "_")
    );
    cmd.arg(
        Arg::new(format!("collect-{name}"))
            .long(format!("collect-{name}"))
            .help(help)
            .env(env_name)
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new(format!("no-collect-{name}"))
            .long(format!("no-collect-{name}"))
            .help(format!("Disable: {help}"))
            .env(no_env_name)
            .action(ArgAction::SetTrue),
    )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let cmd = Command::new("rds-exporter")
        .about("AWS RDS metric exporter for Prometheus")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(built_info::GIT_COMMIT_HASH.unwrap_or("unknown"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a YAML config file, overriding the default lookup")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("aws-regions")
                .long("aws-regions")
                .help("Comma-separated list of AWS regions to scrape")
                .env("PROMETHEUS_RDS_EXPORTER_AWS_REGIONS")
                .value_name("us-east-1,eu-west-1,...")
                .value_delimiter(',')
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("aws-assume-role-arn")
                .long("aws-assume-role-arn")
                .help("IAM role ARN to assume in every configured region")
                .env("PROMETHEUS_RDS_EXPORTER_AWS_ASSUME_ROLE_ARN")
                .value_name("ARN"),
        )
        .arg(
            Arg::new("aws-assume-role-session")
                .long("aws-assume-role-session")
                .help("Session name used when assuming aws-assume-role-arn")
                .env("PROMETHEUS_RDS_EXPORTER_AWS_ASSUME_ROLE_SESSION")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("listen-address")
                .long("listen-address")
                .help("Address to listen on for HTTP requests")
                .env("PROMETHEUS_RDS_EXPORTER_LISTEN_ADDRESS")
                .value_name("HOST:PORT"),
        )
        .arg(
            Arg::new("metrics-path")
                .long("metrics-path")
                .help("Path under which to expose metrics")
                .env("PROMETHEUS_RDS_EXPORTER_METRICS_PATH")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("tls-cert-path")
                .long("tls-cert-path")
                .help("PEM certificate path; enables TLS together with tls-key-path")
                .env("PROMETHEUS_RDS_EXPORTER_TLS_CERT_PATH")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("tls-key-path")
                .long("tls-key-path")
                .help("PEM private key path; enables TLS together with tls-cert-path")
                .env("PROMETHEUS_RDS_EXPORTER_TLS_KEY_PATH")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug-level logging")
                .env("PROMETHEUS_RDS_EXPORTER_DEBUG")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .help("Log output format")
                .env("PROMETHEUS_RDS_EXPORTER_LOG_FORMAT")
                .value_parser(["text", "json"])
                .default_value("text"),
        );

    let cmd = collect_flag_pair(
        cmd,
        "instance-metrics",
        "Collect per-instance CloudWatch time-series metrics",
    );
    let cmd = collect_flag_pair(cmd, "instance-tags", "Collect per-instance tags as labels");
    let cmd = collect_flag_pair(
        cmd,
        "instance-types",
        "Collect per-instance-class hardware characteristics",
    );
    let cmd = collect_flag_pair(cmd, "logs-size", "Collect log file size totals");
    let cmd = collect_flag_pair(
        cmd,
        "maintenances",
        "Collect pending maintenance action labels",
    );
    let cmd = collect_flag_pair(cmd, "quotas", "Collect account service quotas");
    collect_flag_pair(cmd, "usages", "Collect account-level usage metrics")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();
        assert_eq!(command.get_name(), "rds-exporter");
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_aws_regions_parsing() {
        let command = new();
        let matches = command
            .get_matches_from(vec!["rds-exporter", "--aws-regions", "us-east-1,eu-west-1"]);
        let regions: Vec<String> = matches
            .get_many::<String>("aws-regions")
            .unwrap()
            .map(ToString::to_string)
            .collect();
        assert_eq!(regions, vec!["us-east-1", "eu-west-1"]);
    }

    #[test]
    fn test_collect_flag_pair_defaults_to_unset() {
        let command = new();
        let matches = command.get_matches_from(vec!["rds-exporter"]);
        assert!(!matches.get_flag("collect-quotas"));
        assert!(!matches.get_flag("no-collect-quotas"));
    }

    #[test]
    fn test_no_collect_flag_parses() {
        let command = new();
        let matches = command.get_matches_from(vec!["rds-exporter", "--no-collect-usages"]);
        assert!(matches.get_flag("no-collect-usages"));
    }

    #[test]
    fn test_log_format_rejects_unknown_value() {
        let command = new();
        let result = command.try_get_matches_from(vec!["rds-exporter", "--log-format", "xml"]);
        assert!(result.is_err());
    }
}
