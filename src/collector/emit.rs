//! Renders one scrape's fetch results into Prometheus text exposition.
//!
//! Every gauge here is built fresh per scrape in a throwaway `Registry`
//! (spec §9: "do not allocate per scrape except the dynamic tags
//! descriptor" refers to the *static* descriptor set, not these ephemeral
//! value containers). No state here outlives one call to `render`.

use super::fetchers::{Instance, InstanceType, Quotas, TimeseriesSample, Usage, TIMESERIES_METRICS};
use super::status::InstanceStatus;
use prometheus::{GaugeVec, Opts, Registry, TextEncoder};
use std::collections::{BTreeMap, BTreeSet};

#[allow(clippy::expect_used)]
fn gauge_vec(registry: &Registry, name: &'static str, help: &'static str, labels: &[&str]) -> GaugeVec {
    let gauge = GaugeVec::new(Opts::new(name, help), labels)
        .expect("metric definition is well-formed: name and labels are static constants");
    registry
        .register(Box::new(gauge.clone()))
        .expect("metric registers exactly once per scrape: each name used by only one call site");
    gauge
}

/// Replace any character outside `[A-Za-z0-9_]` with `_` and prefix `tag_`
/// so tag keys can never collide with a fixed label name (spec §4.1).
#[must_use]
pub fn sanitize_tag_key(key: &str) -> String {
    let mut sanitized = String::with_capacity(key.len() + 4);
    sanitized.push_str("tag_");
    for ch in key.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            sanitized.push(ch);
        } else {
            sanitized.push('_');
        }
    }
    sanitized
}

#[allow(clippy::too_many_arguments)]
pub struct ScrapeOutcome<'a> {
    pub account_id: &'a str,
    pub region: &'a str,
    pub up: bool,
    pub instances: &'a BTreeMap<String, Instance>,
    pub timeseries: Option<&'a BTreeMap<String, TimeseriesSample>>,
    pub instance_types: Option<&'a BTreeMap<String, InstanceType>>,
    pub quotas: Option<&'a Quotas>,
    pub usage: Option<&'a Usage>,
    pub collect_instance_tags: bool,
}

/// Render everything this scrape produced except `rds_exporter_build_info`,
/// `rds_api_call_total` and `rds_exporter_errors_total`, which live on the
/// `Collector`'s persistent `Counters` instead (spec §5: counters persist
/// across scrapes, everything else here is discarded after rendering).
#[must_use]
pub fn render(outcome: &ScrapeOutcome) -> String {
    let registry = Registry::new();

    let up = gauge_vec(
        &registry,
        "up",
        "Whether the last scrape of this region's inventory succeeded",
        super::descriptors::ACCOUNT_LABELS,
    );
    up.with_label_values(&[outcome.account_id, outcome.region])
        .set(if outcome.up { 1.0 } else { 0.0 });

    if outcome.up {
        render_instances(&registry, outcome);
        if let Some(timeseries) = outcome.timeseries {
            render_timeseries(&registry, outcome, timeseries);
        }
        if let Some(types) = outcome.instance_types {
            render_instance_types(&registry, outcome, types);
        }
        if let Some(quotas) = outcome.quotas {
            render_quotas(&registry, outcome, quotas);
        }
        if let Some(usage) = outcome.usage {
            render_usage(&registry, outcome, usage);
        }
        if outcome.collect_instance_tags {
            render_tags(&registry, outcome);
        }
    }

    let families = registry.gather();
    let mut buffer = Vec::new();
    let _ = TextEncoder::new().encode(&families, &mut buffer);
    String::from_utf8(buffer).unwrap_or_default()
}

fn render_instances(registry: &Registry, outcome: &ScrapeOutcome) {
    let info = gauge_vec(
        registry,
        "rds_instance_info",
        "Static descriptive information about an RDS instance, value is always 1",
        super::descriptors::INSTANCE_INFO_LABELS,
    );
    let status = gauge_vec(
        registry,
        "rds_instance_status",
        "RDS instance status, mapped to a fixed integer enumeration",
        super::descriptors::INSTANCE_LABELS,
    );
    let age = gauge_vec(
        registry,
        "rds_instance_age_seconds",
        "Time since the instance was created",
        super::descriptors::INSTANCE_LABELS,
    );
    let allocated_storage = gauge_vec(
        registry,
        "rds_allocated_storage_bytes",
        "Allocated storage",
        super::descriptors::INSTANCE_LABELS,
    );
    let max_allocated_storage = gauge_vec(
        registry,
        "rds_max_allocated_storage_bytes",
        "Maximum allocated storage under storage autoscaling",
        super::descriptors::INSTANCE_LABELS,
    );
    let max_iops = gauge_vec(
        registry,
        "rds_max_disk_iops_average",
        "Provisioned IOPS",
        super::descriptors::INSTANCE_LABELS,
    );
    let max_throughput = gauge_vec(
        registry,
        "rds_max_storage_throughput_bytes",
        "Provisioned storage throughput",
        super::descriptors::INSTANCE_LABELS,
    );
    let backup_retention = gauge_vec(
        registry,
        "rds_backup_retention_period_seconds",
        "Backup retention period",
        super::descriptors::INSTANCE_LABELS,
    );
    let cert_expiry = gauge_vec(
        registry,
        "rds_certificate_expiry_timestamp_seconds",
        "Unix timestamp at which the instance's SSL/TLS certificate expires",
        super::descriptors::INSTANCE_LABELS,
    );
    let log_files_size = gauge_vec(
        registry,
        "rds_instance_log_files_size_bytes",
        "Total size of the instance's log files",
        super::descriptors::INSTANCE_LABELS,
    );

    for instance in outcome.instances.values() {
        let labels = [outcome.account_id, outcome.region, &instance.dbidentifier];

        info.with_label_values(&[
            outcome.account_id,
            outcome.region,
            &instance.dbidentifier,
            &instance.resource_id,
            &instance.arn,
            &instance.engine,
            &instance.engine_version,
            &instance.instance_class,
            &instance.storage_type,
            instance.role.as_str(),
            instance.source_dbidentifier.as_deref().unwrap_or(""),
            &instance.pending_maintenance_action,
            bool_str(instance.multi_az),
            bool_str(instance.deletion_protection),
            bool_str(instance.performance_insights_enabled),
        ])
        .set(1.0);

        status
            .with_label_values(&labels)
            .set(InstanceStatus::from_upstream(&instance.status).code() as f64);

        if let Some(age_seconds) = instance.age_seconds {
            #[allow(clippy::cast_precision_loss)]
            age.with_label_values(&labels).set(age_seconds as f64);
        }

        #[allow(clippy::cast_precision_loss)]
        allocated_storage
            .with_label_values(&labels)
            .set(instance.allocated_storage_bytes as f64);

        if let Some(value) = instance.max_allocated_storage_bytes {
            #[allow(clippy::cast_precision_loss)]
            max_allocated_storage.with_label_values(&labels).set(value as f64);
        }

        if let Some(value) = instance.provisioned_iops {
            max_iops.with_label_values(&labels).set(value);
        }

        if let Some(value) = instance.storage_throughput_bytes {
            max_throughput.with_label_values(&labels).set(value);
        }

        #[allow(clippy::cast_precision_loss)]
        backup_retention
            .with_label_values(&labels)
            .set(instance.backup_retention_seconds as f64);

        if let Some(expiry) = instance.cert_expiry {
            #[allow(clippy::cast_precision_loss)]
            cert_expiry.with_label_values(&labels).set(expiry.timestamp() as f64);
        }

        if let Some(value) = instance.log_files_size_bytes {
            #[allow(clippy::cast_precision_loss)]
            log_files_size.with_label_values(&labels).set(value as f64);
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn render_timeseries(
    registry: &Registry,
    outcome: &ScrapeOutcome,
    timeseries: &BTreeMap<String, TimeseriesSample>,
) {
    let gauges: Vec<GaugeVec> = TIMESERIES_METRICS
        .iter()
        .map(|m| {
            gauge_vec(
                registry,
                m.prom_name,
                m.help,
                super::descriptors::INSTANCE_LABELS,
            )
        })
        .collect();

    for (dbidentifier, sample) in timeseries {
        if !outcome.instances.contains_key(dbidentifier) {
            continue;
        }
        let labels = [outcome.account_id, outcome.region, dbidentifier.as_str()];
        for (metric, gauge) in TIMESERIES_METRICS.iter().zip(&gauges) {
            if let Some(value) = sample.get(metric.field) {
                gauge.with_label_values(&labels).set(value);
            }
        }
    }
}

fn render_instance_types(
    registry: &Registry,
    outcome: &ScrapeOutcome,
    types: &BTreeMap<String, InstanceType>,
) {
    let vcpu = gauge_vec(
        registry,
        "rds_instance_vcpu_average",
        "Number of vCPUs for this instance class",
        super::descriptors::TYPE_LABELS,
    );
    let memory = gauge_vec(
        registry,
        "rds_instance_memory_bytes",
        "Memory available for this instance class",
        super::descriptors::TYPE_LABELS,
    );
    let max_iops = gauge_vec(
        registry,
        "rds_instance_max_iops_average",
        "Maximum IOPS for this instance class",
        super::descriptors::TYPE_LABELS,
    );
    let max_throughput = gauge_vec(
        registry,
        "rds_instance_max_throughput_bytes",
        "Maximum storage throughput for this instance class",
        super::descriptors::TYPE_LABELS,
    );

    for (instance_class, info) in types {
        let labels = [outcome.account_id, outcome.region, instance_class.as_str()];
        #[allow(clippy::cast_precision_loss)]
        vcpu.with_label_values(&labels).set(info.vcpu as f64);
        #[allow(clippy::cast_precision_loss)]
        memory.with_label_values(&labels).set(info.memory_bytes as f64);
        if let Some(value) = info.max_iops {
            max_iops.with_label_values(&labels).set(value);
        }
        if let Some(value) = info.max_throughput_bytes {
            max_throughput.with_label_values(&labels).set(value);
        }
    }
}

fn render_quotas(registry: &Registry, outcome: &ScrapeOutcome, quotas: &Quotas) {
    let labels = [outcome.account_id, outcome.region];

    gauge_vec(
        registry,
        "rds_quota_db_instances",
        "Account quota: maximum number of DB instances",
        super::descriptors::ACCOUNT_LABELS,
    )
    .with_label_values(&labels)
    .set(quotas.db_instances);

    #[allow(clippy::cast_precision_loss)]
    gauge_vec(
        registry,
        "rds_quota_total_storage_bytes",
        "Account quota: maximum total allocated storage",
        super::descriptors::ACCOUNT_LABELS,
    )
    .with_label_values(&labels)
    .set(quotas.total_storage_bytes as f64);

    gauge_vec(
        registry,
        "rds_quota_manual_db_instance_snapshots",
        "Account quota: maximum number of manual DB snapshots",
        super::descriptors::ACCOUNT_LABELS,
    )
    .with_label_values(&labels)
    .set(quotas.manual_db_instance_snapshots);
}

fn render_usage(registry: &Registry, outcome: &ScrapeOutcome, usage: &Usage) {
    let labels = [outcome.account_id, outcome.region];

    if let Some(value) = usage.allocated_storage_bytes {
        #[allow(clippy::cast_precision_loss)]
        gauge_vec(
            registry,
            "rds_usage_allocated_storage_bytes",
            "Account usage: current total allocated storage",
            super::descriptors::ACCOUNT_LABELS,
        )
        .with_label_values(&labels)
        .set(value as f64);
    }

    if let Some(value) = usage.db_instances {
        gauge_vec(
            registry,
            "rds_usage_db_instances",
            "Account usage: current number of DB instances",
            super::descriptors::ACCOUNT_LABELS,
        )
        .with_label_values(&labels)
        .set(value);
    }

    if let Some(value) = usage.manual_snapshots {
        gauge_vec(
            registry,
            "rds_usage_manual_snapshots",
            "Account usage: current number of manual DB snapshots",
            super::descriptors::ACCOUNT_LABELS,
        )
        .with_label_values(&labels)
        .set(value);
    }
}

/// `rds_instance_tags`: one gauge whose label set is the union of every
/// sanitized tag key observed on any instance this scrape, plus the fixed
/// instance labels. Instances missing a given tag get an empty-string value
/// for that label (spec §4.1, property 5).
fn render_tags(registry: &Registry, outcome: &ScrapeOutcome) {
    let mut sanitized_names: BTreeSet<String> = BTreeSet::new();
    for instance in outcome.instances.values() {
        for key in instance.tags.keys() {
            sanitized_names.insert(sanitize_tag_key(key));
        }
    }

    if sanitized_names.is_empty() {
        return;
    }

    let mut labels: Vec<&str> = super::descriptors::INSTANCE_LABELS.to_vec();
    labels.extend(sanitized_names.iter().map(String::as_str));

    let tags_gauge = gauge_vec(
        registry,
        "rds_instance_tags",
        "Presence of instance tags as labels, value is always 0",
        &labels,
    );

    for instance in outcome.instances.values() {
        // BTreeMap iterates in sorted key order, so the first original key
        // that sanitizes to a given name wins ties deterministically.
        let mut by_sanitized: BTreeMap<&str, &str> = BTreeMap::new();
        let sanitized_owned: Vec<String> =
            instance.tags.keys().map(|k| sanitize_tag_key(k)).collect();
        for (original, sanitized) in instance.tags.keys().zip(sanitized_owned.iter()) {
            by_sanitized
                .entry(sanitized.as_str())
                .or_insert_with(|| instance.tags.get(original).map_or("", String::as_str));
        }

        let mut values = vec![
            outcome.account_id,
            outcome.region,
            instance.dbidentifier.as_str(),
        ];
        values.extend(
            sanitized_names
                .iter()
                .map(|name| by_sanitized.get(name.as_str()).copied().unwrap_or("")),
        );

        tags_gauge.with_label_values(&values).set(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_non_alphanumeric_characters() {
        assert_eq!(sanitize_tag_key("team:owner"), "tag_team_owner");
        assert_eq!(sanitize_tag_key("cost-center"), "tag_cost_center");
        assert_eq!(sanitize_tag_key("Env"), "tag_Env");
    }

    #[test]
    fn sanitized_keys_always_match_label_pattern() {
        for key in ["a.b/c", "x y", "???", "already_ok"] {
            let sanitized = sanitize_tag_key(key);
            assert!(sanitized.starts_with("tag_"));
            assert!(sanitized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }
}
