//! Static metric descriptor table, used by `Collector::describe` (spec §4.1)
//! and by the emission code in `collector::emit` as the single source of
//! truth for names, help text, and label ordering.
//!
//! `rds_instance_tags` is deliberately absent here: its label set depends on
//! the tags observed during a scrape and is documented as the one exception
//! to "describe is independent of any live fetch" (spec §9).

use super::fetchers::TIMESERIES_METRICS;

pub const INSTANCE_LABELS: &[&str] = &["aws_account_id", "aws_region", "dbidentifier"];
pub const TYPE_LABELS: &[&str] = &["aws_account_id", "aws_region", "instance_class"];
pub const ACCOUNT_LABELS: &[&str] = &["aws_account_id", "aws_region"];

#[derive(Debug, Clone, Copy)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

pub const INSTANCE_INFO_LABELS: &[&str] = &[
    "aws_account_id",
    "aws_region",
    "dbidentifier",
    "resource_id",
    "arn",
    "engine",
    "engine_version",
    "instance_class",
    "storage_type",
    "role",
    "source_dbidentifier",
    "pending_maintenance_action",
    "multi_az",
    "deletion_protection",
    "performance_insights_enabled",
];

const STATIC_DESCRIPTORS: &[MetricDescriptor] = &[
    MetricDescriptor {
        name: "rds_exporter_build_info",
        help: "Exporter build information, value is always 1",
        labels: &["aws_account_id", "aws_region", "version", "commit"],
    },
    MetricDescriptor {
        name: "rds_exporter_errors_total",
        help: "Number of non-fatal errors encountered while scraping",
        labels: ACCOUNT_LABELS,
    },
    MetricDescriptor {
        name: "up",
        help: "Whether the last scrape of this region's inventory succeeded",
        labels: ACCOUNT_LABELS,
    },
    MetricDescriptor {
        name: "rds_api_call_total",
        help: "Number of upstream API calls issued, by source",
        labels: &["aws_account_id", "aws_region", "api"],
    },
    MetricDescriptor {
        name: "rds_instance_info",
        help: "Static descriptive information about an RDS instance, value is always 1",
        labels: INSTANCE_INFO_LABELS,
    },
    MetricDescriptor {
        name: "rds_instance_status",
        help: "RDS instance status, mapped to a fixed integer enumeration",
        labels: INSTANCE_LABELS,
    },
    MetricDescriptor {
        name: "rds_instance_age_seconds",
        help: "Time since the instance was created",
        labels: INSTANCE_LABELS,
    },
    MetricDescriptor {
        name: "rds_allocated_storage_bytes",
        help: "Allocated storage",
        labels: INSTANCE_LABELS,
    },
    MetricDescriptor {
        name: "rds_max_allocated_storage_bytes",
        help: "Maximum allocated storage under storage autoscaling",
        labels: INSTANCE_LABELS,
    },
    MetricDescriptor {
        name: "rds_max_disk_iops_average",
        help: "Provisioned IOPS",
        labels: INSTANCE_LABELS,
    },
    MetricDescriptor {
        name: "rds_max_storage_throughput_bytes",
        help: "Provisioned storage throughput",
        labels: INSTANCE_LABELS,
    },
    MetricDescriptor {
        name: "rds_backup_retention_period_seconds",
        help: "Backup retention period",
        labels: INSTANCE_LABELS,
    },
    MetricDescriptor {
        name: "rds_certificate_expiry_timestamp_seconds",
        help: "Unix timestamp at which the instance's SSL/TLS certificate expires",
        labels: INSTANCE_LABELS,
    },
    MetricDescriptor {
        name: "rds_instance_log_files_size_bytes",
        help: "Total size of the instance's log files",
        labels: INSTANCE_LABELS,
    },
    MetricDescriptor {
        name: "rds_instance_vcpu_average",
        help: "Number of vCPUs for this instance class",
        labels: TYPE_LABELS,
    },
    MetricDescriptor {
        name: "rds_instance_memory_bytes",
        help: "Memory available for this instance class",
        labels: TYPE_LABELS,
    },
    MetricDescriptor {
        name: "rds_instance_max_iops_average",
        help: "Maximum IOPS for this instance class",
        labels: TYPE_LABELS,
    },
    MetricDescriptor {
        name: "rds_instance_max_throughput_bytes",
        help: "Maximum storage throughput for this instance class",
        labels: TYPE_LABELS,
    },
    MetricDescriptor {
        name: "rds_quota_db_instances",
        help: "Account quota: maximum number of DB instances",
        labels: ACCOUNT_LABELS,
    },
    MetricDescriptor {
        name: "rds_quota_total_storage_bytes",
        help: "Account quota: maximum total allocated storage",
        labels: ACCOUNT_LABELS,
    },
    MetricDescriptor {
        name: "rds_quota_manual_db_instance_snapshots",
        help: "Account quota: maximum number of manual DB snapshots",
        labels: ACCOUNT_LABELS,
    },
    MetricDescriptor {
        name: "rds_usage_allocated_storage_bytes",
        help: "Account usage: current total allocated storage",
        labels: ACCOUNT_LABELS,
    },
    MetricDescriptor {
        name: "rds_usage_db_instances",
        help: "Account usage: current number of DB instances",
        labels: ACCOUNT_LABELS,
    },
    MetricDescriptor {
        name: "rds_usage_manual_snapshots",
        help: "Account usage: current number of manual DB snapshots",
        labels: ACCOUNT_LABELS,
    },
];

/// The full static descriptor set: the fixed table above plus one entry per
/// time-series gauge (spec §3's 24 named series).
#[must_use]
pub fn all() -> Vec<MetricDescriptor> {
    let mut descriptors = STATIC_DESCRIPTORS.to_vec();
    descriptors.extend(TIMESERIES_METRICS.iter().map(|m| MetricDescriptor {
        name: m.prom_name,
        help: m.help,
        labels: INSTANCE_LABELS,
    }));
    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_set_has_no_duplicate_names() {
        let descriptors = all();
        let mut names: Vec<&str> = descriptors.iter().map(|d| d.name).collect();
        names.sort_unstable();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names, deduped);
    }

    #[test]
    fn includes_all_24_timeseries_descriptors() {
        let descriptors = all();
        let count = descriptors
            .iter()
            .filter(|d| TIMESERIES_METRICS.iter().any(|m| m.prom_name == d.name))
            .count();
        assert_eq!(count, TIMESERIES_METRICS.len());
    }
}
