//! Shared data model and fetcher traits.
//!
//! Each fetcher is a narrow async trait with exactly one production
//! implementation, backed by one AWS SDK client, plus a test double. The
//! `Collector` never talks to an AWS SDK client directly — only through
//! these traits — so `collector::tests` can exercise the join/isolation
//! contract (spec §8 property 4) without any network access.

pub mod instance_type;
pub mod inventory;
pub mod quota;
pub mod timeseries;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Error returned by a fetcher. Every variant is "degrading" except
/// `Inventory`, which the `Collector` treats as fatal-to-scrape (spec §7).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("describing instances: {0}")]
    Inventory(String),

    #[error("fetching instance metrics: {0}")]
    Timeseries(String),

    #[error("fetching account usage: {0}")]
    Usage(String),

    #[error("fetching instance types: {0}")]
    InstanceType(String),

    #[error("fetching quota {quota_code}: {message}")]
    Quota { quota_code: String, message: String },

    #[error("unknown time-series metric requested: {0}")]
    UnknownMetric(String),
}

/// One observed RDS instance, after deriving the fields the upstream API
/// doesn't hand over directly (role, age, pending-maintenance label, ...).
#[derive(Debug, Clone, Default)]
pub struct Instance {
    pub dbidentifier: String,
    pub resource_id: String,
    pub arn: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub storage_type: String,
    pub role: Role,
    pub source_dbidentifier: Option<String>,
    pub allocated_storage_bytes: u64,
    pub max_allocated_storage_bytes: Option<u64>,
    pub provisioned_iops: Option<f64>,
    pub storage_throughput_bytes: Option<f64>,
    pub backup_retention_seconds: u64,
    pub status: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub cert_expiry: Option<chrono::DateTime<chrono::Utc>>,
    pub pending_modified: bool,
    pub pending_maintenance_action: String,
    pub multi_az: bool,
    pub deletion_protection: bool,
    pub performance_insights_enabled: bool,
    pub log_files_size_bytes: Option<u64>,
    pub age_seconds: Option<i64>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Primary,
    Replica,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Replica => "replica",
        }
    }

    #[must_use]
    pub fn from_source_identifier(source: Option<&str>) -> Self {
        match source {
            Some(s) if !s.is_empty() => Self::Replica,
            _ => Self::Primary,
        }
    }
}

/// Result of the inventory fetch: every observed instance plus the number of
/// upstream API calls it took.
#[derive(Debug, Default)]
pub struct InventoryResult {
    pub instances: BTreeMap<String, Instance>,
    pub api_calls: u64,
}

#[async_trait]
pub trait InventoryFetcher: Send + Sync {
    async fn get_instances_metrics(
        &self,
        collect_maintenances: bool,
        collect_logs_size: bool,
    ) -> Result<InventoryResult, FetchError>;
}

/// The 24 named CloudWatch series this exporter tracks per instance, plus
/// the Prometheus name each is rendered under.
pub struct TimeseriesMetric {
    pub cloudwatch_name: &'static str,
    pub field: &'static str,
    pub prom_name: &'static str,
    pub help: &'static str,
}

pub const TIMESERIES_METRICS: &[TimeseriesMetric] = &[
    TimeseriesMetric { cloudwatch_name: "CPUUtilization", field: "cpu_utilization", prom_name: "rds_cpu_usage_percent_average", help: "CPU utilization as a percentage" },
    TimeseriesMetric { cloudwatch_name: "FreeableMemory", field: "freeable_memory", prom_name: "rds_freeable_memory_bytes", help: "Available RAM" },
    TimeseriesMetric { cloudwatch_name: "DatabaseConnections", field: "database_connections", prom_name: "rds_database_connections_average", help: "Number of database connections in use" },
    TimeseriesMetric { cloudwatch_name: "ReadIOPS", field: "read_iops", prom_name: "rds_read_iops_average", help: "Average number of disk read I/O operations per second" },
    TimeseriesMetric { cloudwatch_name: "WriteIOPS", field: "write_iops", prom_name: "rds_write_iops_average", help: "Average number of disk write I/O operations per second" },
    TimeseriesMetric { cloudwatch_name: "ReadLatency", field: "read_latency", prom_name: "rds_read_latency_average", help: "Average amount of time taken per disk read I/O operation in seconds" },
    TimeseriesMetric { cloudwatch_name: "WriteLatency", field: "write_latency", prom_name: "rds_write_latency_average", help: "Average amount of time taken per disk write I/O operation in seconds" },
    TimeseriesMetric { cloudwatch_name: "ReadThroughput", field: "read_throughput", prom_name: "rds_read_throughput_bytes", help: "Average number of bytes read from disk per second" },
    TimeseriesMetric { cloudwatch_name: "WriteThroughput", field: "write_throughput", prom_name: "rds_write_throughput_bytes", help: "Average number of bytes written to disk per second" },
    TimeseriesMetric { cloudwatch_name: "SwapUsage", field: "swap_usage", prom_name: "rds_swap_usage_bytes", help: "Amount of swap space used" },
    TimeseriesMetric { cloudwatch_name: "DiskQueueDepth", field: "disk_queue_depth", prom_name: "rds_disk_queue_depth_average", help: "Number of outstanding read/write requests waiting to access disk" },
    TimeseriesMetric { cloudwatch_name: "ReplicaLag", field: "replica_lag", prom_name: "rds_replica_lag_seconds", help: "Amount of time a read replica lags behind its source instance" },
    TimeseriesMetric { cloudwatch_name: "BinLogDiskUsage", field: "bin_log_disk_usage", prom_name: "rds_bin_log_disk_usage_bytes", help: "Disk space occupied by binary log files" },
    TimeseriesMetric { cloudwatch_name: "TransactionLogsDiskUsage", field: "transaction_logs_disk_usage", prom_name: "rds_transaction_logs_disk_usage_bytes", help: "Disk space used by transaction logs" },
    TimeseriesMetric { cloudwatch_name: "TransactionLogsGeneration", field: "transaction_logs_generation", prom_name: "rds_transaction_logs_generation_bytes", help: "Size of transaction logs generated per second" },
    TimeseriesMetric { cloudwatch_name: "OldestReplicationSlotLag", field: "oldest_replication_slot_lag", prom_name: "rds_oldest_replication_slot_lag_bytes", help: "Lag in bytes between the last replayed WAL and the oldest replication slot" },
    TimeseriesMetric { cloudwatch_name: "MaximumUsedTransactionIDs", field: "maximum_used_transaction_ids", prom_name: "rds_maximum_used_transaction_ids_average", help: "Maximum transaction ID age in use" },
    TimeseriesMetric { cloudwatch_name: "FreeStorageSpace", field: "free_storage_space", prom_name: "rds_free_storage_space_bytes", help: "Available storage space" },
    TimeseriesMetric { cloudwatch_name: "FreeLocalStorage", field: "free_local_storage", prom_name: "rds_free_local_storage_bytes", help: "Available local storage space (Aurora/Multi-AZ DB cluster)" },
    TimeseriesMetric { cloudwatch_name: "NetworkReceiveThroughput", field: "network_receive_throughput", prom_name: "rds_network_receive_throughput_bytes", help: "Incoming network traffic on the instance" },
    TimeseriesMetric { cloudwatch_name: "NetworkTransmitThroughput", field: "network_transmit_throughput", prom_name: "rds_network_transmit_throughput_bytes", help: "Outgoing network traffic on the instance" },
    TimeseriesMetric { cloudwatch_name: "CPUCreditBalance", field: "cpu_credit_balance", prom_name: "rds_cpu_credit_balance_average", help: "Burstable-performance CPU credit balance" },
    TimeseriesMetric { cloudwatch_name: "CPUCreditUsage", field: "cpu_credit_usage", prom_name: "rds_cpu_credit_usage_average", help: "Burstable-performance CPU credits spent" },
    TimeseriesMetric { cloudwatch_name: "BurstBalance", field: "burst_balance", prom_name: "rds_burst_balance_average", help: "Percent of burst-bucket I/O credits remaining" },
];

/// Most-recent per-minute average for each of the 24 series above. Every
/// field is optional: absence means the series returned no datapoints in the
/// scrape window, and is distinct from a present value of zero.
#[derive(Debug, Clone, Default)]
pub struct TimeseriesSample {
    pub cpu_utilization: Option<f64>,
    pub freeable_memory: Option<f64>,
    pub database_connections: Option<f64>,
    pub read_iops: Option<f64>,
    pub write_iops: Option<f64>,
    pub read_latency: Option<f64>,
    pub write_latency: Option<f64>,
    pub read_throughput: Option<f64>,
    pub write_throughput: Option<f64>,
    pub swap_usage: Option<f64>,
    pub disk_queue_depth: Option<f64>,
    pub replica_lag: Option<f64>,
    pub bin_log_disk_usage: Option<f64>,
    pub transaction_logs_disk_usage: Option<f64>,
    pub transaction_logs_generation: Option<f64>,
    pub oldest_replication_slot_lag: Option<f64>,
    pub maximum_used_transaction_ids: Option<f64>,
    pub free_storage_space: Option<f64>,
    pub free_local_storage: Option<f64>,
    pub network_receive_throughput: Option<f64>,
    pub network_transmit_throughput: Option<f64>,
    pub cpu_credit_balance: Option<f64>,
    pub cpu_credit_usage: Option<f64>,
    pub burst_balance: Option<f64>,
}

impl TimeseriesSample {
    /// Set the field named by `field` (one of `TIMESERIES_METRICS[..].field`).
    pub fn set(&mut self, field: &str, value: f64) {
        match field {
            "cpu_utilization" => self.cpu_utilization = Some(value),
            "freeable_memory" => self.freeable_memory = Some(value),
            "database_connections" => self.database_connections = Some(value),
            "read_iops" => self.read_iops = Some(value),
            "write_iops" => self.write_iops = Some(value),
            "read_latency" => self.read_latency = Some(value),
            "write_latency" => self.write_latency = Some(value),
            "read_throughput" => self.read_throughput = Some(value),
            "write_throughput" => self.write_throughput = Some(value),
            "swap_usage" => self.swap_usage = Some(value),
            "disk_queue_depth" => self.disk_queue_depth = Some(value),
            "replica_lag" => self.replica_lag = Some(value),
            "bin_log_disk_usage" => self.bin_log_disk_usage = Some(value),
            "transaction_logs_disk_usage" => self.transaction_logs_disk_usage = Some(value),
            "transaction_logs_generation" => self.transaction_logs_generation = Some(value),
            "oldest_replication_slot_lag" => self.oldest_replication_slot_lag = Some(value),
            "maximum_used_transaction_ids" => self.maximum_used_transaction_ids = Some(value),
            "free_storage_space" => self.free_storage_space = Some(value),
            "free_local_storage" => self.free_local_storage = Some(value),
            "network_receive_throughput" => self.network_receive_throughput = Some(value),
            "network_transmit_throughput" => self.network_transmit_throughput = Some(value),
            "cpu_credit_balance" => self.cpu_credit_balance = Some(value),
            "cpu_credit_usage" => self.cpu_credit_usage = Some(value),
            "burst_balance" => self.burst_balance = Some(value),
            other => tracing::warn!(field = other, "unrecognized time-series field, dropping"),
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<f64> {
        match field {
            "cpu_utilization" => self.cpu_utilization,
            "freeable_memory" => self.freeable_memory,
            "database_connections" => self.database_connections,
            "read_iops" => self.read_iops,
            "write_iops" => self.write_iops,
            "read_latency" => self.read_latency,
            "write_latency" => self.write_latency,
            "read_throughput" => self.read_throughput,
            "write_throughput" => self.write_throughput,
            "swap_usage" => self.swap_usage,
            "disk_queue_depth" => self.disk_queue_depth,
            "replica_lag" => self.replica_lag,
            "bin_log_disk_usage" => self.bin_log_disk_usage,
            "transaction_logs_disk_usage" => self.transaction_logs_disk_usage,
            "transaction_logs_generation" => self.transaction_logs_generation,
            "oldest_replication_slot_lag" => self.oldest_replication_slot_lag,
            "maximum_used_transaction_ids" => self.maximum_used_transaction_ids,
            "free_storage_space" => self.free_storage_space,
            "free_local_storage" => self.free_local_storage,
            "network_receive_throughput" => self.network_receive_throughput,
            "network_transmit_throughput" => self.network_transmit_throughput,
            "cpu_credit_balance" => self.cpu_credit_balance,
            "cpu_credit_usage" => self.cpu_credit_usage,
            "burst_balance" => self.burst_balance,
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct TimeseriesResult {
    pub per_instance: BTreeMap<String, TimeseriesSample>,
    pub api_calls: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub allocated_storage_bytes: Option<u64>,
    pub db_instances: Option<f64>,
    pub manual_snapshots: Option<f64>,
}

#[async_trait]
pub trait TimeseriesFetcher: Send + Sync {
    async fn get_rds_instance_metrics(
        &self,
        dbidentifiers: &[String],
    ) -> Result<TimeseriesResult, FetchError>;

    async fn get_usage_metrics(&self) -> Result<(Usage, u64), FetchError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceType {
    pub vcpu: i64,
    pub memory_bytes: u64,
    pub max_iops: Option<f64>,
    pub max_throughput_bytes: Option<f64>,
}

#[derive(Debug, Default)]
pub struct InstanceTypeResult {
    pub per_type: BTreeMap<String, InstanceType>,
    pub api_calls: u64,
}

#[async_trait]
pub trait InstanceTypeFetcher: Send + Sync {
    async fn get_db_instance_type_information(
        &self,
        instance_classes: &[String],
    ) -> Result<InstanceTypeResult, FetchError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Quotas {
    pub db_instances: f64,
    pub total_storage_bytes: u64,
    pub manual_db_instance_snapshots: f64,
}

#[async_trait]
pub trait QuotaFetcher: Send + Sync {
    async fn get_rds_quotas(&self) -> (Quotas, u64, Vec<FetchError>);
}

#[cfg(test)]
mod tests {
    use super::Role;

    /// Spec §8 property 7: a non-empty source identifier means "replica",
    /// anything else means "primary".
    #[test]
    fn non_empty_source_identifier_yields_replica() {
        assert_eq!(
            Role::from_source_identifier(Some("source-db")),
            Role::Replica
        );
    }

    #[test]
    fn absent_source_identifier_yields_primary() {
        assert_eq!(Role::from_source_identifier(None), Role::Primary);
    }

    #[test]
    fn empty_source_identifier_yields_primary() {
        assert_eq!(Role::from_source_identifier(Some("")), Role::Primary);
    }
}
