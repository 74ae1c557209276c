use super::{FetchError, Instance, InventoryFetcher, InventoryResult, Role};
use crate::aws::RegionClients;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{instrument, warn};

pub struct RdsInventoryFetcher {
    clients: RegionClients,
}

impl RdsInventoryFetcher {
    #[must_use]
    pub fn new(clients: RegionClients) -> Self {
        Self { clients }
    }

    /// `describe-pending-maintenance-actions`, called once per fetch.
    /// A failure here is degrading (spec §4.2): it leaves every instance's
    /// `pending_maintenance_action` at its default empty string.
    async fn pending_maintenance_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        let mut marker: Option<String> = None;

        loop {
            let mut req = self.clients.rds.describe_pending_maintenance_actions();
            if let Some(m) = marker.clone() {
                req = req.marker(m);
            }

            let resp = match req.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    warn!(error = %err, "describe_pending_maintenance_actions failed; pending-maintenance labels unset this scrape");
                    return labels;
                }
            };

            for action in resp.pending_maintenance_actions() {
                let Some(id) = action.resource_identifier() else {
                    continue;
                };
                // ARN of form arn:aws:rds:<region>:<account>:db:<dbidentifier>
                let Some(dbidentifier) = id.rsplit(':').next() else {
                    continue;
                };
                if let Some(detail) = action.pending_maintenance_action_details().first() {
                    if let Some(action_name) = detail.action() {
                        labels.insert(dbidentifier.to_string(), action_name.to_string());
                    }
                }
            }

            marker = resp.marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }

        labels
    }

    /// `describe-db-log-files`, one call per instance, summed. A per-instance
    /// failure is degrading and leaves that instance's log size unset.
    async fn log_files_size_bytes(&self, dbidentifier: &str) -> (Option<u64>, u64) {
        let mut total: u64 = 0;
        let mut calls: u64 = 0;
        let mut marker: Option<String> = None;
        let mut saw_any = false;

        loop {
            let mut req = self
                .clients
                .rds
                .describe_db_log_files()
                .db_instance_identifier(dbidentifier);
            if let Some(m) = marker.clone() {
                req = req.marker(m);
            }

            calls += 1;
            let resp = match req.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    warn!(dbidentifier, error = %err, "describe_db_log_files failed; log size unset for this instance");
                    return (None, calls);
                }
            };

            for file in resp.describe_db_log_files() {
                saw_any = true;
                if let Some(size) = file.size() {
                    total = total.saturating_add(u64::try_from(size.max(0)).unwrap_or(0));
                }
            }

            marker = resp.marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }

        (saw_any.then_some(total), calls)
    }
}

#[async_trait]
impl InventoryFetcher for RdsInventoryFetcher {
    #[instrument(skip(self), fields(region = %self.clients.region))]
    async fn get_instances_metrics(
        &self,
        collect_maintenances: bool,
        collect_logs_size: bool,
    ) -> Result<InventoryResult, FetchError> {
        let mut instances = BTreeMap::new();
        let mut api_calls: u64 = 0;
        let mut marker: Option<String> = None;

        loop {
            let mut req = self.clients.rds.describe_db_instances();
            if let Some(m) = marker.clone() {
                req = req.marker(m);
            }

            api_calls += 1;
            let resp = req
                .send()
                .await
                .map_err(|err| FetchError::Inventory(err.to_string()))?;

            for db in resp.db_instances() {
                let Some(dbidentifier) = db.db_instance_identifier() else {
                    continue;
                };
                let dbidentifier = dbidentifier.to_string();

                let source = db.read_replica_source_db_instance_identifier();
                let created_at = db
                    .instance_create_time()
                    .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), 0));
                let age_seconds = created_at.map(|c| (chrono::Utc::now() - c).num_seconds());

                let cert_expiry = db
                    .certificate_details()
                    .and_then(|c| c.valid_till())
                    .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), 0));

                let allocated_storage_gib = f64::from(db.allocated_storage());
                let tags = db
                    .tag_list()
                    .iter()
                    .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
                    .collect();

                let instance = Instance {
                    dbidentifier: dbidentifier.clone(),
                    resource_id: db.dbi_resource_id().unwrap_or_default().to_string(),
                    arn: db.db_instance_arn().unwrap_or_default().to_string(),
                    engine: db.engine().unwrap_or_default().to_string(),
                    engine_version: db.engine_version().unwrap_or_default().to_string(),
                    instance_class: db.db_instance_class().unwrap_or_default().to_string(),
                    storage_type: db.storage_type().unwrap_or_default().to_string(),
                    role: Role::from_source_identifier(source),
                    source_dbidentifier: source.map(str::to_string),
                    allocated_storage_bytes: crate::units::gib_to_bytes(allocated_storage_gib),
                    max_allocated_storage_bytes: db
                        .max_allocated_storage()
                        .map(|v| crate::units::gib_to_bytes(f64::from(v))),
                    provisioned_iops: db.iops().map(f64::from),
                    storage_throughput_bytes: db
                        .storage_throughput()
                        .map(|v| f64::from(v) * crate::units::MB),
                    backup_retention_seconds: u64::from(
                        u32::try_from(db.backup_retention_period()).unwrap_or(0) * 86400,
                    ),
                    status: db.db_instance_status().unwrap_or_default().to_string(),
                    created_at,
                    cert_expiry,
                    pending_modified: db.pending_modified_values().is_some(),
                    pending_maintenance_action: String::new(),
                    multi_az: db.multi_az().unwrap_or(false),
                    deletion_protection: db.deletion_protection().unwrap_or(false),
                    performance_insights_enabled: db.performance_insights_enabled().unwrap_or(false),
                    log_files_size_bytes: None,
                    age_seconds,
                    tags,
                };

                instances.insert(dbidentifier, instance);
            }

            marker = resp.marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }

        if collect_maintenances {
            let labels = self.pending_maintenance_labels().await;
            for (dbidentifier, label) in labels {
                if let Some(instance) = instances.get_mut(&dbidentifier) {
                    instance.pending_maintenance_action = label;
                }
            }
        }

        if collect_logs_size {
            for (dbidentifier, instance) in &mut instances {
                let (size, calls) = self.log_files_size_bytes(dbidentifier).await;
                instance.log_files_size_bytes = size;
                api_calls += calls;
            }
        }

        Ok(InventoryResult { instances, api_calls })
    }
}
