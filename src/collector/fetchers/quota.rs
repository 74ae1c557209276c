use super::{FetchError, QuotaFetcher, Quotas};
use crate::aws::RegionClients;
use async_trait::async_trait;
use tracing::instrument;

const SERVICE_CODE: &str = "rds";

/// `(quota code, field setter)` pairs. Each quota is fetched independently so
/// one failure degrades a single field instead of the whole scrape (spec §4.5).
const QUOTA_CODES: &[(&str, &str)] = &[
    ("L-7B6409FD", "db_instances"),
    ("L-7ADDB58A", "total_storage_bytes"),
    ("L-272F1212", "manual_db_instance_snapshots"),
];

pub struct ServiceQuotasFetcher {
    clients: RegionClients,
}

impl ServiceQuotasFetcher {
    #[must_use]
    pub fn new(clients: RegionClients) -> Self {
        Self { clients }
    }

    async fn get_quota_value(&self, quota_code: &str) -> Result<f64, FetchError> {
        let resp = self
            .clients
            .service_quotas
            .get_service_quota()
            .service_code(SERVICE_CODE)
            .quota_code(quota_code)
            .send()
            .await
            .map_err(|err| FetchError::Quota {
                quota_code: quota_code.to_string(),
                message: err.to_string(),
            })?;

        resp.quota()
            .and_then(aws_sdk_servicequotas::types::ServiceQuota::value)
            .ok_or_else(|| FetchError::Quota {
                quota_code: quota_code.to_string(),
                message: "quota response carried no value".to_string(),
            })
    }
}

#[async_trait]
impl QuotaFetcher for ServiceQuotasFetcher {
    #[instrument(skip(self), fields(region = %self.clients.region))]
    async fn get_rds_quotas(&self) -> (Quotas, u64, Vec<FetchError>) {
        let mut quotas = Quotas::default();
        let mut errors = Vec::new();
        let mut api_calls: u64 = 0;

        for (quota_code, field) in QUOTA_CODES {
            api_calls += 1;
            match self.get_quota_value(quota_code).await {
                Ok(value) => match *field {
                    "db_instances" => quotas.db_instances = value,
                    "total_storage_bytes" => {
                        quotas.total_storage_bytes = crate::units::gib_to_bytes(value);
                    }
                    "manual_db_instance_snapshots" => quotas.manual_db_instance_snapshots = value,
                    _ => {}
                },
                Err(err) => errors.push(err),
            }
        }

        (quotas, api_calls, errors)
    }
}
