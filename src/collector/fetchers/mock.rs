//! Test doubles for the four fetcher traits, grounded on the mock-service
//! pattern used for AWS clients elsewhere in the ecosystem: each mock is
//! configured with canned results up front and never touches the network.

use super::{
    FetchError, Instance, InstanceType, InstanceTypeFetcher, InstanceTypeResult, InventoryFetcher,
    InventoryResult, Quotas, QuotaFetcher, TimeseriesFetcher, TimeseriesResult, Usage,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

pub struct MockInventoryFetcher {
    result: Mutex<Option<Result<InventoryResult, String>>>,
}

impl MockInventoryFetcher {
    #[must_use]
    pub fn ok(instances: Vec<Instance>, api_calls: u64) -> Self {
        let instances = instances
            .into_iter()
            .map(|i| (i.dbidentifier.clone(), i))
            .collect();
        Self {
            result: Mutex::new(Some(Ok(InventoryResult {
                instances,
                api_calls,
            }))),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Mutex::new(Some(Err(message.into()))),
        }
    }
}

#[async_trait]
impl InventoryFetcher for MockInventoryFetcher {
    async fn get_instances_metrics(
        &self,
        _collect_maintenances: bool,
        _collect_logs_size: bool,
    ) -> Result<InventoryResult, FetchError> {
        match self.result.lock().unwrap().take() {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(FetchError::Inventory(message)),
            None => Ok(InventoryResult::default()),
        }
    }
}

pub struct MockTimeseriesFetcher {
    instance_metrics: BTreeMap<String, super::TimeseriesSample>,
    instance_metrics_err: Option<String>,
    usage: Usage,
    usage_err: Option<String>,
}

impl MockTimeseriesFetcher {
    #[must_use]
    pub fn new(instance_metrics: BTreeMap<String, super::TimeseriesSample>, usage: Usage) -> Self {
        Self {
            instance_metrics,
            instance_metrics_err: None,
            usage,
            usage_err: None,
        }
    }

    #[must_use]
    pub fn failing_instance_metrics(message: impl Into<String>) -> Self {
        Self {
            instance_metrics: BTreeMap::new(),
            instance_metrics_err: Some(message.into()),
            usage: Usage::default(),
            usage_err: None,
        }
    }

    #[must_use]
    pub fn failing_usage(message: impl Into<String>) -> Self {
        Self {
            instance_metrics: BTreeMap::new(),
            instance_metrics_err: None,
            usage: Usage::default(),
            usage_err: Some(message.into()),
        }
    }
}

#[async_trait]
impl TimeseriesFetcher for MockTimeseriesFetcher {
    async fn get_rds_instance_metrics(
        &self,
        _dbidentifiers: &[String],
    ) -> Result<TimeseriesResult, FetchError> {
        if let Some(message) = &self.instance_metrics_err {
            return Err(FetchError::Timeseries(message.clone()));
        }
        Ok(TimeseriesResult {
            per_instance: self.instance_metrics.clone(),
            api_calls: 1,
        })
    }

    async fn get_usage_metrics(&self) -> Result<(Usage, u64), FetchError> {
        if let Some(message) = &self.usage_err {
            return Err(FetchError::Usage(message.clone()));
        }
        Ok((self.usage, 1))
    }
}

pub struct MockInstanceTypeFetcher {
    per_type: BTreeMap<String, InstanceType>,
    err: Option<String>,
}

impl MockInstanceTypeFetcher {
    #[must_use]
    pub fn ok(per_type: BTreeMap<String, InstanceType>) -> Self {
        Self {
            per_type,
            err: None,
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            per_type: BTreeMap::new(),
            err: Some(message.into()),
        }
    }
}

#[async_trait]
impl InstanceTypeFetcher for MockInstanceTypeFetcher {
    async fn get_db_instance_type_information(
        &self,
        _instance_classes: &[String],
    ) -> Result<InstanceTypeResult, FetchError> {
        if let Some(message) = &self.err {
            return Err(FetchError::InstanceType(message.clone()));
        }
        Ok(InstanceTypeResult {
            per_type: self.per_type.clone(),
            api_calls: 1,
        })
    }
}

pub struct MockQuotaFetcher {
    quotas: Quotas,
    errors: Vec<FetchError>,
}

impl MockQuotaFetcher {
    #[must_use]
    pub fn new(quotas: Quotas, errors: Vec<FetchError>) -> Self {
        Self { quotas, errors }
    }
}

#[async_trait]
impl QuotaFetcher for MockQuotaFetcher {
    async fn get_rds_quotas(&self) -> (Quotas, u64, Vec<FetchError>) {
        let errors = self
            .errors
            .iter()
            .map(|e| match e {
                FetchError::Quota {
                    quota_code,
                    message,
                } => FetchError::Quota {
                    quota_code: quota_code.clone(),
                    message: message.clone(),
                },
                other => FetchError::Quota {
                    quota_code: "unknown".to_string(),
                    message: other.to_string(),
                },
            })
            .collect();
        (self.quotas, 1, errors)
    }
}
