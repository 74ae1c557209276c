//! Per-region scrape orchestrator (spec §4.1).
//!
//! One `Collector` is constructed per configured AWS region and held for the
//! life of the process. `describe()` is synchronous and fetch-independent;
//! `collect()` drives one scrape: inventory first (fatal on failure), then
//! time-series/instance-type/quota/usage concurrently, joined, rendered.

pub mod counters;
mod descriptors;
mod emit;
pub mod fetchers;
pub mod status;

use counters::Counters;
use emit::ScrapeOutcome;
use fetchers::{
    FetchError, InstanceTypeFetcher, InventoryFetcher, QuotaFetcher, TimeseriesFetcher,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, instrument, warn};

pub use descriptors::MetricDescriptor;

/// Which optional subtasks a scrape should run (spec §6's seven `collect-*`
/// flags; `collect-instance-metrics` also gates the account-usage fetch
/// since both ride on the same CloudWatch API budget).
#[derive(Debug, Clone, Copy)]
pub struct CollectorConfig {
    pub collect_instance_metrics: bool,
    pub collect_instance_tags: bool,
    pub collect_instance_types: bool,
    pub collect_logs_size: bool,
    pub collect_maintenances: bool,
    pub collect_quotas: bool,
    pub collect_usages: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            collect_instance_metrics: true,
            collect_instance_tags: false,
            collect_instance_types: true,
            collect_logs_size: false,
            collect_maintenances: false,
            collect_quotas: true,
            collect_usages: true,
        }
    }
}

pub struct Collector {
    account_id: String,
    region: String,
    config: CollectorConfig,
    inventory: Arc<dyn InventoryFetcher>,
    timeseries: Arc<dyn TimeseriesFetcher>,
    instance_type: Arc<dyn InstanceTypeFetcher>,
    quota: Arc<dyn QuotaFetcher>,
    counters: Counters,
}

impl Collector {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: impl Into<String>,
        region: impl Into<String>,
        config: CollectorConfig,
        inventory: Arc<dyn InventoryFetcher>,
        timeseries: Arc<dyn TimeseriesFetcher>,
        instance_type: Arc<dyn InstanceTypeFetcher>,
        quota: Arc<dyn QuotaFetcher>,
        version: &str,
        commit: &str,
    ) -> Self {
        let account_id = account_id.into();
        let region = region.into();
        let counters = Counters::new(&account_id, &region, version, commit);

        Self {
            account_id,
            region,
            config,
            inventory,
            timeseries,
            instance_type,
            quota,
            counters,
        }
    }

    /// Static descriptors for every metric `collect` may emit, except
    /// `rds_instance_tags` whose label set is only known after a scrape
    /// (spec §9). Deterministic and independent of any live fetch.
    #[must_use]
    pub fn describe(&self) -> Vec<MetricDescriptor> {
        descriptors::all()
    }

    /// Execute one scrape of this region. Never returns `Err`: every
    /// upstream failure is caught, logged, counted, and degrades gracefully
    /// (spec §7). Build-info and error-counter samples are always present
    /// because they live on `self.counters`, rendered unconditionally below.
    #[instrument(skip(self), fields(region = %self.region, account_id = %self.account_id))]
    pub async fn collect(&self) -> String {
        let inventory = match self
            .inventory
            .get_instances_metrics(
                self.config.collect_maintenances,
                self.config.collect_logs_size,
            )
            .await
        {
            Ok(inventory) => inventory,
            Err(err) => {
                error!(error = %err, "inventory fetch failed, scrape aborted for this region");
                self.counters.inc_errors();
                let outcome = ScrapeOutcome {
                    account_id: &self.account_id,
                    region: &self.region,
                    up: false,
                    instances: &std::collections::BTreeMap::new(),
                    timeseries: None,
                    instance_types: None,
                    quotas: None,
                    usage: None,
                    collect_instance_tags: false,
                };
                return emit::render(&outcome) + &self.counters.render();
            }
        };
        self.counters.add_api_calls("rds", inventory.api_calls);

        let dbidentifiers: Vec<String> = inventory.instances.keys().cloned().collect();
        let instance_classes: Vec<String> = inventory
            .instances
            .values()
            .map(|i| i.instance_class.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let timeseries_fut = async {
            if self.config.collect_instance_metrics {
                Some(self.timeseries.get_rds_instance_metrics(&dbidentifiers).await)
            } else {
                None
            }
        };
        let usage_fut = async {
            if self.config.collect_usages {
                Some(self.timeseries.get_usage_metrics().await)
            } else {
                None
            }
        };
        let instance_type_fut = async {
            if self.config.collect_instance_types && !instance_classes.is_empty() {
                Some(
                    self.instance_type
                        .get_db_instance_type_information(&instance_classes)
                        .await,
                )
            } else {
                None
            }
        };
        let quota_fut = async {
            if self.config.collect_quotas {
                Some(self.quota.get_rds_quotas().await)
            } else {
                None
            }
        };

        let (timeseries_result, usage_result, instance_type_result, quota_result) =
            tokio::join!(timeseries_fut, usage_fut, instance_type_fut, quota_fut);

        let timeseries = self.handle_timeseries(timeseries_result);
        let usage = self.handle_usage(usage_result);
        let instance_types = self.handle_instance_types(instance_type_result);
        let quotas = self.handle_quotas(quota_result);

        let outcome = ScrapeOutcome {
            account_id: &self.account_id,
            region: &self.region,
            up: true,
            instances: &inventory.instances,
            timeseries: timeseries.as_ref(),
            instance_types: instance_types.as_ref(),
            quotas: quotas.as_ref(),
            usage: usage.as_ref(),
            collect_instance_tags: self.config.collect_instance_tags,
        };

        emit::render(&outcome) + &self.counters.render()
    }

    fn handle_timeseries(
        &self,
        result: Option<Result<fetchers::TimeseriesResult, FetchError>>,
    ) -> Option<std::collections::BTreeMap<String, fetchers::TimeseriesSample>> {
        match result {
            Some(Ok(result)) => {
                self.counters.add_api_calls("cloudwatch", result.api_calls);
                Some(result.per_instance)
            }
            Some(Err(err)) => {
                warn!(error = %err, "time-series fetch failed, degrading this scrape");
                self.counters.inc_errors();
                None
            }
            None => None,
        }
    }

    fn handle_usage(
        &self,
        result: Option<Result<(fetchers::Usage, u64), FetchError>>,
    ) -> Option<fetchers::Usage> {
        match result {
            Some(Ok((usage, api_calls))) => {
                self.counters.add_api_calls("cloudwatch", api_calls);
                Some(usage)
            }
            Some(Err(err)) => {
                warn!(error = %err, "account usage fetch failed, degrading this scrape");
                self.counters.inc_errors();
                None
            }
            None => None,
        }
    }

    fn handle_instance_types(
        &self,
        result: Option<Result<fetchers::InstanceTypeResult, FetchError>>,
    ) -> Option<std::collections::BTreeMap<String, fetchers::InstanceType>> {
        match result {
            Some(Ok(result)) => {
                self.counters.add_api_calls("ec2", result.api_calls);
                Some(result.per_type)
            }
            Some(Err(err)) => {
                warn!(error = %err, "instance-type fetch failed, degrading this scrape");
                self.counters.inc_errors();
                None
            }
            None => None,
        }
    }

    fn handle_quotas(
        &self,
        result: Option<(fetchers::Quotas, u64, Vec<FetchError>)>,
    ) -> Option<fetchers::Quotas> {
        match result {
            Some((quotas, api_calls, errors)) => {
                self.counters.add_api_calls("servicequotas", api_calls);
                for err in &errors {
                    warn!(error = %err, "quota fetch degraded for one quota code");
                }
                #[allow(clippy::cast_possible_truncation)]
                self.counters.inc_errors_by(errors.len() as u64);
                Some(quotas)
            }
            None => None,
        }
    }
}
