use super::{
    FetchError, TimeseriesFetcher, TimeseriesResult, TimeseriesSample, Usage, TIMESERIES_METRICS,
};
use crate::aws::RegionClients;
use async_trait::async_trait;
use aws_sdk_cloudwatch::types::{Dimension, Metric, MetricDataQuery, MetricStat, ScanBy};
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

/// Hard cap on `MetricDataQueries` per `GetMetricData` call (spec §4.3).
const QUERY_CHUNK_SIZE: usize = 500;
const WINDOW_SECONDS: i64 = 180;
const PERIOD_SECONDS: i32 = 60;

pub struct CloudWatchTimeseriesFetcher {
    clients: RegionClients,
}

impl CloudWatchTimeseriesFetcher {
    #[must_use]
    pub fn new(clients: RegionClients) -> Self {
        Self { clients }
    }
}

/// Which `(dbidentifier, field)` a query id was issued for.
struct QueryTarget {
    dbidentifier: String,
    field: &'static str,
}

fn time_window() -> (aws_smithy_types::DateTime, aws_smithy_types::DateTime) {
    let now = std::time::SystemTime::now();
    let start = now - std::time::Duration::from_secs(WINDOW_SECONDS as u64);
    (
        aws_smithy_types::DateTime::from(start),
        aws_smithy_types::DateTime::from(now),
    )
}

fn build_instance_queries(
    dbidentifiers: &[String],
) -> (Vec<MetricDataQuery>, HashMap<String, QueryTarget>) {
    let mut queries = Vec::with_capacity(dbidentifiers.len() * TIMESERIES_METRICS.len());
    let mut targets = HashMap::with_capacity(queries.capacity());
    let mut index = 0usize;

    for dbidentifier in dbidentifiers {
        for metric in TIMESERIES_METRICS {
            let id = format!("{}_{index}", metric.cloudwatch_name.to_lowercase());
            index += 1;

            let query = MetricDataQuery::builder()
                .id(id.clone())
                .metric_stat(
                    MetricStat::builder()
                        .metric(
                            Metric::builder()
                                .namespace("AWS/RDS")
                                .metric_name(metric.cloudwatch_name)
                                .dimensions(
                                    Dimension::builder()
                                        .name("DBInstanceIdentifier")
                                        .value(dbidentifier)
                                        .build(),
                                )
                                .build(),
                        )
                        .period(PERIOD_SECONDS)
                        .stat("Average")
                        .build(),
                )
                .return_data(true)
                .build();

            queries.push(query);
            targets.insert(
                id,
                QueryTarget {
                    dbidentifier: dbidentifier.clone(),
                    field: metric.field,
                },
            );
        }
    }

    (queries, targets)
}

#[async_trait]
impl TimeseriesFetcher for CloudWatchTimeseriesFetcher {
    #[instrument(skip(self, dbidentifiers), fields(region = %self.clients.region, instances = dbidentifiers.len()))]
    async fn get_rds_instance_metrics(
        &self,
        dbidentifiers: &[String],
    ) -> Result<TimeseriesResult, FetchError> {
        let (queries, targets) = build_instance_queries(dbidentifiers);
        let mut per_instance: BTreeMap<String, TimeseriesSample> = dbidentifiers
            .iter()
            .map(|id| (id.clone(), TimeseriesSample::default()))
            .collect();
        let mut api_calls: u64 = 0;

        let (start, end) = time_window();

        for chunk in queries.chunks(QUERY_CHUNK_SIZE) {
            api_calls += 1;

            let resp = self
                .clients
                .cloudwatch
                .get_metric_data()
                .set_metric_data_queries(Some(chunk.to_vec()))
                .start_time(start)
                .end_time(end)
                .scan_by(ScanBy::TimestampDescending)
                .send()
                .await
                .map_err(|err| FetchError::Timeseries(err.to_string()))?;

            for result in resp.metric_data_results() {
                let Some(id) = result.id() else { continue };
                let Some(target) = targets.get(id) else {
                    continue;
                };
                let Some(value) = result.values().first().copied() else {
                    continue;
                };

                per_instance
                    .entry(target.dbidentifier.clone())
                    .or_default()
                    .set(target.field, value);
            }
        }

        Ok(TimeseriesResult {
            per_instance,
            api_calls,
        })
    }

    #[instrument(skip(self), fields(region = %self.clients.region))]
    async fn get_usage_metrics(&self) -> Result<(Usage, u64), FetchError> {
        let (start, end) = time_window();

        let series = [
            ("AllocatedStorage", "DBInstanceIdentifier"),
            ("DBInstanceCount", "DBInstanceIdentifier"),
            ("ManualSnapshotCount", "DBInstanceIdentifier"),
        ];

        let queries: Vec<MetricDataQuery> = series
            .iter()
            .enumerate()
            .map(|(i, (name, _))| {
                MetricDataQuery::builder()
                    .id(format!("usage_{i}"))
                    .metric_stat(
                        MetricStat::builder()
                            .metric(
                                Metric::builder()
                                    .namespace("AWS/Usage")
                                    .metric_name(*name)
                                    .build(),
                            )
                            .period(PERIOD_SECONDS)
                            .stat("Average")
                            .build(),
                    )
                    .return_data(true)
                    .build()
            })
            .collect();

        let resp = self
            .clients
            .cloudwatch
            .get_metric_data()
            .set_metric_data_queries(Some(queries))
            .start_time(start)
            .end_time(end)
            .scan_by(ScanBy::TimestampDescending)
            .send()
            .await
            .map_err(|err| FetchError::Usage(err.to_string()))?;

        let mut usage = Usage::default();
        for result in resp.metric_data_results() {
            let Some(id) = result.id() else { continue };
            let Some(value) = result.values().first().copied() else {
                continue;
            };
            match id {
                "usage_0" => usage.allocated_storage_bytes = Some(crate::units::gib_to_bytes(value)),
                "usage_1" => usage.db_instances = Some(value),
                "usage_2" => usage.manual_snapshots = Some(value),
                _ => {}
            }
        }

        Ok((usage, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::{build_instance_queries, QUERY_CHUNK_SIZE, TIMESERIES_METRICS};

    fn dbidentifiers(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("db-{i}")).collect()
    }

    /// Spec §8 property 3: query count is exactly `24 * |D|`, one per
    /// `(instance, metric)` pair.
    #[test]
    fn builds_one_query_per_instance_metric_pair() {
        let ids = dbidentifiers(30);
        let (queries, targets) = build_instance_queries(&ids);

        assert_eq!(queries.len(), ids.len() * TIMESERIES_METRICS.len());
        assert_eq!(targets.len(), queries.len());
    }

    /// Spec §8 property 3 (scenario S3): `|D| = 30` must chunk into
    /// `⌈720/500⌉ = 2` batches, i.e. 2 upstream API calls.
    #[test]
    fn thirty_instances_chunk_into_two_batches() {
        let ids = dbidentifiers(30);
        let (queries, _) = build_instance_queries(&ids);

        assert_eq!(queries.len(), 720);
        assert_eq!(queries.chunks(QUERY_CHUNK_SIZE).count(), 2);
    }

    /// Every query id must map back to exactly one `(identifier, metric)`
    /// pair, and every target's field must be a name `TimeseriesSample`
    /// recognizes.
    #[test]
    fn every_query_id_maps_back_to_exactly_one_target() {
        let ids = dbidentifiers(3);
        let (queries, targets) = build_instance_queries(&ids);

        let mut seen_ids = std::collections::HashSet::new();
        for query in &queries {
            let id = query.id().expect("query id is always set").to_string();
            assert!(seen_ids.insert(id.clone()), "duplicate query id {id}");

            let target = targets.get(&id).expect("every query id has a target");
            assert!(ids.contains(&target.dbidentifier));
            assert!(TIMESERIES_METRICS.iter().any(|m| m.field == target.field));
        }
        assert_eq!(seen_ids.len(), queries.len());
    }

    #[test]
    fn empty_instance_set_produces_no_queries() {
        let (queries, targets) = build_instance_queries(&[]);
        assert!(queries.is_empty());
        assert!(targets.is_empty());
    }
}
