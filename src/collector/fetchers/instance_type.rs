use super::{FetchError, InstanceType, InstanceTypeFetcher, InstanceTypeResult};
use crate::aws::RegionClients;
use async_trait::async_trait;
use aws_sdk_ec2::types::InstanceType as Ec2InstanceType;
use std::collections::BTreeMap;
use tracing::instrument;

pub struct Ec2InstanceTypeFetcher {
    clients: RegionClients,
}

impl Ec2InstanceTypeFetcher {
    #[must_use]
    pub fn new(clients: RegionClients) -> Self {
        Self { clients }
    }
}

/// `db.m5.large` -> `m5.large`. RDS instance classes are always prefixed
/// with `db.`; the underlying compute shape is the EC2 instance type of the
/// same name with that prefix stripped.
fn ec2_type_name(instance_class: &str) -> &str {
    instance_class.strip_prefix("db.").unwrap_or(instance_class)
}

#[async_trait]
impl InstanceTypeFetcher for Ec2InstanceTypeFetcher {
    #[allow(clippy::cast_precision_loss)]
    #[instrument(skip(self, instance_classes), fields(region = %self.clients.region, classes = instance_classes.len()))]
    async fn get_db_instance_type_information(
        &self,
        instance_classes: &[String],
    ) -> Result<InstanceTypeResult, FetchError> {
        let mut per_type = BTreeMap::new();

        if instance_classes.is_empty() {
            return Ok(InstanceTypeResult {
                per_type,
                api_calls: 0,
            });
        }

        let ec2_names: Vec<Ec2InstanceType> = instance_classes
            .iter()
            .map(|c| Ec2InstanceType::from(ec2_type_name(c)))
            .collect();

        let resp = self
            .clients
            .ec2
            .describe_instance_types()
            .set_instance_types(Some(ec2_names))
            .send()
            .await
            .map_err(|err| FetchError::InstanceType(err.to_string()))?;

        for info in resp.instance_types() {
            let Some(name) = info.instance_type() else {
                continue;
            };
            let db_class = format!("db.{}", name.as_str());

            let vcpu = info
                .v_cpu_info()
                .and_then(|v| v.default_v_cpus())
                .map_or(0, i64::from);

            let memory_bytes = info
                .memory_info()
                .and_then(aws_sdk_ec2::types::MemoryInfo::size_in_mib)
                .map_or(0, |mib| crate::units::mib_to_bytes(mib as f64));

            // EC2 doesn't expose a single stable baseline-IOPS figure across
            // instance families the way it does EBS throughput; leave unset.
            let max_iops = None;

            let max_throughput_bytes = info
                .ebs_info()
                .and_then(|e| e.ebs_optimized_info())
                .and_then(|o| o.maximum_throughput_in_mbps())
                .map(|mbps| mbps * crate::units::MB);

            per_type.insert(
                db_class,
                InstanceType {
                    vcpu,
                    memory_bytes,
                    max_iops,
                    max_throughput_bytes,
                },
            );
        }

        Ok(InstanceTypeResult {
            per_type,
            api_calls: 1,
        })
    }
}
