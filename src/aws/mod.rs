//! Construction of the per-region AWS SDK clients the fetchers are built on.
//!
//! Credential acquisition and role assumption are explicitly out of scope
//! for the core (spec §1): this module is the thin, external-collaborator
//! shell that turns CLI/config values into ready-to-use clients, which is
//! all the `Collector` ever receives.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatch::Client as CloudWatchClient;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_rds::Client as RdsClient;
use aws_sdk_servicequotas::Client as ServiceQuotasClient;

/// The four AWS SDK clients one region's `Collector` needs.
#[derive(Clone)]
pub struct RegionClients {
    pub region: String,
    pub account_id: String,
    pub rds: RdsClient,
    pub cloudwatch: CloudWatchClient,
    pub ec2: Ec2Client,
    pub service_quotas: ServiceQuotasClient,
}

/// Optional STS role-assumption parameters (spec §6).
#[derive(Debug, Clone, Default)]
pub struct AssumeRole {
    pub role_arn: Option<String>,
    pub session_name: Option<String>,
}

/// Build the clients for one region, optionally assuming a role first.
///
/// # Errors
/// Returns an error if the ambient credential chain can't resolve
/// credentials, or if the account id can't be resolved via STS
/// `GetCallerIdentity`.
pub async fn region_clients(region: &str, assume_role: &AssumeRole) -> Result<RegionClients> {
    let base_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;

    let sdk_config = if let Some(role_arn) = assume_role.role_arn.as_deref() {
        let session_name = assume_role
            .session_name
            .clone()
            .unwrap_or_else(|| "rds-exporter".to_string());

        let provider = aws_config::sts::AssumeRoleProvider::builder(role_arn)
            .session_name(session_name)
            .configure(&base_config)
            .build()
            .await;

        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(provider)
            .load()
            .await
    } else {
        base_config
    };

    let sts = aws_sdk_sts::Client::new(&sdk_config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("resolving AWS account id via sts:GetCallerIdentity")?;
    let account_id = identity.account().unwrap_or_default().to_string();

    Ok(RegionClients {
        region: region.to_string(),
        account_id,
        rds: RdsClient::new(&sdk_config),
        cloudwatch: CloudWatchClient::new(&sdk_config),
        ec2: Ec2Client::new(&sdk_config),
        service_quotas: ServiceQuotasClient::new(&sdk_config),
    })
}
