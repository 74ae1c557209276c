use crate::aws::{self, AssumeRole, RegionClients};
use crate::cli::actions::Action;
use crate::cli::commands::built_info;
use crate::collector::Collector;
use crate::collector::fetchers::inventory::RdsInventoryFetcher;
use crate::collector::fetchers::instance_type::Ec2InstanceTypeFetcher;
use crate::collector::fetchers::quota::ServiceQuotasFetcher;
use crate::collector::fetchers::timeseries::CloudWatchTimeseriesFetcher;
use crate::config::ExporterConfig;
use crate::exporter;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Top-level run failures, mapped to the exit codes in spec §6.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("HTTP server error: {0}")]
    Http(#[source] anyhow::Error),
    #[error("cloud-credential or region-resolution error: {0}")]
    Credentials(#[source] anyhow::Error),
}

impl RunError {
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 1,
            Self::Http(_) => 2,
            Self::Credentials(_) => 4,
        }
    }
}

fn build_collector(clients: RegionClients, config: &ExporterConfig) -> Collector {
    let version = env!("CARGO_PKG_VERSION");
    let commit = built_info::GIT_COMMIT_HASH.unwrap_or("unknown");

    Collector::new(
        clients.account_id.clone(),
        clients.region.clone(),
        config.collector,
        Arc::new(RdsInventoryFetcher::new(clients.clone())),
        Arc::new(CloudWatchTimeseriesFetcher::new(clients.clone())),
        Arc::new(Ec2InstanceTypeFetcher::new(clients.clone())),
        Arc::new(ServiceQuotasFetcher::new(clients)),
        version,
        commit,
    )
}

/// Resolve AWS clients for every configured region and build one `Collector`
/// each, then serve them over HTTP until shut down.
///
/// # Errors
/// Returns [`RunError::Config`] if no regions are configured,
/// [`RunError::Credentials`] if client/account-id resolution fails for any
/// region, or [`RunError::Http`] if the HTTP server fails to bind or serve.
pub async fn handle(action: Action) -> Result<(), RunError> {
    match action {
        Action::Run { config, .. } => {
            if config.aws_regions.is_empty() {
                return Err(RunError::Config(
                    "no AWS regions configured: pass --aws-regions or set it in the config file"
                        .to_string(),
                ));
            }

            let assume_role = AssumeRole {
                role_arn: config.aws_assume_role_arn.clone(),
                session_name: config.aws_assume_role_session.clone(),
            };

            let mut collectors = Vec::with_capacity(config.aws_regions.len());
            for region in &config.aws_regions {
                info!(%region, "resolving AWS clients");
                let clients = aws::region_clients(region, &assume_role)
                    .await
                    .map_err(RunError::Credentials)?;
                collectors.push(Arc::new(build_collector(clients, &config)));
            }

            exporter::serve(&config, collectors)
                .await
                .map_err(RunError::Http)
        }
    }
}
