use crate::cli::actions::LogFormat;
use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Start the logging layer.
///
/// `RUST_LOG` overrides the default directive derived from `debug`. Output
/// format is `text` (pretty, human-oriented) or `json` (one object per line,
/// suited to log shippers), per spec §6's `log-format` flag.
///
/// # Errors
/// Will return an error if `RUST_LOG` contains an invalid filter directive
/// or if a global subscriber has already been installed.
pub fn init(debug: bool, log_format: LogFormat) -> Result<()> {
    let default_level = if debug { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    match log_format {
        LogFormat::Text => builder.try_init().map_err(|err| anyhow::anyhow!(err)),
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err)),
    }
}
