use crate::cli::{actions::Action, commands, dispatch::handler, telemetry};
use anyhow::Result;

/// Parse CLI flags, merge them with any config file, and start the
/// telemetry layer before returning the resolved `Action`.
///
/// # Errors
///
/// Returns an error if config-file loading or telemetry initialization fails
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let action = handler(&matches)?;

    let Action::Run {
        debug, log_format, ..
    } = &action;
    telemetry::init(*debug, *log_format)?;

    Ok(action)
}
