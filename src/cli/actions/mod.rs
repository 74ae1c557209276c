pub mod run;

use crate::config::ExporterConfig;

#[derive(Debug)]
pub enum Action {
    Run {
        config: ExporterConfig,
        debug: bool,
        log_format: LogFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}
