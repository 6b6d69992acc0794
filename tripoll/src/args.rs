//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use tripoll_common::LoggingConfig;

/// Poll interface traffic counters over SNMP.
#[derive(Parser, Debug, Clone)]
#[command(name = "tripoll")]
#[command(about = "Poll interface traffic counters over SNMP", long_about = None)]
#[command(version)]
pub struct Args {
    /// Path to the configuration file (JSON5 format).
    #[arg(short, long, default_value = "tripoll.json5")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Debug logging, including every emitted sample.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Logging settings after applying command-line overrides.
    ///
    /// An explicit `--log-level` wins over `--debug`.
    pub fn logging(&self, configured: &LoggingConfig) -> LoggingConfig {
        match (&self.log_level, self.debug) {
            (Some(level), _) => configured.with_level(level.clone()),
            (None, true) => configured.with_level("debug"),
            (None, false) => configured.clone(),
        }
    }
}
