use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    /// Delay between the end of one pass and the start of the next
    pub interval: Duration,
    pub log_file: PathBuf,
    /// Number of passes to run; `None` runs until the process is terminated
    pub cycles: Option<NonZeroU64>,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            source: cli.source_folder,
            replica: cli.replica_folder,
            interval: Duration::from_secs(cli.interval),
            log_file: cli.log_file,
            cycles: cli.cycles,
        }
    }
}
