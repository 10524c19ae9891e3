use std::num::NonZeroU64;
use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;

/// Periodically mirror a source folder onto a replica folder.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// Folder treated as ground truth
    pub source_folder: PathBuf,
    /// Folder kept identical to the source, created when absent
    pub replica_folder: PathBuf,
    /// Seconds to wait after a pass before starting the next one
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
    /// File every action is appended to
    pub log_file: PathBuf,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Stop after this many passes instead of running until terminated
    #[clap(long)]
    pub cycles: Option<NonZeroU64>,
}
