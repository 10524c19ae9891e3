use std::path::PathBuf;

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::action_log::ActionLog;
use crate::application::RuntimeConfig;
use crate::mirror::{MirrorEngine, SyncError};

pub struct Application;

impl Application {
    /// Opens the action log and runs passes separated by the configured
    /// interval, until the cycle limit is reached or a pass fails fatally.
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        debug!("Runtime config: {:?}", app_config);

        let mut log = ActionLog::open(&app_config.log_file).context(LogFileSnafu {
            path: app_config.log_file.clone(),
        })?;
        info!("Appending actions to {}", log.path().display());

        let engine = MirrorEngine::new(&app_config.source, &app_config.replica);
        let mut completed: u64 = 0;

        loop {
            Self::run_pass(&engine, &mut log).await?;
            completed += 1;

            if app_config
                .cycles
                .is_some_and(|limit| completed >= limit.get())
            {
                info!("Completed {} passes, stopping", completed);
                return Ok(());
            }

            debug!("Sleeping for {:?}", app_config.interval);
            compio::time::sleep(app_config.interval).await;
        }
    }

    async fn run_pass(engine: &MirrorEngine, log: &mut ActionLog) -> Result<(), ApplicationError> {
        debug!(
            "Mirroring {} onto {}",
            engine.source_root().display(),
            engine.replica_root().display()
        );

        match engine.sync(log).await {
            Ok(report) => {
                info!("Pass finished with {} changes ({})", report.mutations(), report);
                Ok(())
            }
            Err(err) if err.is_recoverable() => {
                warn!("Pass skipped: {}", err);
                log.console_error(&err);
                Ok(())
            }
            Err(err) => Err(err).context(MirrorSnafu),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Failed to open the log file {}", path.display()))]
    LogFileError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Critical failure encountered during synchronization"))]
    MirrorError { source: SyncError },
}
