use std::io;
use std::path::{Path, PathBuf};

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SyncError {
    #[snafu(display("Source folder '{}' does not exist.", path.display()))]
    SourceMissing { path: PathBuf },
    #[snafu(display("Source folder '{}' is not a directory.", path.display()))]
    SourceNotDirectory { path: PathBuf },
    #[snafu(display("Failed to {} {}", action, path.display()))]
    IoFailure {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[snafu(display("Failed to write to the action log"))]
    LogWrite { source: io::Error },
}

impl SyncError {
    /// Errors that only abort the current pass. The next cycle retries.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::SourceMissing { .. } | SyncError::SourceNotDirectory { .. }
        )
    }

    pub(crate) fn from_walk(root: &Path, err: walkdir::Error) -> Self {
        let path = err.path().unwrap_or(root).to_path_buf();
        SyncError::IoFailure {
            action: "walk",
            path,
            source: err.into(),
        }
    }
}
