use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use colored::Colorize;
use supports_color::Stream;
use tracing::{debug, warn};

use crate::action_log::{ActionRecord, ActionSink};
use crate::ext::SystemTimeExt;

/// Append-only log of the actions taken on the replica.
///
/// Every line is written as `<YYYY-MM-DD HH:MM:SS> - <message>` and echoed to
/// standard output. The file is opened once and flushed line by line, and
/// again when the log is dropped.
pub struct ActionLog {
    path: PathBuf,
    file: LineWriter<File>,
    echo: bool,
}

impl ActionLog {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        debug!("Opening action log: {}", path.display());
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        colored::control::set_override(supports_color::on(Stream::Stdout).is_some());

        Ok(Self {
            path,
            file: LineWriter::new(file),
            echo: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disables the standard output echo.
    #[cfg(test)]
    pub fn without_echo(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn record_at(&mut self, record: &ActionRecord, at: SystemTime) -> io::Result<()> {
        let line = format_line(record, at);
        if self.echo {
            writeln!(io::stdout().lock(), "{line}")?;
        }
        writeln!(self.file, "{line}")
    }

    /// Prints an error to standard output only. Nothing reaches the log file.
    pub fn console_error(&self, message: impl Display) {
        if let Err(err) = writeln!(io::stdout().lock(), "{} {message}", "Error:".red().bold()) {
            warn!("Failed to print to standard output: {}", err);
        }
    }
}

impl ActionSink for ActionLog {
    fn record(&mut self, record: ActionRecord) -> io::Result<()> {
        self.record_at(&record, SystemTime::now())
    }
}

impl Drop for ActionLog {
    fn drop(&mut self) {
        if let Err(err) = self.file.flush() {
            warn!("Failed to flush action log {}: {}", self.path.display(), err);
        }
    }
}

fn format_line(record: &ActionRecord, at: SystemTime) -> String {
    format!("{} - {}", at.to_log_timestamp(), record)
}
