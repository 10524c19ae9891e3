use std::io;
use std::path::PathBuf;

use derive_more::Display;

/// One user-visible action performed on the replica during a pass.
///
/// The carried path is always the replica-side path.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ActionRecord {
    #[display("Created directory: {}", _0.display())]
    CreatedDirectory(PathBuf),
    #[display("Copied file: {}", _0.display())]
    CopiedFile(PathBuf),
    #[display("Updated file: {}", _0.display())]
    UpdatedFile(PathBuf),
    #[display("No change in file: {}", _0.display())]
    Unchanged(PathBuf),
    #[display("Removed file: {}", _0.display())]
    RemovedFile(PathBuf),
}

/// Destination for action records produced by the mirror engine.
pub trait ActionSink {
    fn record(&mut self, record: ActionRecord) -> io::Result<()>;
}

#[cfg(test)]
impl ActionSink for Vec<ActionRecord> {
    fn record(&mut self, record: ActionRecord) -> io::Result<()> {
        self.push(record);
        Ok(())
    }
}
