//! Persistent, timestamped record of what each pass did to the replica.

mod action_log;
mod action_record;

pub use action_log::ActionLog;
pub use action_record::{ActionRecord, ActionSink};
