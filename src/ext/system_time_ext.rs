use std::time::SystemTime;

use chrono::{DateTime, Local};

/// Format of the timestamp prefixing every action log line.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub trait SystemTimeExt {
    /// Renders the instant in local time as `YYYY-MM-DD HH:MM:SS`.
    fn to_log_timestamp(&self) -> String;
}

impl SystemTimeExt for SystemTime {
    fn to_log_timestamp(&self) -> String {
        DateTime::<Local>::from(*self)
            .format(LOG_TIMESTAMP_FORMAT)
            .to_string()
    }
}
