use std::fmt::Display;

use chrono::{DateTime, TimeZone};

/// Format of the `time` field shared by every entry in the log.
pub const ENTRY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Suffix format used for backup files created during migration.
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// This is the standard way of converting a moment into an entry timestamp.
pub fn entry_timestamp<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    moment.format(ENTRY_TIME_FORMAT).to_string()
}

pub fn backup_stamp<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    moment.format(BACKUP_STAMP_FORMAT).to_string()
}

/// Clock face shown in the form header.
pub fn clock_face<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    moment.format("%H:%M:%S").to_string()
}
