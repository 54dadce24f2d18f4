//! FILETIME conversion and report timestamp formatting.
//!
//! A FILETIME is a count of 100-nanosecond ticks since 1601-01-01 00:00:00
//! UTC. The full tick precision is kept in the returned `OffsetDateTime`;
//! formatting truncates to microseconds.
use time::macros::{datetime, format_description, offset};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::error::DecodeError;

/// 1601-01-01 00:00:00 UTC.
pub const FILETIME_EPOCH: OffsetDateTime = datetime!(1601-01-01 0:00 UTC);

/// Japan Standard Time, no DST.
pub const JST: UtcOffset = offset!(+9);

const TICKS_PER_SECOND: u64 = 10_000_000;
const NANOS_PER_TICK: u64 = 100;

/// Convert FILETIME ticks to a UTC timestamp.
pub fn filetime_to_utc(ticks: u64) -> Result<OffsetDateTime, DecodeError> {
    // u64::MAX / 10^7 fits in i64, and the sub-second part is < 10^9.
    let secs = (ticks / TICKS_PER_SECOND) as i64;
    let nanos = ((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK) as i32;
    FILETIME_EPOCH
        .checked_add(Duration::new(secs, nanos))
        .ok_or_else(|| DecodeError::TimestampOutOfRange(format!("FILETIME {ticks:#x}")))
}

/// Shift a UTC timestamp to JST (+09:00).
pub fn utc_to_jst(utc: OffsetDateTime) -> Result<OffsetDateTime, DecodeError> {
    utc.checked_to_offset(JST)
        .ok_or_else(|| DecodeError::TimestampOutOfRange(format!("{utc} shifted to JST")))
}

/// Render as `YYYY-MM-DD HH:MM:SS.ffffff` in the timestamp's own offset.
pub fn format_timestamp(dt: OffsetDateTime) -> Result<String, DecodeError> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
    Ok(dt.format(&format)?)
}
