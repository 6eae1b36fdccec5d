//! Wall-clock arithmetic on minutes-of-day.

use chrono::{NaiveTime, Timelike};

use super::SchedulingError;

pub const MINUTES_PER_DAY: u32 = 1440;

pub fn minutes_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Build a time from minutes since midnight, wrapping at 24:00
pub fn from_minutes_of_day(minutes: u32) -> NaiveTime {
    let m = minutes % MINUTES_PER_DAY;
    NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Add `minutes` to `start`, wrapping past midnight.
///
/// 23:30 plus 90 minutes is 01:00; no day rollover is reported.
pub fn add_minutes(start: NaiveTime, minutes: u32) -> NaiveTime {
    from_minutes_of_day((minutes_of_day(start) + minutes % MINUTES_PER_DAY) % MINUTES_PER_DAY)
}

/// End time of an interval that must finish on the day it starts
pub fn end_time_same_day(start: NaiveTime, minutes: u32) -> Result<NaiveTime, SchedulingError> {
    let end = minutes_of_day(start) as u64 + minutes as u64;
    if end >= MINUTES_PER_DAY as u64 {
        return Err(SchedulingError::CrossesMidnight { start, minutes });
    }
    Ok(from_minutes_of_day(end as u32))
}

/// Parse a 24h "HH:MM" time. A trailing ":SS" is accepted and dropped.
pub fn parse_hhmm(s: &str) -> anyhow::Result<NaiveTime> {
    let s = s.trim();
    let t = NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| anyhow::anyhow!("Invalid time {:?}. Use HH:MM", s))?;
    Ok(from_minutes_of_day(minutes_of_day(t)))
}

pub fn format_hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}
