//! Best-effort timestamp parsing for export values.
//!
//! None of these functions fail: empty, absent and malformed input all map
//! to `None`, which the mapper writes as a null field.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::config::DeadlineFormat;

/// Fixed pattern of `created_at`-style export values.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Length of the `.000Z` tail cut from `deadline`/`date` in legacy mode.
pub const ZONE_SUFFIX_LEN: usize = 5;

const ISO_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a `YYYY-MM-DD HH:MM:SS` value as a UTC timestamp.
pub fn parse_date(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value.filter(|v| !v.is_empty())?;
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a `deadline`/`date` value according to `format`.
pub fn parse_zoned_date(value: Option<&str>, format: DeadlineFormat) -> Option<DateTime<Utc>> {
    let value = value.filter(|v| !v.is_empty())?;
    match format {
        DeadlineFormat::Legacy => parse_date(Some(strip_zone_suffix(value))),
        DeadlineFormat::Iso => parse_iso_date(value),
    }
}

/// Drop the last [`ZONE_SUFFIX_LEN`] characters; shorter input becomes empty.
pub fn strip_zone_suffix(value: &str) -> &str {
    let cut = value
        .char_indices()
        .rev()
        .nth(ZONE_SUFFIX_LEN - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &value[..cut]
}

/// RFC 3339 first, then zone-less ISO (read as UTC), then the plain pattern.
fn parse_iso_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, ISO_LOCAL_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| parse_date(Some(value)))
}
