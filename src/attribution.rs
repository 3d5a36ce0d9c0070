//! Day-basis attribution (component G).
//!
//! The sole canonical rule for turning an astronomical instant into the
//! civil date it belongs to: shift to JST (+09:00) and take the wall-clock
//! date. Every other component calls through here rather than re-deriving
//! an offset of its own.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// A point in time, always carried internally in UTC.
pub type Instant = DateTime<Utc>;

/// A proleptic-Gregorian civil date, interpreted in JST for this crate.
pub type CivilDate = NaiveDate;

/// `Asia/Tokyo` is a fixed +09:00 offset with no DST; this is the only
/// offset the core ever formats or attributes against.
pub fn jst_offset() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("9h is a valid fixed offset")
}

/// Project an [`Instant`] onto the JST civil date it falls on.
///
/// This is the single attribution rule for the whole crate: no code path
/// may re-attribute by a different offset (e.g. UTC midnight).
pub fn attribute_jst(instant: Instant) -> CivilDate {
    instant.with_timezone(&jst_offset()).date_naive()
}

/// The instant of JST 00:00 on a given civil date, expressed in UTC.
pub fn jst_midnight(date: CivilDate) -> Instant {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_local_timezone(jst_offset())
        .single()
        .expect("fixed offset has no ambiguous times")
        .with_timezone(&Utc)
}

/// Format an instant as `YYYY-MM-DDTHH:MM:SS+09:00`.
pub fn format_jst_iso(instant: Instant) -> String {
    instant
        .with_timezone(&jst_offset())
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Endpoint inclusion policy for range queries: both ends are inclusive.
/// A single-day query is the degenerate range `[d, d]`.
pub fn range_contains(start: CivilDate, end: CivilDate, d: CivilDate) -> bool {
    start <= d && d <= end
}
