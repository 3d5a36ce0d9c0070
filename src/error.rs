//! Error kinds for the calendrical core.
//!
//! One `thiserror` enum covering every failure mode, with a variant per
//! lower-layer failure so it maps 1:1 onto its source; no partial results
//! ever escape past an `Err`.

use thiserror::Error;

use crate::attribution::CivilDate;

/// Failure modes surfaced by the calendrical core.
///
/// The core never returns a half-built record: any of these aborts the
/// whole request (a single day or an entire range).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The ephemeris handle could not be acquired (missing/unreadable file,
    /// or the process-wide singleton failed to initialize).
    #[error("ephemeris unavailable: {hint}")]
    EphemerisUnavailable { hint: String },

    /// The requested date falls outside the oracle's validity window.
    #[error("date {date} is outside the ephemeris validity range")]
    OutOfEphemerisRange { date: CivilDate },

    /// Bisection failed to converge on a crossing within the iteration cap.
    #[error("root finder failed to converge near {near}")]
    RootFindFailed { near: String },

    /// The winter-solstice anchor or a required new moon could not be
    /// located inside the padded resolution window.
    #[error("lunisolar resolution failed: {reason}")]
    LunisolarResolutionFailed { reason: String },

    /// Malformed input: reversed range, out-of-bounds lat/lon, bad date.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The caller cancelled the request before it completed.
    #[error("request cancelled")]
    Cancelled,
}
