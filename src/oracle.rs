//! Astronomy Oracle (component A) and the process-wide ephemeris handle.
//!
//! The oracle is the capability boundary between astronomical computation
//! and everything downstream of it: a high-precision full ephemeris, a
//! lower-precision closed-form model, or a deterministic fake for tests can
//! all sit behind it interchangeably. [`MeeusOracle`] is the lower-precision
//! variant, built
//! from the formulas in [`crate::astro`]; every downstream component
//! (root finder, new-moon series, solar terms, lunisolar builder) depends
//! only on the [`AstronomyOracle`] trait, so a kernel-backed oracle is a
//! drop-in replacement.

use std::sync::OnceLock;

use crate::astro;
use crate::attribution::{jst_midnight, CivilDate, Instant};
use crate::config::{Config, EphemerisSource};
use crate::error::CoreError;

/// Pure, side-effect-free time -> astronomical-quantity mapping.
pub trait AstronomyOracle: Send + Sync {
    /// Sun's apparent ecliptic longitude, `[0, 360)` degrees.
    fn sun_ecliptic_longitude_deg(&self, t: Instant) -> f64;

    /// Moon phase angle, `[0, 360)` degrees. `0` = new, `90` = first
    /// quarter, `180` = full, `270` = last quarter.
    fn moon_phase_deg(&self, t: Instant) -> f64;

    /// Age of the Moon in civil days since the preceding new moon, sampled
    /// at JST 00:00 of `date`.
    fn moon_age_days(&self, date: CivilDate) -> f64 {
        let t = jst_midnight(date);
        let phase = self.moon_phase_deg(t);
        phase / 360.0 * astro::MEAN_SYNODIC_MONTH_DAYS
    }

    /// Sunrise/sunset for an observer at `(lat, lon)` on `date`. Either or
    /// both may be `None` at high latitudes (polar day/night) — this is
    /// not an error.
    fn sunrise_sunset(&self, date: CivilDate, lat: f64, lon: f64) -> (Option<Instant>, Option<Instant>);

    /// The instant range over which this oracle's answers are considered
    /// valid.
    fn validity_range(&self) -> (Instant, Instant);
}

/// The bundled lower-precision oracle: Meeus truncated series, no file I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeeusOracle;

impl AstronomyOracle for MeeusOracle {
    fn sun_ecliptic_longitude_deg(&self, t: Instant) -> f64 {
        astro::sun_ecliptic_longitude_deg(t)
    }

    fn moon_phase_deg(&self, t: Instant) -> f64 {
        astro::moon_phase_deg(t)
    }

    fn sunrise_sunset(&self, date: CivilDate, lat: f64, lon: f64) -> (Option<Instant>, Option<Instant>) {
        let noon_guess = jst_midnight(date) + chrono::Duration::hours(12);
        astro::sunrise_sunset_utc(date, noon_guess, lat, lon)
    }

    fn validity_range(&self) -> (Instant, Instant) {
        use chrono::TimeZone;
        // Approximates the validity window of JPL's de440s.bsp; the Meeus
        // truncated series themselves degrade gracefully well past this,
        // but requests are capped to this window.
        (
            chrono::Utc.with_ymd_and_hms(1550, 1, 1, 0, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2650, 1, 1, 0, 0, 0).unwrap(),
        )
    }
}

/// Opaque resource acquired once per process; lifecycle = process.
pub struct EphemerisHandle {
    pub ephemeris_name: String,
    oracle: MeeusOracle,
}

impl EphemerisHandle {
    pub fn oracle(&self) -> &dyn AstronomyOracle {
        &self.oracle
    }

    fn load(cfg: &Config) -> Result<Self, CoreError> {
        // Only an explicitly requested source (a caller-supplied path/name
        // or the TOKI_EPHEMERIS{,_PATH} env vars) is required to resolve
        // to a readable file; the crate's own hardcoded default is allowed
        // to serve the bundled lower-precision oracle with no file at all.
        if cfg.ephemeris.is_explicit() {
            let path = cfg.ephemeris.resolved_path();
            if !path.is_file() {
                return Err(CoreError::EphemerisUnavailable {
                    hint: format!(
                        "explicitly requested ephemeris '{}' not found at {}",
                        cfg.ephemeris.display_name(),
                        path.display()
                    ),
                });
            }
        }

        eprintln!(
            "toki_reki: ephemeris handle acquired ({})",
            cfg.ephemeris.display_name()
        );

        Ok(EphemerisHandle {
            ephemeris_name: cfg.ephemeris.display_name(),
            oracle: MeeusOracle,
        })
    }
}

static HANDLE: OnceLock<Result<EphemerisHandle, CoreError>> = OnceLock::new();

/// Acquire the process-wide ephemeris handle, initializing it on first use
/// behind a single-initialization guard. Subsequent calls (with any
/// config) reuse the first successfully-or-unsuccessfully resolved result.
pub fn acquire(cfg: &Config) -> Result<&'static EphemerisHandle, CoreError> {
    HANDLE
        .get_or_init(|| EphemerisHandle::load(cfg))
        .as_ref()
        .map_err(Clone::clone)
}
