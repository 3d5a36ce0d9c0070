//! Low-precision solar and lunar position formulas (Meeus, *Astronomical
//! Algorithms*, low-precision variants).
//!
//! Ported from the truncated-series style used across the retrieved
//! corpus: the sun formulas follow `redshift-rs`'s `solar.rs`
//! (`sun_geom_mean_lon`, `sun_equation_of_center`, `sun_apparent_lon`,
//! `solar_declination`, `equation_of_time`), and the lunar longitude series
//! follows `astrotimes`'s `moon.rs` (`moon_mean_longitude` through
//! `moon_ecliptic_coords`), both truncated to the dominant periodic terms.
//! This is a deliberately lower-precision `AstronomyOracle` implementation,
//! trading sub-arcsecond accuracy for freedom from a multi-hundred-MB
//! kernel file.

use std::f64::consts::PI;

use crate::attribution::Instant;

const DEG_TO_RAD: f64 = PI / 180.0;

fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Julian day (UT) for an instant.
pub fn julian_day(t: Instant) -> f64 {
    2_440_587.5 + (t.timestamp() as f64 + t.timestamp_subsec_nanos() as f64 / 1e9) / 86_400.0
}

/// Julian centuries since J2000.0.
pub fn julian_century(jd: f64) -> f64 {
    (jd - 2_451_545.0) / 36_525.0
}

// ---- Sun (redshift-rs `JulianCents` impl, ported to free functions) ----

fn sun_geom_mean_lon_deg(t: f64) -> f64 {
    normalize_degrees(280.466_46 + t * (36_000.769_83 + t * 0.000_303_2))
}

fn sun_geom_mean_anomaly_deg(t: f64) -> f64 {
    357.529_11 + t * (35_999.050_29 - t * 0.000_153_7)
}

fn earth_orbit_eccentricity(t: f64) -> f64 {
    0.016_708_634 - t * (0.000_042_037 + t * 0.000_000_126_7)
}

fn sun_equation_of_center_deg(t: f64) -> f64 {
    let m = sun_geom_mean_anomaly_deg(t) * DEG_TO_RAD;
    m.sin() * (1.914_602 - t * (0.004_817 + 0.000_014 * t))
        + (2.0 * m).sin() * (0.019_993 - 0.000_101 * t)
        + (3.0 * m).sin() * 0.000_289
}

fn sun_true_lon_deg(t: f64) -> f64 {
    sun_geom_mean_lon_deg(t) + sun_equation_of_center_deg(t)
}

/// Apparent ecliptic longitude of the Sun, nutation/aberration corrected,
/// in `[0, 360)` degrees.
pub fn sun_apparent_lon_deg(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    let o = sun_true_lon_deg(t);
    normalize_degrees(o - 0.005_69 - 0.004_78 * (omega * DEG_TO_RAD).sin())
}

fn mean_ecliptic_obliquity_deg(t: f64) -> f64 {
    let sec = 21.448 - t * (46.815 + t * (0.000_59 - t * 0.001_813));
    23.0 + (26.0 + sec / 60.0) / 60.0
}

fn obliquity_corr_deg(t: f64) -> f64 {
    let e0 = mean_ecliptic_obliquity_deg(t);
    let omega = 125.04 - t * 1934.136;
    e0 + 0.002_56 * (omega * DEG_TO_RAD).cos()
}

fn solar_declination_rad(t: f64) -> f64 {
    let e = obliquity_corr_deg(t) * DEG_TO_RAD;
    let lambda = sun_apparent_lon_deg(t) * DEG_TO_RAD;
    (e.sin() * lambda.sin()).asin()
}

/// Equation of time, in minutes.
fn equation_of_time_minutes(t: f64) -> f64 {
    let l0 = sun_geom_mean_lon_deg(t) * DEG_TO_RAD;
    let e = earth_orbit_eccentricity(t);
    let m = sun_geom_mean_anomaly_deg(t) * DEG_TO_RAD;
    let y = (obliquity_corr_deg(t) * DEG_TO_RAD / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * e * m.sin() + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * e * e * (2.0 * m).sin();
    4.0 * eq.to_degrees()
}

// ---- Moon (astrotimes `moon.rs`, longitude series only) ----

fn moon_mean_longitude_deg(t: f64) -> f64 {
    normalize_degrees(
        218.316_447_7
            + t * (481_267.881_234_21 + t * (-0.001_578_6 + t * (1.0 / 538_841.0))),
    )
}

fn moon_mean_elongation_deg(t: f64) -> f64 {
    normalize_degrees(297.850_192_1 + t * (445_267.111_403_4 + t * -0.001_881_9))
}

fn sun_mean_anomaly_for_moon_deg(t: f64) -> f64 {
    normalize_degrees(357.529_109_2 + t * 35_999.050_290_9)
}

fn moon_mean_anomaly_deg(t: f64) -> f64 {
    normalize_degrees(134.963_396_4 + t * (477_198.867_505_5 + t * 0.008_741_4))
}

fn moon_argument_latitude_deg(t: f64) -> f64 {
    normalize_degrees(93.272_095_0 + t * (483_202.017_523_3 - t * 0.003_653_9))
}

/// Geocentric ecliptic longitude of the Moon (dominant periodic terms
/// only), in `[0, 360)` degrees.
pub fn moon_ecliptic_longitude_deg(t: f64) -> f64 {
    let l_prime = moon_mean_longitude_deg(t);
    let d = moon_mean_elongation_deg(t) * DEG_TO_RAD;
    let m = sun_mean_anomaly_for_moon_deg(t) * DEG_TO_RAD;
    let m_prime = moon_mean_anomaly_deg(t) * DEG_TO_RAD;
    let f = moon_argument_latitude_deg(t) * DEG_TO_RAD;

    let sigma_l = 6_288_774.0 * m_prime.sin()
        + 1_274_027.0 * (2.0 * d - m_prime).sin()
        + 658_314.0 * (2.0 * d).sin()
        + 213_618.0 * (2.0 * m_prime).sin()
        - 185_116.0 * m.sin()
        - 114_332.0 * (2.0 * f).sin()
        + 58_793.0 * (2.0 * d - 2.0 * m_prime).sin()
        + 57_066.0 * (2.0 * d - m - m_prime).sin()
        + 53_322.0 * (2.0 * d + m_prime).sin()
        + 45_758.0 * (2.0 * d - m).sin();

    normalize_degrees(l_prime + sigma_l / 1_000_000.0)
}

/// Mean synodic month, in days (for the moon-age linear approximation).
pub const MEAN_SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;

/// Sun's apparent ecliptic longitude at instant `t`, `[0, 360)`.
pub fn sun_ecliptic_longitude_deg(t: Instant) -> f64 {
    sun_apparent_lon_deg(julian_century(julian_day(t)))
}

/// Moon phase angle: `(moon_longitude - sun_longitude) mod 360`. `0` = new,
/// `90` = first quarter, `180` = full, `270` = last quarter.
pub fn moon_phase_deg(t: Instant) -> f64 {
    let jc = julian_century(julian_day(t));
    normalize_degrees(moon_ecliptic_longitude_deg(jc) - sun_apparent_lon_deg(jc))
}

/// Sunrise/sunset hour angle and solar-noon offset for a given civil
/// `date` and longitude, sampled near local solar noon via
/// `t_noon_guess`. Returns `None` for either event when the sun never
/// reaches the twilight elevation that day (polar day/night).
///
/// `solar_noon_minutes`/`sunrise_minutes`/`sunset_minutes` are minute
/// offsets from 00:00 UTC of `date` (the NOAA formula's convention), so
/// they must be added back onto UTC midnight of `date`, not onto
/// `t_noon_guess - 12h` (which lands on JST midnight, 9h earlier).
pub fn sunrise_sunset_utc(
    date: chrono::NaiveDate,
    t_noon_guess: Instant,
    lat_deg: f64,
    lon_deg: f64,
) -> (Option<Instant>, Option<Instant>) {
    let jd = julian_day(t_noon_guess);
    let t = julian_century(jd);

    let eq_time = equation_of_time_minutes(t);
    let decl = solar_declination_rad(t);
    let lat = lat_deg * DEG_TO_RAD;

    // Standard solar altitude at sunrise/sunset, corrected for refraction
    // and the Sun's apparent radius.
    const SUNRISE_ELEVATION_DEG: f64 = -0.833;
    let cos_ha =
        ((SUNRISE_ELEVATION_DEG * DEG_TO_RAD).sin() - lat.sin() * decl.sin())
            / (lat.cos() * decl.cos());

    if !(-1.0..=1.0).contains(&cos_ha) {
        return (None, None);
    }

    let ha_deg = cos_ha.acos().to_degrees();
    let solar_noon_minutes = 720.0 - 4.0 * lon_deg - eq_time;
    let sunrise_minutes = solar_noon_minutes - 4.0 * ha_deg;
    let sunset_minutes = solar_noon_minutes + 4.0 * ha_deg;

    let midnight = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let to_instant = |minutes: f64| midnight + chrono::Duration::seconds((minutes * 60.0).round() as i64);

    (Some(to_instant(sunrise_minutes)), Some(to_instant(sunset_minutes)))
}
