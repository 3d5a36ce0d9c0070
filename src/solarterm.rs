//! Solar-Term Engine (component D).

use serde::Serialize;

use crate::attribution::Instant;
use crate::error::CoreError;
use crate::oracle::AstronomyOracle;
use crate::rootfind::{Cancellation, RootFinder};

/// Canonical name for each of the 24 solar terms.
/// Index `k` (0..24) corresponds to ecliptic longitude `k * 15` degrees.
pub const TERM_NAMES: [&str; 24] = [
    "春分", "清明", "穀雨", "立夏", "小満", "芒種", "夏至", "小暑", "大暑", "立秋", "処暑", "白露",
    "秋分", "寒露", "霜降", "立冬", "小雪", "大雪", "冬至", "小寒", "大寒", "立春", "雨水", "啓蟄",
];

/// One of the 24 solar terms, tagged with the instant it occurs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolarTerm {
    pub name: &'static str,
    /// `0..=345`, step 15.
    pub degree: u32,
    pub at_utc: Instant,
}

/// Degree 270 (冬至, winter solstice): the year anchor for the lunisolar
/// builder.
pub const WINTER_SOLSTICE_DEGREE: u32 = 270;

/// Major terms (中気) are the 12 even multiples of 30°; these drive
/// leap-month placement. Minor terms (節) are the odd multiples of 15°.
pub fn is_major_term(degree: u32) -> bool {
    degree % 30 == 0
}

pub fn term_name(degree: u32) -> &'static str {
    TERM_NAMES[(degree / 15) as usize % 24]
}

/// All crossings of a single target degree (e.g. a single solar term) in
/// `[t0, t1)`.
pub fn solar_longitude_crossings(
    oracle: &dyn AstronomyOracle,
    t0: Instant,
    t1: Instant,
    target_deg: f64,
    cancel: Option<&Cancellation>,
) -> Result<Vec<Instant>, CoreError> {
    let rf = RootFinder::default();
    let mut crossings = rf.find_crossings(
        |t| oracle.sun_ecliptic_longitude_deg(t),
        t0,
        t1,
        target_deg,
        cancel,
    )?;
    crossings.retain(|&c| c < t1);
    Ok(crossings)
}

/// All 24 solar-term crossings in `[t0, t1)`, sorted ascending.
pub fn solar_terms_between(
    oracle: &dyn AstronomyOracle,
    t0: Instant,
    t1: Instant,
    cancel: Option<&Cancellation>,
) -> Result<Vec<SolarTerm>, CoreError> {
    let mut terms = Vec::new();
    for k in 0..24u32 {
        let target = (k * 15) as f64;
        let crossings = solar_longitude_crossings(oracle, t0, t1, target, cancel)?;
        for at_utc in crossings {
            terms.push(SolarTerm {
                name: term_name(k * 15),
                degree: k * 15,
                at_utc,
            });
        }
    }
    terms.sort_by_key(|term| term.at_utc);
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MeeusOracle;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn major_terms_are_even_multiples_of_30() {
        for k in 0..24u32 {
            let deg = k * 15;
            assert_eq!(is_major_term(deg), deg % 30 == 0);
        }
    }

    #[test]
    fn names_match_canonical_table() {
        assert_eq!(term_name(0), "春分");
        assert_eq!(term_name(270), "冬至");
        assert_eq!(term_name(345), "啓蟄");
    }

    #[test]
    fn at_most_one_of_each_term_in_a_366_day_window() {
        let oracle = MeeusOracle;
        let t0 = Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::days(366);
        let terms = solar_terms_between(&oracle, t0, t1, None).unwrap();
        for k in 0..24u32 {
            let count = terms.iter().filter(|t| t.degree == k * 15).count();
            assert!(count <= 1, "degree {} appeared {count} times", k * 15);
        }
    }

    #[test]
    fn summer_solstice_near_june_21_2017() {
        let oracle = MeeusOracle;
        let t0 = Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::days(30);
        let crossings = solar_longitude_crossings(&oracle, t0, t1, 90.0, None).unwrap();
        assert_eq!(crossings.len(), 1);
        let expected = Utc.with_ymd_and_hms(2017, 6, 21, 4, 24, 0).unwrap();
        assert!((crossings[0] - expected).num_hours().abs() <= 6);
    }

    #[test]
    fn terms_sorted_ascending() {
        let oracle = MeeusOracle;
        let t0 = Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::days(120);
        let terms = solar_terms_between(&oracle, t0, t1, None).unwrap();
        for w in terms.windows(2) {
            assert!(w[1].at_utc > w[0].at_utc);
        }
    }
}
