//! Lunisolar Builder (component E).
//!
//! Assembles lunar months from the new-moon series, places the leap month
//! using the solar-term engine's major-term tagging, and assigns
//! `(year, month, day, leap)` to civil dates. The year-segment and
//! leap-insertion algorithm follows `kalendarilo`'s `chinese::Annus::new`:
//! locate the new moon that starts the month containing each of two
//! consecutive winter solstices, number the months 11, 12, 1, 2, … between
//! them, and — if there are 13 rather than 12 — insert the leap at the
//! first month with no major term.

use chrono::Datelike;

use crate::attribution::{attribute_jst, jst_midnight, CivilDate, Instant};
use crate::error::CoreError;
use crate::newmoon::new_moons_between;
use crate::oracle::AstronomyOracle;
use crate::rootfind::Cancellation;
use crate::solarterm::{is_major_term, solar_longitude_crossings, solar_terms_between, WINTER_SOLSTICE_DEGREE};

/// Margin used when padding a requested date range before resolving
/// months: leap-month placement needs a full enclosing lunisolar year, so
/// we always resolve with generous margin and restrict afterwards.
const MONTH_MARGIN: chrono::Duration = chrono::Duration::days(60);
/// Winter solstices are ~365.25 days apart; this margin guarantees the
/// solstice search window brackets the padded request on both sides.
const SOLSTICE_MARGIN: chrono::Duration = chrono::Duration::days(400);
/// Extra slack so the new-moon series covers one full month on either
/// side of the bracketing solstices.
const NEW_MOON_MARGIN: chrono::Duration = chrono::Duration::days(40);

/// A half-open lunar month `[start, end)` with its resolved numbering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunarMonth {
    pub start: Instant,
    pub end: Instant,
    pub year: i32,
    pub number: u32,
    pub leap: bool,
}

impl LunarMonth {
    pub fn start_date(&self) -> CivilDate {
        attribute_jst(self.start)
    }

    pub fn end_date(&self) -> CivilDate {
        attribute_jst(self.end)
    }

    pub fn contains_date(&self, d: CivilDate) -> bool {
        self.start_date() <= d && d < self.end_date()
    }
}

/// Resolved `(year, month, day, leap)` for a civil date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunisolarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub leap: bool,
}

fn last_index_le(instants: &[Instant], target: Instant) -> Option<usize> {
    if instants.is_empty() || instants[0] > target {
        return None;
    }
    let pp = instants.partition_point(|&t| t <= target);
    Some(pp - 1)
}

fn count_between(instants: &[Instant], start: Instant, end: Instant) -> usize {
    instants.iter().filter(|&&t| t >= start && t < end).count()
}

fn month_year(number: u32, start: Instant, anchor_year: i32) -> i32 {
    if (1..=10).contains(&number) {
        attribute_jst(start).year()
    } else {
        anchor_year
    }
}

/// Resolve every lunar month overlapping `[d_start, d_end]`, padded so
/// leap placement near the boundary is always computed over a full
/// enclosing lunisolar year.
pub fn resolve_months(
    oracle: &dyn AstronomyOracle,
    d_start: CivilDate,
    d_end: CivilDate,
    cancel: Option<&Cancellation>,
) -> Result<Vec<LunarMonth>, CoreError> {
    if d_start > d_end {
        return Err(CoreError::InvalidInput {
            reason: format!("range start {d_start} is after end {d_end}"),
        });
    }

    let padded_start = jst_midnight(d_start) - MONTH_MARGIN;
    let padded_end = jst_midnight(d_end) + chrono::Duration::days(1) + MONTH_MARGIN;

    let ws_search_start = padded_start - SOLSTICE_MARGIN;
    let ws_search_end = padded_end + SOLSTICE_MARGIN;
    let winter_solstices = solar_longitude_crossings(
        oracle,
        ws_search_start,
        ws_search_end,
        WINTER_SOLSTICE_DEGREE as f64,
        cancel,
    )?;

    if winter_solstices.len() < 2 {
        return Err(CoreError::LunisolarResolutionFailed {
            reason: "fewer than two winter solstices found in the padded search window".into(),
        });
    }
    if winter_solstices[0] > padded_start || *winter_solstices.last().unwrap() < padded_end {
        return Err(CoreError::LunisolarResolutionFailed {
            reason: "winter-solstice search window did not bracket the requested range".into(),
        });
    }

    let nm_t0 = winter_solstices[0] - NEW_MOON_MARGIN;
    let nm_t1 = *winter_solstices.last().unwrap() + NEW_MOON_MARGIN;
    let new_moons = new_moons_between(oracle, nm_t0, nm_t1, cancel)?;

    let major_terms: Vec<Instant> = solar_terms_between(oracle, nm_t0, nm_t1, cancel)?
        .into_iter()
        .filter(|t| is_major_term(t.degree))
        .map(|t| t.at_utc)
        .collect();

    let mut months = Vec::new();
    for pair in winter_solstices.windows(2) {
        let (ws_a, ws_b) = (pair[0], pair[1]);
        let segment = resolve_segment(&new_moons, &major_terms, ws_a, ws_b)?;
        months.extend(segment);
    }
    months.sort_by_key(|m| m.start);
    Ok(months)
}

fn resolve_segment(
    new_moons: &[Instant],
    major_terms: &[Instant],
    ws_a: Instant,
    ws_b: Instant,
) -> Result<Vec<LunarMonth>, CoreError> {
    let m11_idx = last_index_le(new_moons, ws_a).ok_or_else(|| CoreError::LunisolarResolutionFailed {
        reason: "no new moon found at or before the anchoring winter solstice".into(),
    })?;
    let m11n_idx = last_index_le(new_moons, ws_b).ok_or_else(|| CoreError::LunisolarResolutionFailed {
        reason: "no new moon found at or before the following winter solstice".into(),
    })?;
    if m11n_idx + 1 >= new_moons.len() {
        return Err(CoreError::LunisolarResolutionFailed {
            reason: "new-moon series does not extend past the closing winter solstice".into(),
        });
    }

    let span_count = m11n_idx.checked_sub(m11_idx).ok_or_else(|| CoreError::LunisolarResolutionFailed {
        reason: "winter solstices are not in chronological order relative to new moons".into(),
    })?;
    let needs_leap = match span_count {
        12 => false,
        13 => true,
        n => {
            return Err(CoreError::LunisolarResolutionFailed {
                reason: format!("{n} months found between consecutive winter solstices (expected 12 or 13)"),
            })
        }
    };

    let anchor_year = attribute_jst(ws_a).year();
    let mut months = Vec::with_capacity(span_count);
    let mut month_no = 10u32;
    let mut leap_taken = !needs_leap;

    for idx in m11_idx..m11n_idx {
        let start = new_moons[idx];
        let end = new_moons[idx + 1];

        if !leap_taken && count_between(major_terms, start, end) == 0 {
            let year = month_year(month_no, start, anchor_year);
            months.push(LunarMonth {
                start,
                end,
                year,
                number: month_no,
                leap: true,
            });
            leap_taken = true;
            continue;
        }

        month_no = month_no % 12 + 1;
        let year = month_year(month_no, start, anchor_year);
        months.push(LunarMonth {
            start,
            end,
            year,
            number: month_no,
            leap: false,
        });
    }

    if !leap_taken {
        return Err(CoreError::LunisolarResolutionFailed {
            reason: "expected a zero-major-term month in a 13-month year but found none".into(),
        });
    }

    Ok(months)
}

/// Locate the `LunarMonth` whose span contains civil date `d`.
pub fn month_for_date(months: &[LunarMonth], d: CivilDate) -> Option<&LunarMonth> {
    months.iter().find(|m| m.contains_date(d))
}

/// Step 4 of the builder: assign `(year, month, day, leap)` to a civil
/// date given the already-resolved month sequence covering it.
pub fn date_for(months: &[LunarMonth], d: CivilDate) -> Result<LunisolarDate, CoreError> {
    let month = month_for_date(months, d).ok_or_else(|| CoreError::LunisolarResolutionFailed {
        reason: format!("no resolved lunar month covers {d}"),
    })?;
    let day = (d - month.start_date()).num_days() as u32 + 1;
    Ok(LunisolarDate {
        year: month.year,
        month: month.number,
        day,
        leap: month.leap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MeeusOracle;
    use chrono::NaiveDate;

    #[test]
    fn day_and_month_stay_in_valid_ranges_across_a_year() {
        let oracle = MeeusOracle;
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let months = resolve_months(&oracle, start, end, None).unwrap();
        let mut d = start;
        while d <= end {
            let ld = date_for(&months, d).unwrap();
            assert!((1..=12).contains(&ld.month), "month {} out of range", ld.month);
            assert!((1..=30).contains(&ld.day), "day {} out of range", ld.day);
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn at_most_one_leap_month_per_lunisolar_year() {
        let oracle = MeeusOracle;
        let start = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2017, 12, 31).unwrap();
        let months = resolve_months(&oracle, start, end, None).unwrap();
        use std::collections::HashMap;
        let mut leap_count: HashMap<i32, u32> = HashMap::new();
        for m in &months {
            if m.leap {
                *leap_count.entry(m.year).or_default() += 1;
            }
        }
        assert!(leap_count.values().all(|&c| c <= 1));
    }

    #[test]
    fn known_leap_month_2017_06_24() {
        // 2017 has a leap 5th month starting 2017-06-24 (widely documented).
        let oracle = MeeusOracle;
        let start = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2017, 12, 31).unwrap();
        let months = resolve_months(&oracle, start, end, None).unwrap();
        let d = NaiveDate::from_ymd_opt(2017, 6, 24).unwrap();
        let ld = date_for(&months, d).unwrap();
        assert_eq!(ld.month, 5);
        assert_eq!(ld.day, 1);
        assert!(ld.leap, "expected {d} to be the first day of a leap month");
    }

    #[test]
    fn months_cover_the_range_without_gaps() {
        let oracle = MeeusOracle;
        let start = NaiveDate::from_ymd_opt(2020, 1, 20).unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let months = resolve_months(&oracle, start, end, None).unwrap();
        let mut d = start;
        while d <= end {
            assert!(month_for_date(&months, d).is_some(), "no month covers {d}");
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn reversed_range_is_invalid_input() {
        let oracle = MeeusOracle;
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(matches!(
            resolve_months(&oracle, start, end, None),
            Err(CoreError::InvalidInput { .. })
        ));
    }
}
