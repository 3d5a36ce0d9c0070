//! Public Record Assembler (component H).
//!
//! Composes the stable JSON-shaped day/range records from the lunisolar
//! builder, the rokuyō assigner, the solar-term engine, the new-moon
//! series, and the oracle's rise/set and moon-age queries. This is the
//! only module that knows the external JSON shape; everything upstream
//! deals in plain Rust types.

use serde::Serialize;

use crate::attribution::{attribute_jst, format_jst_iso, jst_midnight, CivilDate};
use crate::config::Config;
use crate::error::CoreError;
use crate::lunisolar::{self, LunarMonth};
use crate::newmoon::new_moons_between;
use crate::oracle::AstronomyOracle;
use crate::rokuyo::rokuyo;
use crate::rootfind::Cancellation;
use crate::solarterm::{solar_terms_between, SolarTerm};

const KANJI_DIGITS: [&str; 13] = [
    "", "一", "二", "三", "四", "五", "六", "七", "八", "九", "十", "十一", "十二",
];

fn month_label(month: u32, leap: bool) -> String {
    format!("{}{:02}", if leap { "閏" } else { "" }, month)
}

fn month_name(month: u32, leap: bool) -> String {
    format!("{}{}月", if leap { "閏" } else { "" }, KANJI_DIGITS[month as usize])
}

fn round6(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub tz: &'static str,
    pub day_basis: &'static str,
    pub ephemeris: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LunisolarInfo {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub leap: bool,
    pub month_label: String,
    pub label: String,
    pub month_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SekkiEvent {
    pub name: &'static str,
    pub degree: u32,
    pub at_jst: String,
    pub date_jst: String,
}

impl From<&SolarTerm> for SekkiEvent {
    fn from(term: &SolarTerm) -> Self {
        SekkiEvent {
            name: term.name,
            degree: term.degree,
            at_jst: format_jst_iso(term.at_utc),
            date_jst: attribute_jst(term.at_utc).format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SekkiBlock {
    pub primary: SekkiEvent,
    pub events: Vec<SekkiEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub at_jst: String,
    pub date_jst: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AstronomyBlock {
    pub moon_age: f64,
    pub phase_event: Option<PhaseEvent>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayRecord {
    pub meta: Meta,
    pub date: String,
    pub lunisolar: LunisolarInfo,
    pub rokuyo: &'static str,
    pub sekki: Option<SekkiBlock>,
    pub astronomy: AstronomyBlock,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeBounds {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsBlock {
    pub sekki: Vec<SekkiEvent>,
    pub moon_phases: Vec<PhaseEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeRecord {
    pub meta: Meta,
    pub range: RangeBounds,
    pub days: Vec<DayRecord>,
    pub events: EventsBlock,
}

fn build_day_record(
    cfg: &Config,
    ephemeris_name: &str,
    oracle: &dyn AstronomyOracle,
    months: &[LunarMonth],
    terms: &[SolarTerm],
    moons: &[chrono::DateTime<chrono::Utc>],
    d: CivilDate,
) -> Result<DayRecord, CoreError> {
    let ld = lunisolar::date_for(months, d)?;
    let lunisolar = LunisolarInfo {
        year: ld.year,
        month: ld.month,
        day: ld.day,
        leap: ld.leap,
        month_label: month_label(ld.month, ld.leap),
        label: format!("{}/{:02}", month_label(ld.month, ld.leap), ld.day),
        month_name: month_name(ld.month, ld.leap),
    };

    let day_terms: Vec<SekkiEvent> = terms
        .iter()
        .filter(|t| attribute_jst(t.at_utc) == d)
        .map(SekkiEvent::from)
        .collect();
    let sekki = day_terms.first().cloned().map(|primary| SekkiBlock {
        primary,
        events: day_terms,
    });

    let moon_age = round6(oracle.moon_age_days(d));
    let phase_event = moons
        .iter()
        .find(|&&m| attribute_jst(m) == d)
        .map(|&m| PhaseEvent {
            kind: "new_moon",
            at_jst: format_jst_iso(m),
            date_jst: d.format("%Y-%m-%d").to_string(),
        });

    let (sunrise, sunset) = oracle.sunrise_sunset(d, cfg.lat, cfg.lon);
    let astronomy = AstronomyBlock {
        moon_age,
        phase_event,
        sunrise: sunrise.map(format_jst_iso),
        sunset: sunset.map(format_jst_iso),
    };

    Ok(DayRecord {
        meta: Meta {
            tz: cfg.tz,
            day_basis: cfg.day_basis,
            ephemeris: ephemeris_name.to_string(),
        },
        date: d.format("%Y-%m-%d").to_string(),
        lunisolar,
        rokuyo: rokuyo(ld.month, ld.day),
        sekki,
        astronomy,
    })
}

/// Assemble the full record for `[d_start, d_end]` (a single date is the
/// degenerate range `d_start == d_end`).
pub fn build_range(
    oracle: &dyn AstronomyOracle,
    ephemeris_name: &str,
    cfg: &Config,
    d_start: CivilDate,
    d_end: CivilDate,
    cancel: Option<&Cancellation>,
) -> Result<RangeRecord, CoreError> {
    if d_start > d_end {
        return Err(CoreError::InvalidInput {
            reason: format!("range start {d_start} is after end {d_end}"),
        });
    }

    let (valid_from, valid_to) = oracle.validity_range();
    let (valid_from, valid_to) = (attribute_jst(valid_from), attribute_jst(valid_to));
    if d_start < valid_from || d_start > valid_to {
        return Err(CoreError::OutOfEphemerisRange { date: d_start });
    }
    if d_end < valid_from || d_end > valid_to {
        return Err(CoreError::OutOfEphemerisRange { date: d_end });
    }

    let months = lunisolar::resolve_months(oracle, d_start, d_end, cancel)?;

    let t0 = jst_midnight(d_start);
    let t1 = jst_midnight(d_end) + chrono::Duration::days(1);
    let terms = solar_terms_between(oracle, t0, t1, cancel)?;
    let moons = new_moons_between(oracle, t0, t1, cancel)?;

    let mut days = Vec::new();
    let mut d = d_start;
    loop {
        days.push(build_day_record(cfg, ephemeris_name, oracle, &months, &terms, &moons, d)?);
        if d == d_end {
            break;
        }
        d = d.succ_opt().expect("civil date within range has a successor");
    }

    let events = EventsBlock {
        sekki: terms.iter().map(SekkiEvent::from).collect(),
        moon_phases: moons
            .iter()
            .map(|&m| PhaseEvent {
                kind: "new_moon",
                at_jst: format_jst_iso(m),
                date_jst: attribute_jst(m).format("%Y-%m-%d").to_string(),
            })
            .collect(),
    };

    Ok(RangeRecord {
        meta: Meta {
            tz: cfg.tz,
            day_basis: cfg.day_basis,
            ephemeris: ephemeris_name.to_string(),
        },
        range: RangeBounds {
            start: d_start.format("%Y-%m-%d").to_string(),
            end: d_end.format("%Y-%m-%d").to_string(),
        },
        days,
        events,
    })
}

/// Assemble the record for a single civil date. Always equal to the
/// matching entry of [`build_range`]'s `days` for the degenerate range
/// `[d, d]`.
pub fn build_day(
    oracle: &dyn AstronomyOracle,
    ephemeris_name: &str,
    cfg: &Config,
    d: CivilDate,
    cancel: Option<&Cancellation>,
) -> Result<DayRecord, CoreError> {
    let mut range = build_range(oracle, ephemeris_name, cfg, d, d, cancel)?;
    Ok(range.days.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MeeusOracle;
    use chrono::NaiveDate;

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn leap_fifth_month_of_2017_06_24() {
        let oracle = MeeusOracle;
        let d = NaiveDate::from_ymd_opt(2017, 6, 24).unwrap();
        let rec = build_day(&oracle, "de440s.bsp", &cfg(), d, None).unwrap();
        assert_eq!(rec.lunisolar.year, 2017);
        assert_eq!(rec.lunisolar.month, 5);
        assert_eq!(rec.lunisolar.day, 1);
        assert!(rec.lunisolar.leap);
        assert_eq!(rec.lunisolar.label, "閏05/01");
        assert_eq!(rec.lunisolar.month_name, "閏五月");
    }

    #[test]
    fn summer_solstice_in_range_is_sekki_primary() {
        let oracle = MeeusOracle;
        let start = NaiveDate::from_ymd_opt(2017, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2017, 9, 30).unwrap();
        let range = build_range(&oracle, "de440s.bsp", &cfg(), start, end, None).unwrap();

        let expected_order = ["夏至", "小暑", "大暑", "立秋", "処暑", "白露", "秋分"];
        let names: Vec<&str> = range.events.sekki.iter().map(|e| e.name).collect();
        assert_eq!(names, expected_order);

        let d = NaiveDate::from_ymd_opt(2017, 6, 21).unwrap();
        let day = range.days.iter().find(|r| r.date == d.format("%Y-%m-%d").to_string()).unwrap();
        let sekki = day.sekki.as_ref().expect("expected a term on the solstice day");
        assert_eq!(sekki.primary.name, "夏至");
        assert_eq!(sekki.primary.degree, 90);
    }

    #[test]
    fn new_year_2020_01_25() {
        let oracle = MeeusOracle;
        let d = NaiveDate::from_ymd_opt(2020, 1, 25).unwrap();
        let rec = build_day(&oracle, "de440s.bsp", &cfg(), d, None).unwrap();
        assert_eq!(rec.lunisolar.month, 1);
        assert_eq!(rec.lunisolar.day, 1);
        assert_eq!(rec.rokuyo, "先勝");
    }

    #[test]
    fn single_new_moon_in_range_2026_02() {
        let oracle = MeeusOracle;
        let start = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 25).unwrap();
        let range = build_range(&oracle, "de440s.bsp", &cfg(), start, end, None).unwrap();
        assert_eq!(range.events.moon_phases.len(), 1);
        let phase = &range.events.moon_phases[0];
        let day = range
            .days
            .iter()
            .find(|r| r.astronomy.phase_event.is_some())
            .expect("one day should carry the phase event");
        assert_eq!(day.astronomy.phase_event.as_ref().unwrap().date_jst, phase.date_jst);
    }

    #[test]
    fn high_latitude_midwinter_has_no_sunrise_or_sunset() {
        let oracle = MeeusOracle;
        let mut cfg = cfg();
        cfg.lat = 80.0;
        cfg.lon = 0.0;
        let d = NaiveDate::from_ymd_opt(2026, 12, 21).unwrap();
        let rec = build_day(&oracle, "de440s.bsp", &cfg, d, None).unwrap();
        assert!(rec.astronomy.sunrise.is_none());
        assert!(rec.astronomy.sunset.is_none());
    }

    #[test]
    fn range_day_matches_single_day_record() {
        let oracle = MeeusOracle;
        let start = NaiveDate::from_ymd_opt(2023, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 4, 10).unwrap();
        let range = build_range(&oracle, "de440s.bsp", &cfg(), start, end, None).unwrap();
        let probe = NaiveDate::from_ymd_opt(2023, 4, 5).unwrap();
        let single = build_day(&oracle, "de440s.bsp", &cfg(), probe, None).unwrap();
        let from_range = range
            .days
            .iter()
            .find(|r| r.date == probe.format("%Y-%m-%d").to_string())
            .unwrap();
        assert_eq!(
            serde_json::to_string(&single).unwrap(),
            serde_json::to_string(from_range).unwrap()
        );
    }

    #[test]
    fn date_outside_ephemeris_validity_window_is_rejected() {
        let oracle = MeeusOracle;
        let d = NaiveDate::from_ymd_opt(1000, 1, 1).unwrap();
        let err = build_day(&oracle, "de440s.bsp", &cfg(), d, None).unwrap_err();
        assert!(matches!(err, CoreError::OutOfEphemerisRange { date } if date == d));
    }

    #[test]
    fn endpoints_are_both_present_in_days() {
        let oracle = MeeusOracle;
        let start = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 3, 5).unwrap();
        let range = build_range(&oracle, "de440s.bsp", &cfg(), start, end, None).unwrap();
        assert_eq!(range.days.first().unwrap().date, "2022-03-01");
        assert_eq!(range.days.last().unwrap().date, "2022-03-05");
    }
}
