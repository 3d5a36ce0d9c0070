//! New-Moon Series (component C).

use crate::attribution::Instant;
use crate::error::CoreError;
use crate::oracle::AstronomyOracle;
use crate::rootfind::{Cancellation, RootFinder};

/// Every new-moon instant (moon phase crossing 0° going forward) in
/// `[t0, t1)`. `t0` is included if it lands exactly on a crossing; `t1` is
/// always excluded.
///
/// Invariant checked by the caller, not re-derived here: consecutive
/// results are strictly increasing with a gap in `[27, 31]` days.
pub fn new_moons_between(
    oracle: &dyn AstronomyOracle,
    t0: Instant,
    t1: Instant,
    cancel: Option<&Cancellation>,
) -> Result<Vec<Instant>, CoreError> {
    let rf = RootFinder::default();
    let mut moons = rf.find_crossings(|t| oracle.moon_phase_deg(t), t0, t1, 0.0, cancel)?;
    moons.retain(|&m| m < t1);
    Ok(moons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MeeusOracle;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn gaps_between_consecutive_new_moons_are_in_range() {
        let oracle = MeeusOracle;
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::days(400);
        let moons = new_moons_between(&oracle, t0, t1, None).unwrap();
        assert!(moons.len() >= 12);
        for w in moons.windows(2) {
            let gap_days = (w[1] - w[0]).num_seconds() as f64 / 86_400.0;
            assert!(
                (27.0..=31.0).contains(&gap_days),
                "gap {gap_days} days out of range"
            );
        }
    }

    #[test]
    fn results_are_strictly_ascending() {
        let oracle = MeeusOracle;
        let t0 = Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::days(200);
        let moons = new_moons_between(&oracle, t0, t1, None).unwrap();
        for w in moons.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn endpoint_t1_is_excluded() {
        let oracle = MeeusOracle;
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::days(60);
        let moons = new_moons_between(&oracle, t0, t1, None).unwrap();
        assert!(moons.iter().all(|&m| m < t1));
    }
}
