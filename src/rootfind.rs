//! Root finder (component B).
//!
//! Brackets and bisects a cyclic quantity `g(t) mod 360` against a target
//! degree across an arbitrary interval. Grounded on the iterative
//! search-then-correct pattern used for solstice/equinox finding in
//! `sxtwl`'s `astronomy.rs` (coarse scan, then Newton-ish refinement),
//! adapted here to plain bisection so it needs only forward samples of
//! `g`, never its derivative.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Duration;

use crate::attribution::Instant;
use crate::error::CoreError;

/// Cooperative cancellation flag, checked at each scan-step boundary so a
/// cancel observed mid-scan ends the search within O(step) work.
#[derive(Default)]
pub struct Cancellation(AtomicBool);

impl Cancellation {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bracket + bisect search over a cyclic (mod 360) quantity.
#[derive(Debug, Clone, Copy)]
pub struct RootFinder {
    /// Coarse scan step. Default 3h: safe because the fastest target
    /// quantity (lunar phase, ~12.19 deg/day) never traverses 360 deg in
    /// under a day, let alone in 3h.
    pub step_hours: i64,
    /// Bisection iteration cap.
    pub max_iterations: u32,
    /// Absolute time tolerance for convergence.
    pub time_tolerance: Duration,
    /// Absolute degree tolerance for convergence (whichever is tighter).
    pub degree_tolerance: f64,
    /// Crossings within this distance of each other are deduplicated.
    pub dedup_window: Duration,
}

impl Default for RootFinder {
    fn default() -> Self {
        RootFinder {
            step_hours: 3,
            max_iterations: 60,
            time_tolerance: Duration::seconds(1),
            degree_tolerance: 1e-4,
            dedup_window: Duration::minutes(1),
        }
    }
}

/// Map a raw `g - target` difference to a signed residual in `(-180, 180]`,
/// so a forward crossing of `target` shows up as a sign change from
/// negative to non-negative rather than a jump from ~360 to ~0.
fn signed_residual(g: f64, target: f64) -> f64 {
    let u = (g - target).rem_euclid(360.0);
    if u > 180.0 {
        u - 360.0
    } else {
        u
    }
}

impl RootFinder {
    /// Every instant in `[a, b]` at which `g(t) ≡ target (mod 360)`,
    /// crossing in the direction of increase. `a` is included if it is
    /// exactly on a crossing; `b` is included only if bracketing succeeds
    /// going forward from the last scan sample at or before `b`.
    pub fn find_crossings<F>(
        &self,
        mut g: F,
        a: Instant,
        b: Instant,
        target_deg: f64,
        cancel: Option<&Cancellation>,
    ) -> Result<Vec<Instant>, CoreError>
    where
        F: FnMut(Instant) -> f64,
    {
        if a >= b {
            return Err(CoreError::InvalidInput {
                reason: format!("root finder interval [{a}, {b}] is empty or reversed"),
            });
        }

        let step = Duration::hours(self.step_hours);
        let mut crossings = Vec::new();

        let mut t_cur = a;
        let mut r_cur = signed_residual(g(t_cur), target_deg);
        while t_cur < b {
            if let Some(c) = cancel {
                if c.is_cancelled() {
                    return Err(CoreError::Cancelled);
                }
            }

            let t_next = std::cmp::min(t_cur + step, b);
            let r_next = signed_residual(g(t_next), target_deg);

            if r_cur < 0.0 && r_next >= 0.0 {
                let root = self.bisect(&mut g, t_cur, t_next, target_deg)?;
                crossings.push(root);
            }

            t_cur = t_next;
            r_cur = r_next;
        }

        crossings.sort();
        crossings.dedup_by(|later, earlier| *later - *earlier < self.dedup_window);
        Ok(crossings)
    }

    fn bisect<F>(
        &self,
        g: &mut F,
        mut lo: Instant,
        mut hi: Instant,
        target_deg: f64,
    ) -> Result<Instant, CoreError>
    where
        F: FnMut(Instant) -> f64,
    {
        let mut r_lo = signed_residual(g(lo), target_deg);
        for _ in 0..self.max_iterations {
            if hi - lo <= self.time_tolerance {
                break;
            }
            let mid = lo + (hi - lo) / 2;
            let r_mid = signed_residual(g(mid), target_deg);
            if r_mid.abs() <= self.degree_tolerance {
                return Ok(mid);
            }
            if (r_lo < 0.0) == (r_mid < 0.0) {
                lo = mid;
                r_lo = r_mid;
            } else {
                hi = mid;
            }
        }
        if hi - lo <= self.time_tolerance * 2 {
            Ok(lo + (hi - lo) / 2)
        } else {
            Err(CoreError::RootFindFailed {
                near: crate::attribution::format_jst_iso(lo),
            })
        }
    }
}
