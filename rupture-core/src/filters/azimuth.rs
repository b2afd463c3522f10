//! Azimuth change filters
//!
//! Directional plausibility: ruptures that turn too sharply at a jump, or
//! accumulate too much total direction change, are dead branches.

use std::sync::Arc;

use crate::error::Result;
use crate::filters::types::FilterResult;
use crate::filters::PlausibilityFilter;
use crate::graph::{Jump, SectionDistanceAzimuthCalc};
use crate::rupture::{ClusterRupture, RuptureTreeNavigator};

/// Signed smallest rotation from one azimuth to another, wrapped into
/// [-180, 180]
///
/// The wrap is strict, so a half-turn keeps its sign: turning from 180 to 0
/// is -180, from 0 to 180 is +180.
pub fn azimuth_difference(from: f64, to: f64) -> f64 {
    let mut d = to - from;
    while d > 180.0 {
        d -= 360.0;
    }
    while d < -180.0 {
        d += 360.0;
    }
    d
}

/// Azimuth change across one jump: approach direction (predecessor into the
/// jump source) vs departure direction (jump target into its successor)
///
/// `None` when either side has no neighbor to define a direction.
fn jump_azimuth_change(
    nav: &RuptureTreeNavigator,
    calc: &dyn SectionDistanceAzimuthCalc,
    jump: &Jump,
) -> Option<f64> {
    let before = nav.predecessor_section(jump.from_section.id)?;
    let next = jump.to_cluster.sections.get(1)?;
    let az_in = calc.azimuth(&before, &jump.from_section);
    let az_out = calc.azimuth(&jump.to_section, next);
    Some(azimuth_difference(az_in, az_out))
}

/// Rejects any single jump whose azimuth change exceeds the threshold
pub struct JumpAzimuthChangeFilter {
    calc: Arc<dyn SectionDistanceAzimuthCalc>,
    threshold: f64,
}

impl JumpAzimuthChangeFilter {
    pub fn new(calc: Arc<dyn SectionDistanceAzimuthCalc>, threshold: f64) -> Self {
        Self { calc, threshold }
    }
}

impl PlausibilityFilter for JumpAzimuthChangeFilter {
    fn name(&self) -> &str {
        "jump azimuth change"
    }

    fn short_name(&self) -> &str {
        "JumpAz"
    }

    fn apply(&self, rupture: &ClusterRupture, verbose: bool) -> Result<FilterResult> {
        if rupture.total_jumps() == 0 {
            return Ok(FilterResult::Pass);
        }
        let nav = rupture.navigator();
        let mut result = FilterResult::Pass;
        for jump in rupture.all_jumps() {
            if let Some(change) = jump_azimuth_change(&nav, self.calc.as_ref(), jump) {
                if change.abs() > self.threshold {
                    result = FilterResult::FailHardStop;
                    if !verbose {
                        break;
                    }
                }
            }
        }
        Ok(result)
    }
}

/// Rejects ruptures whose summed absolute azimuth changes exceed the
/// threshold
///
/// The sum only grows, so a failure is always a hard stop.
pub struct CumulativeAzimuthChangeFilter {
    calc: Arc<dyn SectionDistanceAzimuthCalc>,
    threshold: f64,
}

impl CumulativeAzimuthChangeFilter {
    pub fn new(calc: Arc<dyn SectionDistanceAzimuthCalc>, threshold: f64) -> Self {
        Self { calc, threshold }
    }

    fn cumulative(&self, rupture: &ClusterRupture) -> f64 {
        let nav = rupture.navigator();
        rupture
            .all_jumps()
            .iter()
            .filter_map(|j| jump_azimuth_change(&nav, self.calc.as_ref(), j))
            .map(f64::abs)
            .sum()
    }
}

impl PlausibilityFilter for CumulativeAzimuthChangeFilter {
    fn name(&self) -> &str {
        "cumulative azimuth change"
    }

    fn short_name(&self) -> &str {
        "CumAz"
    }

    fn apply(&self, rupture: &ClusterRupture, _verbose: bool) -> Result<FilterResult> {
        if self.cumulative(rupture) > self.threshold {
            Ok(FilterResult::FailHardStop)
        } else {
            Ok(FilterResult::Pass)
        }
    }

    fn test_jump(&self, rupture: &ClusterRupture, jump: &Jump, _verbose: bool) -> Result<FilterResult> {
        // incremental: existing sum plus the proposed jump's contribution
        let nav = rupture.navigator();
        let added = jump_azimuth_change(&nav, self.calc.as_ref(), jump)
            .map(f64::abs)
            .unwrap_or(0.0);
        if self.cumulative(rupture) + added > self.threshold {
            Ok(FilterResult::FailHardStop)
        } else {
            Ok(FilterResult::Pass)
        }
    }
}
