//! Cumulative probability filters
//!
//! Probability calculators score a rupture conditioned on it nucleating at
//! its first cluster; the filter multiplies them and rejects ruptures below
//! a minimum. Probabilities outside [0, 1] are configuration errors, never
//! clamped.

use crate::error::{Result, RuptureError};
use crate::filters::types::FilterResult;
use crate::filters::PlausibilityFilter;
use crate::graph::Jump;
use crate::rupture::ClusterRupture;

/// Probability model over a whole rupture
pub trait RuptureProbabilityCalc: Send + Sync {
    fn name(&self) -> &str;
    fn rupture_probability(&self, rupture: &ClusterRupture) -> Result<f64>;
}

/// Probability model over a single jump; the rupture probability is the
/// product over all jumps
pub trait JumpProbabilityCalc: Send + Sync {
    fn name(&self) -> &str;
    fn jump_probability(&self, rupture: &ClusterRupture, jump: &Jump) -> Result<f64>;
}

impl<T: JumpProbabilityCalc> RuptureProbabilityCalc for T {
    fn name(&self) -> &str {
        JumpProbabilityCalc::name(self)
    }

    fn rupture_probability(&self, rupture: &ClusterRupture) -> Result<f64> {
        let mut prob = 1.0;
        for jump in rupture.all_jumps() {
            let p = self.jump_probability(rupture, jump)?;
            prob *= validate_probability(JumpProbabilityCalc::name(self), p)?;
        }
        Ok(prob)
    }
}

/// Convert an observed passing ratio into a probability
pub fn passing_ratio_to_prob(ratio: f64) -> f64 {
    ratio / (ratio + 1.0)
}

pub(crate) fn validate_probability(calc: &str, p: f64) -> Result<f64> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(RuptureError::InvalidProbability {
            calc: calc.to_string(),
            value: p,
        });
    }
    Ok(p)
}

/// Distance-dependent jump probability from an empirical passing ratio that
/// falls off linearly with jump distance
///
/// Jumps at or below `min_dist` are free.
pub struct DistanceFalloffJumpProb {
    min_dist: f64,
}

/// Empirical passing ratio intercept/slope per km
const PASSING_RATIO_INTERCEPT: f64 = 1.89;
const PASSING_RATIO_SLOPE: f64 = 0.31;

impl DistanceFalloffJumpProb {
    pub fn new(min_dist: f64) -> Self {
        Self { min_dist }
    }

    pub fn passing_ratio(distance: f64) -> f64 {
        (PASSING_RATIO_INTERCEPT - PASSING_RATIO_SLOPE * distance).max(0.0)
    }
}

impl Default for DistanceFalloffJumpProb {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl JumpProbabilityCalc for DistanceFalloffJumpProb {
    fn name(&self) -> &str {
        "distance falloff jump probability"
    }

    fn jump_probability(&self, _rupture: &ClusterRupture, jump: &Jump) -> Result<f64> {
        if jump.distance <= self.min_dist {
            return Ok(1.0);
        }
        Ok(passing_ratio_to_prob(Self::passing_ratio(jump.distance)))
    }
}

/// Rejects ruptures whose product of calculator probabilities falls below a
/// minimum
pub struct CumulativeProbabilityFilter {
    min_probability: f64,
    calcs: Vec<Box<dyn RuptureProbabilityCalc>>,
}

impl CumulativeProbabilityFilter {
    /// `min_probability` must be in (0, 1]
    pub fn new(
        min_probability: f64,
        calcs: Vec<Box<dyn RuptureProbabilityCalc>>,
    ) -> Result<Self> {
        if !min_probability.is_finite() || min_probability <= 0.0 || min_probability > 1.0 {
            return Err(RuptureError::InvalidThreshold {
                what: "minimum probability",
                value: min_probability,
            });
        }
        assert!(!calcs.is_empty(), "at least one probability calculator required");
        Ok(Self {
            min_probability,
            calcs,
        })
    }

    pub fn probability(&self, rupture: &ClusterRupture) -> Result<f64> {
        let mut prob = 1.0;
        for calc in &self.calcs {
            let p = calc.rupture_probability(rupture)?;
            prob *= validate_probability(calc.name(), p)?;
        }
        Ok(prob)
    }
}

impl PlausibilityFilter for CumulativeProbabilityFilter {
    fn name(&self) -> &str {
        "cumulative probability"
    }

    fn short_name(&self) -> &str {
        "CumProb"
    }

    fn apply(&self, rupture: &ClusterRupture, _verbose: bool) -> Result<FilterResult> {
        if self.probability(rupture)? < self.min_probability {
            Ok(FilterResult::FailHardStop)
        } else {
            Ok(FilterResult::Pass)
        }
    }
}
