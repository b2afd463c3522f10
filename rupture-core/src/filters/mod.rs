//! Plausibility filter protocol and concrete filters
//!
//! - Types: filter outcomes and scalar ranges
//! - Azimuth: direction-change filters
//! - Basic: section-count and cluster-count filters
//! - Probability: cumulative probability filters
//! - Coulomb: net stress-compatibility filter
//! - Path: nucleation-point path filters

pub mod azimuth;
pub mod basic;
pub mod coulomb;
pub mod path;
pub mod probability;
pub mod types;

use crate::error::Result;
use crate::graph::Jump;
use crate::rupture::ClusterRupture;

pub use azimuth::{azimuth_difference, CumulativeAzimuthChangeFilter, JumpAzimuthChangeFilter};
pub use basic::{MaxClustersFilter, MinSectsPerParentFilter};
pub use coulomb::{NetRuptureCoulombFilter, StiffnessCalc};
pub use path::{
    nucleation_rupture, ClusterPathNavigator, CumulativeProbPathEvaluator,
    NucleationClusterEvaluator, PathAddition, PathGranularity, PathNavigator,
    PathPlausibilityFilter, PathScalarCalc, ScalarPathEvaluator, SectionPathNavigator,
};
pub use probability::{
    passing_ratio_to_prob, CumulativeProbabilityFilter, DistanceFalloffJumpProb,
    JumpProbabilityCalc, RuptureProbabilityCalc,
};
pub use types::{FilterResult, ValueRange};

/// A plausibility test applied to every candidate rupture
///
/// `verbose` requests a complete evaluation for diagnosis: implementations
/// must not short-circuit internally, and the engine runs the whole chain.
/// The final decision must be identical either way. Errors are
/// configuration or collaborator failures and abort the search.
pub trait PlausibilityFilter: Send + Sync {
    fn name(&self) -> &str;
    fn short_name(&self) -> &str;

    fn apply(&self, rupture: &ClusterRupture, verbose: bool) -> Result<FilterResult>;

    /// Test a proposed extension without the caller materializing it; the
    /// default builds the hypothetical rupture and applies the filter
    fn test_jump(&self, rupture: &ClusterRupture, jump: &Jump, verbose: bool) -> Result<FilterResult> {
        let (candidate, _) = rupture.take(jump.clone());
        self.apply(&candidate, verbose)
    }
}

/// Evaluate a filter chain in order, AND-ing results and short-circuiting
/// once the running result cannot continue (unless verbose)
pub fn evaluate_filters(
    filters: &[Box<dyn PlausibilityFilter>],
    rupture: &ClusterRupture,
    verbose: bool,
) -> Result<FilterResult> {
    let mut result = FilterResult::Pass;
    for filter in filters {
        let r = filter.apply(rupture, verbose)?;
        result = result.and(r);
        if !result.can_continue() && !verbose {
            break;
        }
    }
    Ok(result)
}
