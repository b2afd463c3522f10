//! Nucleation cluster evaluators
//!
//! An evaluator judges whether a rupture could plausibly have started at a
//! given nucleation cluster: either by walking outward and scoring each
//! growth step, or by re-rooting the rupture at the nucleation cluster and
//! scoring it as a whole.

use std::sync::Arc;

use crate::error::{Result, RuptureError};
use crate::filters::probability::{validate_probability, RuptureProbabilityCalc};
use crate::filters::types::{FilterResult, ValueRange};
use crate::graph::{Cluster, Jump, Section};
use crate::rupture::{ClusterRupture, RuptureTreeNavigator};

use super::navigator::{ClusterPathNavigator, PathAddition, PathNavigator, SectionPathNavigator};

/// Judges a single nucleation cluster of a rupture
pub trait NucleationClusterEvaluator: Send + Sync {
    fn name(&self) -> &str;

    /// Result used when not enough nucleation clusters pass
    fn failure_type(&self) -> FilterResult;

    fn test_nucleation(
        &self,
        rupture: &ClusterRupture,
        nucleation: &Arc<Cluster>,
        verbose: bool,
    ) -> Result<FilterResult>;
}

/// Black-box scalar scored for each outward growth step
pub trait PathScalarCalc: Send + Sync {
    fn name(&self) -> &str;

    /// Value of extending the current section set by the given addition
    fn addition_value(&self, current: &[Arc<Section>], addition: &PathAddition) -> f64;
}

/// Granularity of the outward walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathGranularity {
    Cluster,
    Section,
}

/// Walks outward from the nucleation cluster, testing a scalar for every
/// addition against an acceptable range
pub struct ScalarPathEvaluator {
    calc: Arc<dyn PathScalarCalc>,
    range: ValueRange,
    failure_type: FilterResult,
    granularity: PathGranularity,
}

impl ScalarPathEvaluator {
    pub fn new(
        calc: Arc<dyn PathScalarCalc>,
        range: ValueRange,
        failure_type: FilterResult,
        granularity: PathGranularity,
    ) -> Self {
        Self {
            calc,
            range,
            failure_type,
            granularity,
        }
    }
}

impl NucleationClusterEvaluator for ScalarPathEvaluator {
    fn name(&self) -> &str {
        "scalar path"
    }

    fn failure_type(&self) -> FilterResult {
        self.failure_type
    }

    fn test_nucleation(
        &self,
        rupture: &ClusterRupture,
        nucleation: &Arc<Cluster>,
        verbose: bool,
    ) -> Result<FilterResult> {
        let mut nav: Box<dyn PathNavigator> = match self.granularity {
            PathGranularity::Cluster => Box::new(ClusterPathNavigator::new(rupture, nucleation)),
            PathGranularity::Section => Box::new(SectionPathNavigator::new(rupture, nucleation)),
        };
        let mut result = FilterResult::Pass;
        loop {
            let current = nav.current_sections().to_vec();
            let additions = nav.next_additions();
            if additions.is_empty() {
                break;
            }
            for addition in &additions {
                let value = self.calc.addition_value(&current, addition);
                if !value.is_finite() {
                    return Err(RuptureError::InvalidScalar {
                        calc: self.calc.name().to_string(),
                        value,
                    });
                }
                if !self.range.contains(value) {
                    result = result.and(self.failure_type);
                    if !result.can_continue() && !verbose {
                        return Ok(result);
                    }
                }
            }
        }
        // the walk must reach every section of the rupture
        assert_eq!(
            nav.current_sections().len(),
            rupture.total_sections(),
            "path walk did not cover the rupture"
        );
        Ok(result)
    }
}

/// Re-roots the rupture at the nucleation cluster and applies cumulative
/// probability models to the re-rooted rupture
pub struct CumulativeProbPathEvaluator {
    calcs: Vec<Box<dyn RuptureProbabilityCalc>>,
    min_probability: f64,
    failure_type: FilterResult,
}

impl CumulativeProbPathEvaluator {
    /// `min_probability` must be in (0, 1]
    pub fn new(
        calcs: Vec<Box<dyn RuptureProbabilityCalc>>,
        min_probability: f64,
        failure_type: FilterResult,
    ) -> Result<Self> {
        if !min_probability.is_finite() || min_probability <= 0.0 || min_probability > 1.0 {
            return Err(RuptureError::InvalidThreshold {
                what: "minimum nucleation probability",
                value: min_probability,
            });
        }
        assert!(!calcs.is_empty(), "at least one probability calculator required");
        Ok(Self {
            calcs,
            min_probability,
            failure_type,
        })
    }
}

impl NucleationClusterEvaluator for CumulativeProbPathEvaluator {
    fn name(&self) -> &str {
        "cumulative probability path"
    }

    fn failure_type(&self) -> FilterResult {
        self.failure_type
    }

    fn test_nucleation(
        &self,
        rupture: &ClusterRupture,
        nucleation: &Arc<Cluster>,
        _verbose: bool,
    ) -> Result<FilterResult> {
        let rooted = nucleation_rupture(rupture, nucleation);
        let mut prob = 1.0;
        for calc in &self.calcs {
            let p = calc.rupture_probability(&rooted)?;
            prob *= validate_probability(calc.name(), p)?;
        }
        if prob < self.min_probability {
            Ok(self.failure_type)
        } else {
            Ok(FilterResult::Pass)
        }
    }
}

/// Rebuild the rupture as if it nucleated at the given cluster
///
/// Reuses the rupture when it already starts there and a plain reversal
/// when a single strand ends there; otherwise rebuilds outward through the
/// tree, reversing the ancestor chain and re-attaching the forward branches
/// it passes.
pub fn nucleation_rupture(rupture: &ClusterRupture, nucleation: &Arc<Cluster>) -> ClusterRupture {
    if Arc::ptr_eq(&rupture.clusters[0], nucleation) {
        return rupture.clone();
    }
    if rupture.is_single_strand() && Arc::ptr_eq(rupture.clusters.last().unwrap(), nucleation) {
        return rupture.reversed();
    }
    let nav = rupture.navigator();
    let mut rooted = ClusterRupture::new(nucleation.clone());
    for descendant in nav.descendant_clusters(nucleation) {
        rooted = add_clusters_forward(rooted, &nav, &descendant);
    }
    let mut current = nucleation.clone();
    let mut predecessor = nav.predecessor_cluster(&current);
    while let Some(pred) = predecessor {
        let orig = nav.jump_between(&pred, &current);
        // walk the ancestor in reverse: enter it at its original exit point
        let reversed = Arc::new(pred.reversed());
        let jump = Jump::new(
            orig.to_cluster.clone(),
            orig.to_section.clone(),
            reversed,
            orig.from_section.clone(),
            orig.distance,
        );
        let (next, _) = rooted.take(jump);
        rooted = next;
        for descendant in nav.descendant_clusters(&pred) {
            if !Arc::ptr_eq(&descendant, &current) {
                rooted = add_clusters_forward(rooted, &nav, &descendant);
            }
        }
        current = pred;
        predecessor = nav.predecessor_cluster(&current);
    }
    assert_eq!(
        rooted.total_sections(),
        rupture.total_sections(),
        "re-rooted rupture lost sections"
    );
    rooted
}

fn add_clusters_forward(
    rupture: ClusterRupture,
    nav: &RuptureTreeNavigator,
    cluster: &Arc<Cluster>,
) -> ClusterRupture {
    let parent = nav
        .predecessor_cluster(cluster)
        .expect("forward cluster must have a predecessor");
    let jump = nav.jump_between(&parent, cluster);
    let (mut rupture, _) = rupture.take(jump);
    for descendant in nav.descendant_clusters(cluster) {
        rupture = add_clusters_forward(rupture, nav, &descendant);
    }
    rupture
}
