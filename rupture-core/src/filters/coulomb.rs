//! Net stress-compatibility filter
//!
//! Aggregates a black-box stiffness scalar over every participating section
//! and tests it against an acceptable range. The numerics live entirely in
//! the collaborator.

use std::sync::Arc;

use crate::error::{Result, RuptureError};
use crate::filters::types::{FilterResult, ValueRange};
use crate::filters::PlausibilityFilter;
use crate::graph::{Jump, Section};
use crate::rupture::ClusterRupture;

/// Black-box stress interaction collaborator
pub trait StiffnessCalc: Send + Sync {
    fn name(&self) -> &str;

    /// Net compatibility scalar for a candidate section set
    fn aggregate(&self, sections: &[Arc<Section>]) -> f64;
}

/// Rejects ruptures whose net stiffness aggregate falls outside the
/// acceptable range
pub struct NetRuptureCoulombFilter {
    calc: Arc<dyn StiffnessCalc>,
    range: ValueRange,
}

impl NetRuptureCoulombFilter {
    pub fn new(calc: Arc<dyn StiffnessCalc>, range: ValueRange) -> Self {
        Self { calc, range }
    }

    fn value_for(&self, sections: &[Arc<Section>]) -> Result<f64> {
        // a lone section has no interactions
        if sections.len() == 1 {
            return Ok(0.0);
        }
        let value = self.calc.aggregate(sections);
        if !value.is_finite() {
            return Err(RuptureError::InvalidScalar {
                calc: self.calc.name().to_string(),
                value,
            });
        }
        Ok(value)
    }

    fn check(&self, value: f64) -> FilterResult {
        if self.range.contains(value) {
            FilterResult::Pass
        } else {
            FilterResult::FailHardStop
        }
    }
}

impl PlausibilityFilter for NetRuptureCoulombFilter {
    fn name(&self) -> &str {
        "net rupture coulomb"
    }

    fn short_name(&self) -> &str {
        "NetCoulomb"
    }

    fn apply(&self, rupture: &ClusterRupture, _verbose: bool) -> Result<FilterResult> {
        let sections: Vec<Arc<Section>> = rupture
            .all_clusters()
            .iter()
            .flat_map(|c| c.sections.iter().cloned())
            .collect();
        Ok(self.check(self.value_for(&sections)?))
    }

    fn test_jump(&self, rupture: &ClusterRupture, jump: &Jump, _verbose: bool) -> Result<FilterResult> {
        // incremental: existing sections plus the proposed cluster
        let mut sections: Vec<Arc<Section>> = rupture
            .all_clusters()
            .iter()
            .flat_map(|c| c.sections.iter().cloned())
            .collect();
        sections.extend(jump.to_cluster.sections.iter().cloned());
        Ok(self.check(self.value_for(&sections)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{arc_cluster, jump_between};
    use rustc_hash::FxHashMap;

    /// Sums fixed per-section contributions
    struct TableCalc {
        values: FxHashMap<u32, f64>,
    }

    impl TableCalc {
        fn new(pairs: &[(u32, f64)]) -> Arc<Self> {
            Arc::new(Self {
                values: pairs.iter().copied().collect(),
            })
        }
    }

    impl StiffnessCalc for TableCalc {
        fn name(&self) -> &str {
            "table"
        }
        fn aggregate(&self, sections: &[Arc<Section>]) -> f64 {
            sections.iter().map(|s| self.values[&s.id]).sum()
        }
    }

    fn rupture() -> ClusterRupture {
        let a = arc_cluster(1, &[1, 2]);
        let b = arc_cluster(2, &[3]);
        let rup = ClusterRupture::new(a.clone());
        let (rup, _) = rup.take(jump_between(&a, 2, &b, 3, 1.0));
        rup
    }

    #[test]
    fn test_net_value_in_range_passes() {
        let calc = TableCalc::new(&[(1, 1.0), (2, 2.0), (3, -0.5)]);
        let filter = NetRuptureCoulombFilter::new(calc, ValueRange::at_least(0.0));
        assert_eq!(filter.apply(&rupture(), false).unwrap(), FilterResult::Pass);
    }

    #[test]
    fn test_net_value_below_range_fails_hard() {
        let calc = TableCalc::new(&[(1, 1.0), (2, 2.0), (3, -5.0)]);
        let filter = NetRuptureCoulombFilter::new(calc, ValueRange::at_least(0.0));
        assert_eq!(
            filter.apply(&rupture(), false).unwrap(),
            FilterResult::FailHardStop
        );
    }

    #[test]
    fn test_jump_matches_materialized() {
        let calc = TableCalc::new(&[(1, 1.0), (2, 2.0), (3, -5.0)]);
        let filter = NetRuptureCoulombFilter::new(calc, ValueRange::at_least(0.0));
        let a = arc_cluster(1, &[1, 2]);
        let b = arc_cluster(2, &[3]);
        let base = ClusterRupture::new(a.clone());
        let jump = jump_between(&a, 2, &b, 3, 1.0);
        let incremental = filter.test_jump(&base, &jump, false).unwrap();
        let (candidate, _) = base.take(jump);
        assert_eq!(incremental, filter.apply(&candidate, false).unwrap());
    }

    #[test]
    fn test_non_finite_aggregate_aborts() {
        let calc = TableCalc::new(&[(1, f64::NAN), (2, 0.0), (3, 0.0)]);
        let filter = NetRuptureCoulombFilter::new(calc, ValueRange::at_least(0.0));
        let err = filter.apply(&rupture(), false).unwrap_err();
        assert!(matches!(err, RuptureError::InvalidScalar { .. }));
    }

    #[test]
    fn test_single_section_is_neutral() {
        let calc = TableCalc::new(&[(1, -100.0)]);
        let filter = NetRuptureCoulombFilter::new(calc, ValueRange::at_least(0.0));
        let rup = ClusterRupture::new(arc_cluster(1, &[1]));
        assert_eq!(filter.apply(&rup, false).unwrap(), FilterResult::Pass);
    }
}
