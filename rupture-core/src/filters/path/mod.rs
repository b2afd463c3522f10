//! Nucleation-point path filter
//!
//! Tests every cluster of a rupture as a possible nucleation point and
//! requires a configurable fraction of them to pass. Failed nucleation
//! clusters are remembered per lineage so extensions never re-test them.

pub mod evaluator;
pub mod navigator;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, RuptureError};
use crate::filters::types::FilterResult;
use crate::filters::PlausibilityFilter;
use crate::rupture::ClusterRupture;

pub use evaluator::{
    nucleation_rupture, CumulativeProbPathEvaluator, NucleationClusterEvaluator, PathGranularity,
    PathScalarCalc, ScalarPathEvaluator,
};
pub use navigator::{ClusterPathNavigator, PathAddition, PathNavigator, SectionPathNavigator};

static NEXT_SCRATCH_KEY: AtomicU64 = AtomicU64::new(1);

pub struct PathPlausibilityFilter {
    evaluators: Vec<Box<dyn NucleationClusterEvaluator>>,
    fract_pass_threshold: f32,
    logical_or: bool,
    /// Key into the per-rupture scratch table, unique per filter instance
    scratch_key: u64,
}

impl PathPlausibilityFilter {
    /// `fract_pass_threshold` is the fraction of nucleation clusters that
    /// must pass, in [0, 1]; zero means any single pass suffices. Multiple
    /// evaluators combine with AND, or with OR when `logical_or` is set.
    pub fn new(
        evaluators: Vec<Box<dyn NucleationClusterEvaluator>>,
        fract_pass_threshold: f32,
        logical_or: bool,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&fract_pass_threshold) || fract_pass_threshold.is_nan() {
            return Err(RuptureError::InvalidThreshold {
                what: "fractional pass",
                value: fract_pass_threshold as f64,
            });
        }
        assert!(!evaluators.is_empty(), "at least one evaluator required");
        Ok(Self {
            evaluators,
            fract_pass_threshold,
            logical_or,
            scratch_key: NEXT_SCRATCH_KEY.fetch_add(1, Ordering::Relaxed),
        })
    }

    pub fn single(evaluator: Box<dyn NucleationClusterEvaluator>) -> Self {
        Self::new(vec![evaluator], 0.0, false).unwrap()
    }

    fn failure_type(&self) -> FilterResult {
        self.evaluators
            .iter()
            .map(|e| e.failure_type())
            .fold(FilterResult::Pass, FilterResult::and)
    }

    fn num_needed(&self, num_paths: usize) -> usize {
        let needed = (self.fract_pass_threshold as f64 * num_paths as f64).ceil() as usize;
        needed.max(1)
    }
}

impl PlausibilityFilter for PathPlausibilityFilter {
    fn name(&self) -> &str {
        "nucleation path"
    }

    fn short_name(&self) -> &str {
        "Path"
    }

    fn apply(&self, rupture: &ClusterRupture, verbose: bool) -> Result<FilterResult> {
        if rupture.total_jumps() == 0 {
            return Ok(FilterResult::Pass);
        }
        let clusters = rupture.all_clusters();
        let num_needed = self.num_needed(clusters.len());
        let mut num_passes = 0usize;
        for nucleation in clusters {
            // failed for a sub-rupture of this lineage: can never recover
            if rupture.filter_scratch_contains(self.scratch_key, nucleation) {
                continue;
            }
            let mut combined: Option<FilterResult> = None;
            for evaluator in &self.evaluators {
                let r = evaluator.test_nucleation(rupture, nucleation, verbose)?;
                combined = Some(match combined {
                    None => r,
                    Some(acc) if self.logical_or => acc.or(r),
                    Some(acc) => acc.and(r),
                });
                if !self.logical_or && !combined.unwrap().can_continue() && !verbose {
                    break;
                }
            }
            if combined.unwrap().is_pass() {
                num_passes += 1;
                if !verbose && num_passes >= num_needed {
                    return Ok(FilterResult::Pass);
                }
            } else {
                rupture.filter_scratch_insert(self.scratch_key, nucleation);
            }
        }
        if num_passes >= num_needed {
            Ok(FilterResult::Pass)
        } else {
            Ok(self.failure_type())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use crate::graph::Cluster;
    use crate::testutil::{arc_cluster, jump_between};

    /// Passes only when the nucleation cluster contains the magic section
    struct MagicSectionEvaluator {
        magic: u32,
        failure_type: FilterResult,
        calls: AtomicUsize,
    }

    impl MagicSectionEvaluator {
        fn new(magic: u32, failure_type: FilterResult) -> Self {
            Self {
                magic,
                failure_type,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl NucleationClusterEvaluator for MagicSectionEvaluator {
        fn name(&self) -> &str {
            "magic section"
        }
        fn failure_type(&self) -> FilterResult {
            self.failure_type
        }
        fn test_nucleation(
            &self,
            _rupture: &ClusterRupture,
            nucleation: &Arc<Cluster>,
            _verbose: bool,
        ) -> Result<FilterResult> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if nucleation.contains(self.magic) {
                Ok(FilterResult::Pass)
            } else {
                Ok(self.failure_type)
            }
        }
    }

    fn three_cluster_rupture() -> ClusterRupture {
        let a = arc_cluster(1, &[1]);
        let b = arc_cluster(2, &[2]);
        let c = arc_cluster(3, &[3]);
        let rup = ClusterRupture::new(a.clone());
        let (rup, _) = rup.take(jump_between(&a, 1, &b, 2, 1.0));
        let (rup, _) = rup.take(jump_between(&b, 2, &c, 3, 1.0));
        rup
    }

    #[test]
    fn test_no_jumps_is_trivial_pass() {
        let rup = ClusterRupture::new(arc_cluster(1, &[1, 2]));
        let filter = PathPlausibilityFilter::single(Box::new(MagicSectionEvaluator::new(
            99,
            FilterResult::FailHardStop,
        )));
        assert_eq!(filter.apply(&rup, false).unwrap(), FilterResult::Pass);
    }

    #[test]
    fn test_any_single_pass_suffices_by_default() {
        let rup = three_cluster_rupture();
        let filter = PathPlausibilityFilter::single(Box::new(MagicSectionEvaluator::new(
            2,
            FilterResult::FailHardStop,
        )));
        assert_eq!(filter.apply(&rup, false).unwrap(), FilterResult::Pass);
    }

    #[test]
    fn test_fractional_threshold_requires_enough_passes() {
        let rup = three_cluster_rupture();
        // only 1 of 3 nucleation clusters passes; requiring all 3 fails
        let filter = PathPlausibilityFilter::new(
            vec![Box::new(MagicSectionEvaluator::new(
                2,
                FilterResult::FailContinuable,
            ))],
            1.0,
            false,
        )
        .unwrap();
        assert_eq!(
            filter.apply(&rup, false).unwrap(),
            FilterResult::FailContinuable
        );
    }

    #[test]
    fn test_num_needed_rounds_up() {
        let filter = PathPlausibilityFilter::new(
            vec![Box::new(MagicSectionEvaluator::new(
                2,
                FilterResult::FailHardStop,
            ))],
            0.5,
            false,
        )
        .unwrap();
        assert_eq!(filter.num_needed(3), 2);
        assert_eq!(filter.num_needed(4), 2);
        assert_eq!(filter.num_needed(1), 1);
        let any = PathPlausibilityFilter::single(Box::new(MagicSectionEvaluator::new(
            2,
            FilterResult::FailHardStop,
        )));
        assert_eq!(any.num_needed(10), 1);
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        let err = PathPlausibilityFilter::new(
            vec![Box::new(MagicSectionEvaluator::new(
                2,
                FilterResult::FailHardStop,
            ))],
            1.5,
            false,
        )
        .err()
        .unwrap();
        assert!(matches!(err, RuptureError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_failed_nucleation_clusters_memoized() {
        // evaluator that never passes, so every tested cluster is recorded
        let a = arc_cluster(1, &[1]);
        let b = arc_cluster(2, &[2]);
        let c = arc_cluster(3, &[3]);
        let rup = ClusterRupture::new(a.clone());
        let (rup, _) = rup.take(jump_between(&a, 1, &b, 2, 1.0));

        let evaluator = Arc::new(MagicSectionEvaluator::new(99, FilterResult::FailContinuable));
        struct Shared(Arc<MagicSectionEvaluator>);
        impl NucleationClusterEvaluator for Shared {
            fn name(&self) -> &str {
                self.0.name()
            }
            fn failure_type(&self) -> FilterResult {
                self.0.failure_type()
            }
            fn test_nucleation(
                &self,
                rupture: &ClusterRupture,
                nucleation: &Arc<Cluster>,
                verbose: bool,
            ) -> Result<FilterResult> {
                self.0.test_nucleation(rupture, nucleation, verbose)
            }
        }
        let filter = PathPlausibilityFilter::single(Box::new(Shared(evaluator.clone())));

        assert_eq!(
            filter.apply(&rup, false).unwrap(),
            FilterResult::FailContinuable
        );
        assert_eq!(evaluator.calls.load(Ordering::Relaxed), 2);

        // the extension inherits the failures: only the new cluster is tested
        let (ext, _) = rup.take(jump_between(&b, 2, &c, 3, 1.0));
        assert_eq!(
            filter.apply(&ext, false).unwrap(),
            FilterResult::FailContinuable
        );
        assert_eq!(evaluator.calls.load(Ordering::Relaxed), 3);
    }
}
