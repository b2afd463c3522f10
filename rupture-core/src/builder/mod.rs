//! Recursive rupture search engine
//!
//! Grows ruptures outward from every seed cluster, testing each candidate
//! against the filter chain, deduplicating by fingerprint, and merging
//! per-seed results single-threaded at the end. Seeds run in parallel on a
//! dedicated pool; the outermost expansion of each seed additionally fans
//! out per jump.

pub mod debug;
pub mod progress;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::{Result, RuptureError};
use crate::filters::{evaluate_filters, PlausibilityFilter};
use crate::graph::{Cluster, FaultNetwork, Jump};
use crate::rupture::{ClusterRupture, RuptureFingerprint, StrandPath};
use crate::strategy::RuptureGrowingStrategy;

pub use debug::{
    ParentsDebugCriteria, ResultDebugCriteria, RupDebugCriteria, SectsDebugCriteria,
    StartEndDebugCriteria,
};
pub use progress::{BuildProgress, BuildStats, ProgressListener, ProgressTracker};

/// Debug interception: matched candidates are re-evaluated verbosely and
/// can stop the whole search cooperatively
pub struct DebugConfig {
    pub criteria: Box<dyn RupDebugCriteria>,
    pub stop_after_match: bool,
}

/// Accepted ruptures plus the build aggregate
pub struct RuptureBuildResult {
    pub ruptures: Vec<ClusterRupture>,
    pub stats: BuildStats,
}

pub struct ClusterRuptureBuilder {
    network: Arc<FaultNetwork>,
    filters: Vec<Box<dyn PlausibilityFilter>>,
    max_splays: usize,
    debug: Option<DebugConfig>,
    listener: Option<Arc<dyn ProgressListener>>,
}

impl ClusterRuptureBuilder {
    pub fn new(
        network: Arc<FaultNetwork>,
        filters: Vec<Box<dyn PlausibilityFilter>>,
        max_splays: usize,
    ) -> Self {
        Self {
            network,
            filters,
            max_splays,
            debug: None,
            listener: None,
        }
    }

    pub fn with_debug(mut self, criteria: Box<dyn RupDebugCriteria>, stop_after_match: bool) -> Self {
        self.debug = Some(DebugConfig {
            criteria,
            stop_after_match,
        });
        self
    }

    pub fn with_progress_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Enumerate every plausible rupture
    ///
    /// The accepted set is identical for any `threads` value; only
    /// discovery order differs. `threads == 1` runs everything on the
    /// caller thread.
    pub fn build(
        &self,
        strategy: &dyn RuptureGrowingStrategy,
        threads: usize,
    ) -> Result<RuptureBuildResult> {
        let clusters = self.network.clusters();
        let tracker = ProgressTracker::new(clusters.len(), self.listener.clone());
        let stop = AtomicBool::new(false);
        let ctx = BuildContext {
            network: &self.network,
            filters: &self.filters,
            strategy,
            max_splays: self.max_splays,
            debug: self.debug.as_ref(),
            tracker: &tracker,
            stop: &stop,
        };

        let seed_outputs: Vec<Vec<ClusterRupture>> = if threads <= 1 {
            let mut outputs = Vec::with_capacity(clusters.len());
            for cluster in clusters {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                outputs.push(build_seed(&ctx, cluster, false)?);
            }
            outputs
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| RuptureError::ThreadPool(e.to_string()))?;
            pool.install(|| {
                clusters
                    .par_iter()
                    .map(|cluster| build_seed(&ctx, cluster, true))
                    .collect::<Result<Vec<_>>>()
            })?
        };

        // mandatory single-threaded merge: re-check every fingerprint
        // against the accepted set before admitting a rupture
        let mut uniques: FxHashSet<RuptureFingerprint> = FxHashSet::default();
        let mut accepted = Vec::new();
        for output in seed_outputs {
            for rupture in output {
                if uniques.insert(rupture.fingerprint().clone()) {
                    accepted.push(rupture);
                }
            }
        }
        let stats = tracker.stats(accepted.len(), stop.load(Ordering::Relaxed));
        Ok(RuptureBuildResult {
            ruptures: accepted,
            stats,
        })
    }
}

struct BuildContext<'a> {
    network: &'a FaultNetwork,
    filters: &'a [Box<dyn PlausibilityFilter>],
    strategy: &'a dyn RuptureGrowingStrategy,
    max_splays: usize,
    debug: Option<&'a DebugConfig>,
    tracker: &'a ProgressTracker,
    stop: &'a AtomicBool,
}

/// One independent search tree rooted at a seed cluster
fn build_seed(
    ctx: &BuildContext<'_>,
    cluster: &Arc<Cluster>,
    fork: bool,
) -> Result<Vec<ClusterRupture>> {
    let mut out = Vec::new();
    'outer: for start in &cluster.sections {
        for permutation in ctx.strategy.seed_permutations(cluster, start) {
            if ctx.stop.load(Ordering::Relaxed) {
                break 'outer;
            }
            let rupture = ClusterRupture::new(permutation);
            let result = evaluate_filters(ctx.filters, &rupture, false)?;
            if let Some(dbg) = ctx.debug {
                if dbg.criteria.matches(&rupture) && dbg.criteria.applies_to(result) {
                    let _ = evaluate_filters(ctx.filters, &rupture, true)?;
                    if dbg.stop_after_match {
                        ctx.stop.store(true, Ordering::Relaxed);
                        break 'outer;
                    }
                }
            }
            if result.is_pass() && ctx.tracker.record_passed(&rupture) {
                out.push(rupture.clone());
            }
            if result.can_continue() && !add_ruptures(ctx, &mut out, &rupture, &StrandPath::new(), fork)? {
                break 'outer;
            }
        }
    }
    ctx.tracker.seed_complete();
    Ok(out)
}

/// Expand one rupture: continue the current strand at its growing end,
/// plus splay jumps from interior sections while budget remains
///
/// Returns false when the search should wind down (debug stop).
fn add_ruptures(
    ctx: &BuildContext<'_>,
    out: &mut Vec<ClusterRupture>,
    current: &ClusterRupture,
    strand_path: &StrandPath,
    fork: bool,
) -> Result<bool> {
    let strand = current.strand(strand_path);
    let end_sect_id = strand.clusters.last().unwrap().end_section().id;
    let first_sect_id = current.clusters[0].start_section().id;

    let mut work: Vec<Jump> = Vec::new();
    for jump in ctx.network.jumps_from(end_sect_id) {
        if !current.contains_section(jump.to_section.id) {
            work.push(jump.clone());
        }
    }
    if strand_path.is_empty() && current.splay_count() < ctx.max_splays {
        for cluster in &current.clusters {
            for sect in &cluster.sections {
                if sect.id == first_sect_id {
                    // never splay off the rupture start
                    continue;
                }
                if sect.id == end_sect_id {
                    // growing end, handled above
                    break;
                }
                for jump in ctx.network.jumps_from(sect.id) {
                    if !current.contains_section(jump.to_section.id) {
                        work.push(jump.clone());
                    }
                }
            }
        }
    }
    if work.is_empty() {
        return Ok(true);
    }

    if fork && work.len() > 1 {
        // outermost fan-out: one task per jump, synchronous below
        let results: Result<Vec<(Vec<ClusterRupture>, bool)>> = work
            .par_iter()
            .map(|jump| {
                let mut local = Vec::new();
                let keep_going =
                    add_jump_permutations(ctx, &mut local, current, strand_path, jump, false)?;
                Ok((local, keep_going))
            })
            .collect();
        let mut keep_going = true;
        for (local, going) in results? {
            out.extend(local);
            keep_going &= going;
        }
        Ok(keep_going)
    } else {
        for jump in &work {
            if !add_jump_permutations(ctx, out, current, strand_path, jump, fork)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Try every permutation of the jump's target cluster
fn add_jump_permutations(
    ctx: &BuildContext<'_>,
    out: &mut Vec<ClusterRupture>,
    current: &ClusterRupture,
    strand_path: &StrandPath,
    jump: &Jump,
    fork: bool,
) -> Result<bool> {
    for permutation in ctx
        .strategy
        .permutations(current, &jump.to_cluster, &jump.to_section)
    {
        if ctx.stop.load(Ordering::Relaxed) {
            return Ok(false);
        }
        // loop guard: the permutation may wrap back onto the rupture
        if permutation
            .sections
            .iter()
            .any(|s| current.contains_section(s.id))
        {
            continue;
        }
        assert_eq!(
            permutation.start_section().id,
            jump.to_section.id,
            "permutation must begin at the jump target"
        );
        let test_jump = Jump::new(
            jump.from_cluster.clone(),
            jump.from_section.clone(),
            permutation.clone(),
            jump.to_section.clone(),
            jump.distance,
        );
        let (candidate, new_strand) = current.take(test_jump.clone());
        let result = evaluate_filters(ctx.filters, &candidate, false)?;
        if let Some(dbg) = ctx.debug {
            if dbg.criteria.matches_jump(current, &test_jump) && dbg.criteria.applies_to(result) {
                let _ = evaluate_filters(ctx.filters, &candidate, true)?;
                if dbg.stop_after_match {
                    ctx.stop.store(true, Ordering::Relaxed);
                    return Ok(false);
                }
            }
        }
        if result.is_pass() && ctx.tracker.record_passed(&candidate) {
            out.push(candidate.clone());
        }
        if result.can_continue() && !add_ruptures(ctx, out, &candidate, &new_strand, fork)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterResult, MaxClustersFilter};
    use crate::strategy::UnilateralGrowingStrategy;
    use crate::testutil::chain_network;

    fn fingerprint_sets(result: &RuptureBuildResult) -> FxHashSet<Vec<u32>> {
        result
            .ruptures
            .iter()
            .map(|r| r.fingerprint().section_ids().to_vec())
            .collect()
    }

    #[test]
    fn test_linear_chain_enumerates_contiguous_paths() {
        let network = chain_network(4);
        let builder = ClusterRuptureBuilder::new(network, vec![], 0);
        let result = builder.build(&UnilateralGrowingStrategy, 1).unwrap();
        assert_eq!(result.ruptures.len(), 10);
        let expected: FxHashSet<Vec<u32>> = [
            vec![0],
            vec![1],
            vec![2],
            vec![3],
            vec![0, 1],
            vec![1, 2],
            vec![2, 3],
            vec![0, 1, 2],
            vec![1, 2, 3],
            vec![0, 1, 2, 3],
        ]
        .into_iter()
        .collect();
        assert_eq!(fingerprint_sets(&result), expected);
        assert_eq!(result.stats.unique_passing, 10);
        assert_eq!(result.stats.accepted, 10);
        assert_eq!(result.stats.largest_sections, 4);
    }

    #[test]
    fn test_thread_count_does_not_change_output() {
        let single = ClusterRuptureBuilder::new(chain_network(4), vec![], 0)
            .build(&UnilateralGrowingStrategy, 1)
            .unwrap();
        let parallel = ClusterRuptureBuilder::new(chain_network(4), vec![], 0)
            .build(&UnilateralGrowingStrategy, 4)
            .unwrap();
        assert_eq!(fingerprint_sets(&single), fingerprint_sets(&parallel));
        assert_eq!(parallel.ruptures.len(), 10);
    }

    #[test]
    fn test_outputs_are_loop_free_single_strands() {
        let result = ClusterRuptureBuilder::new(chain_network(5), vec![], 0)
            .build(&UnilateralGrowingStrategy, 1)
            .unwrap();
        for rupture in &result.ruptures {
            assert!(rupture.is_single_strand());
            assert_eq!(rupture.splay_count(), 0);
            // fingerprint length equals traversal length: no repeats
            assert_eq!(
                rupture.fingerprint().len(),
                rupture.ordered_section_ids().len()
            );
        }
    }

    #[test]
    fn test_hard_stop_prunes_extensions() {
        let filters: Vec<Box<dyn PlausibilityFilter>> = vec![Box::new(MaxClustersFilter::new(1))];
        let result = ClusterRuptureBuilder::new(chain_network(4), filters, 0)
            .build(&UnilateralGrowingStrategy, 1)
            .unwrap();
        // only the four single-cluster ruptures survive, and nothing
        // beyond a hard-stopped candidate was ever explored
        assert_eq!(result.ruptures.len(), 4);
        assert_eq!(result.stats.unique_passing, 4);
    }

    #[test]
    fn test_continuable_fail_grows_without_recording() {
        struct AtLeastTwoSections;
        impl PlausibilityFilter for AtLeastTwoSections {
            fn name(&self) -> &str {
                "at least two sections"
            }
            fn short_name(&self) -> &str {
                "Min2"
            }
            fn apply(&self, rupture: &ClusterRupture, _verbose: bool) -> Result<FilterResult> {
                if rupture.total_sections() >= 2 {
                    Ok(FilterResult::Pass)
                } else {
                    Ok(FilterResult::FailContinuable)
                }
            }
        }
        let filters: Vec<Box<dyn PlausibilityFilter>> = vec![Box::new(AtLeastTwoSections)];
        let result = ClusterRuptureBuilder::new(chain_network(4), filters, 0)
            .build(&UnilateralGrowingStrategy, 1)
            .unwrap();
        // singles fail but keep growing; the six multi-cluster paths pass
        assert_eq!(result.ruptures.len(), 6);
        for rupture in &result.ruptures {
            assert!(rupture.total_sections() >= 2);
        }
    }

    #[test]
    fn test_splay_budget() {
        use crate::graph::{DistCutoffClosestSectConnection, FaultNetwork, Section};
        use crate::testutil::GridDistAzCalc;

        // fault 1: three sections along y=0; fault 2 hangs off the interior
        // section; fault 3 continues past the end
        let mut calc = GridDistAzCalc::default();
        calc.place(0, 0.0, 0.0);
        calc.place(1, 2.0, 0.0);
        calc.place(2, 4.0, 0.0);
        calc.place(3, 2.0, 2.0);
        calc.place(4, 6.0, 0.0);
        let sections = vec![
            Section::new(0, 1, "f1"),
            Section::new(1, 1, "f1"),
            Section::new(2, 1, "f1"),
            Section::new(3, 2, "f2"),
            Section::new(4, 3, "f3"),
        ];
        let build = |max_splays: usize| {
            let rule = DistCutoffClosestSectConnection::new(Arc::new(calc.clone()), 2.5);
            let network = Arc::new(FaultNetwork::new(sections.clone(), Box::new(rule)).unwrap());
            ClusterRuptureBuilder::new(network, vec![], max_splays)
                .build(&UnilateralGrowingStrategy, 1)
                .unwrap()
        };

        let without = build(0);
        for rupture in &without.ruptures {
            assert_eq!(rupture.splay_count(), 0);
        }
        // {0,1,2,3} needs a splay: section 3 attaches to the interior of f1
        assert!(!fingerprint_sets(&without).contains(&vec![0, 1, 2, 3]));

        let with = build(1);
        for rupture in &with.ruptures {
            assert!(rupture.splay_count() <= 1);
        }
        assert!(fingerprint_sets(&with).contains(&vec![0, 1, 2, 3]));
        assert!(with.ruptures.len() > without.ruptures.len());
    }

    #[test]
    fn test_interior_branches_consume_splay_budget() {
        use crate::graph::{DistCutoffClosestSectConnection, FaultNetwork, Section};
        use crate::testutil::GridDistAzCalc;

        // fault 1: three sections along y=0; faults 2 and 3 each reach only
        // the interior section, so taking both needs two splays
        let mut calc = GridDistAzCalc::default();
        calc.place(0, 0.0, 0.0);
        calc.place(1, 2.0, 0.0);
        calc.place(2, 4.0, 0.0);
        calc.place(3, 2.0, 2.0);
        calc.place(4, 2.0, -2.0);
        let sections = vec![
            Section::new(0, 1, "f1"),
            Section::new(1, 1, "f1"),
            Section::new(2, 1, "f1"),
            Section::new(3, 2, "f2"),
            Section::new(4, 3, "f3"),
        ];
        let rule = DistCutoffClosestSectConnection::new(Arc::new(calc), 2.5);
        let network = Arc::new(FaultNetwork::new(sections, Box::new(rule)).unwrap());
        let result = ClusterRuptureBuilder::new(network, vec![], 1)
            .build(&UnilateralGrowingStrategy, 1)
            .unwrap();

        for rupture in &result.ruptures {
            assert!(rupture.splay_count() <= 1);
        }
        // a branch off the interior of the last cluster counts against the
        // budget even though its source lies on the main strand's newest
        // cluster, so the all-sections rupture is out of reach
        assert!(!fingerprint_sets(&result).contains(&vec![0, 1, 2, 3, 4]));
        let full_f1_plus_branch = result
            .ruptures
            .iter()
            .find(|r| r.fingerprint().section_ids() == [0, 1, 2, 3])
            .expect("three-section strand with one branch should be accepted");
        assert_eq!(full_f1_plus_branch.splay_count(), 1);
        assert!(!full_f1_plus_branch.is_single_strand());
    }

    #[test]
    fn test_debug_stop_ends_search_early() {
        let builder = ClusterRuptureBuilder::new(chain_network(4), vec![], 0)
            .with_debug(Box::new(SectsDebugCriteria::exact(vec![1, 2])), true);
        let result = builder.build(&UnilateralGrowingStrategy, 1).unwrap();
        assert!(result.stats.stopped_early);
        assert!(result.ruptures.len() < 10);
    }

    #[test]
    fn test_debug_match_without_stop_keeps_output() {
        let builder = ClusterRuptureBuilder::new(chain_network(4), vec![], 0)
            .with_debug(Box::new(SectsDebugCriteria::exact(vec![1, 2])), false);
        let result = builder.build(&UnilateralGrowingStrategy, 1).unwrap();
        assert!(!result.stats.stopped_early);
        assert_eq!(result.ruptures.len(), 10);
    }

    #[test]
    fn test_filter_error_aborts_build() {
        struct Broken;
        impl PlausibilityFilter for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn short_name(&self) -> &str {
                "broken"
            }
            fn apply(&self, rupture: &ClusterRupture, _verbose: bool) -> Result<FilterResult> {
                if rupture.total_sections() >= 3 {
                    Err(RuptureError::InvalidScalar {
                        calc: "broken".to_string(),
                        value: f64::NAN,
                    })
                } else {
                    Ok(FilterResult::Pass)
                }
            }
        }
        let filters: Vec<Box<dyn PlausibilityFilter>> = vec![Box::new(Broken)];
        let err = ClusterRuptureBuilder::new(chain_network(4), filters, 0)
            .build(&UnilateralGrowingStrategy, 1)
            .err()
            .unwrap();
        assert!(matches!(err, RuptureError::InvalidScalar { .. }));
    }
}
