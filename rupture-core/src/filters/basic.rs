//! Section-count and cluster-count filters

use crate::error::Result;
use crate::filters::types::FilterResult;
use crate::filters::PlausibilityFilter;
use crate::rupture::ClusterRupture;

/// Requires every cluster to carry a minimum number of sections
///
/// A too-small cluster at a strand's growing end can still be extended, so
/// it fails continuable; a too-small interior cluster can never be fixed
/// and is a hard stop.
pub struct MinSectsPerParentFilter {
    min_per_parent: usize,
}

impl MinSectsPerParentFilter {
    pub fn new(min_per_parent: usize) -> Self {
        Self { min_per_parent }
    }
}

impl PlausibilityFilter for MinSectsPerParentFilter {
    fn name(&self) -> &str {
        "minimum sections per parent fault"
    }

    fn short_name(&self) -> &str {
        "MinSectsPerParent"
    }

    fn apply(&self, rupture: &ClusterRupture, _verbose: bool) -> Result<FilterResult> {
        let ends = rupture.strand_end_clusters();
        let mut result = FilterResult::Pass;
        for cluster in rupture.all_clusters() {
            if cluster.len() >= self.min_per_parent {
                continue;
            }
            let is_growing_end = ends.iter().any(|e| std::sync::Arc::ptr_eq(e, cluster));
            if is_growing_end {
                result = result.and(FilterResult::FailContinuable);
            } else {
                return Ok(FilterResult::FailHardStop);
            }
        }
        Ok(result)
    }
}

/// Caps the total cluster count; exceeding it can never recover
pub struct MaxClustersFilter {
    max_clusters: usize,
}

impl MaxClustersFilter {
    pub fn new(max_clusters: usize) -> Self {
        Self { max_clusters }
    }
}

impl PlausibilityFilter for MaxClustersFilter {
    fn name(&self) -> &str {
        "maximum clusters"
    }

    fn short_name(&self) -> &str {
        "MaxClusters"
    }

    fn apply(&self, rupture: &ClusterRupture, _verbose: bool) -> Result<FilterResult> {
        if rupture.total_clusters() > self.max_clusters {
            Ok(FilterResult::FailHardStop)
        } else {
            Ok(FilterResult::Pass)
        }
    }
}
