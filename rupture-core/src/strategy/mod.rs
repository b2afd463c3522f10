//! Rupture growing strategies
//!
//! A strategy decides which contiguous sub-clusters (permutations) of a
//! target cluster are tried when the search enters it at a given section.

use std::sync::Arc;

use crate::graph::{Cluster, FaultNetwork, Section};
use crate::rupture::ClusterRupture;

/// Pluggable growth-permutation source
///
/// Every returned cluster is a non-empty contiguous run of the full
/// cluster's sections beginning at the entry section. An empty result means
/// the cluster cannot be entered there.
pub trait RuptureGrowingStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Permutations for seeding a new rupture at `start`
    fn seed_permutations(&self, cluster: &Arc<Cluster>, start: &Arc<Section>) -> Vec<Arc<Cluster>>;

    /// Permutations for growing an existing rupture into `cluster` at
    /// `entry`; defaults to the seed behavior
    fn permutations(
        &self,
        _current: &ClusterRupture,
        cluster: &Arc<Cluster>,
        entry: &Arc<Section>,
    ) -> Vec<Arc<Cluster>> {
        self.seed_permutations(cluster, entry)
    }
}

/// Every contiguous run from the entry section toward either end, each run
/// strictly one-directional
pub struct UnilateralGrowingStrategy;

impl RuptureGrowingStrategy for UnilateralGrowingStrategy {
    fn name(&self) -> &str {
        "exhaustive unilateral"
    }

    fn seed_permutations(&self, cluster: &Arc<Cluster>, start: &Arc<Section>) -> Vec<Arc<Cluster>> {
        let e = cluster
            .index_of(start.id)
            .unwrap_or_else(|| panic!("section {} is not in cluster {cluster}", start.id));
        let mut out = Vec::with_capacity(cluster.len());
        for end in e..cluster.len() {
            out.push(Arc::new(Cluster::new(
                cluster.parent_id,
                cluster.parent_name.clone(),
                cluster.sections[e..=end].to_vec(),
            )));
        }
        for end in (0..e).rev() {
            let sections: Vec<Arc<Section>> =
                cluster.sections[end..=e].iter().rev().cloned().collect();
            out.push(Arc::new(Cluster::new(
                cluster.parent_id,
                cluster.parent_name.clone(),
                sections,
            )));
        }
        out
    }
}

/// Unilateral runs that stop only at useful endpoints: the full cluster's
/// ends or sections with at least one connection
///
/// Cuts the permutation count on long clusters without losing any
/// connectivity-distinct rupture.
pub struct ConnectionPointsGrowingStrategy {
    network: Arc<FaultNetwork>,
    inner: UnilateralGrowingStrategy,
}

impl ConnectionPointsGrowingStrategy {
    pub fn new(network: Arc<FaultNetwork>) -> Self {
        Self {
            network,
            inner: UnilateralGrowingStrategy,
        }
    }

    fn is_useful_end(&self, full: &Cluster, sect_id: u32) -> bool {
        full.sections.first().map(|s| s.id) == Some(sect_id)
            || full.sections.last().map(|s| s.id) == Some(sect_id)
            || self.network.is_connection_point(sect_id)
    }
}

impl RuptureGrowingStrategy for ConnectionPointsGrowingStrategy {
    fn name(&self) -> &str {
        "connection points"
    }

    fn seed_permutations(&self, cluster: &Arc<Cluster>, start: &Arc<Section>) -> Vec<Arc<Cluster>> {
        self.inner
            .seed_permutations(cluster, start)
            .into_iter()
            .filter(|p| self.is_useful_end(cluster, p.end_section().id))
            .collect()
    }
}
