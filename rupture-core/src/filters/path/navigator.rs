//! Outward path walks from a nucleation cluster
//!
//! A path navigator grows a frontier outward through the rupture tree in
//! both directions (toward predecessors and descendants), yielding the
//! additions of each step. Cluster granularity adds whole clusters at a
//! time; section granularity adds one section at a time.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::graph::{Cluster, Section};
use crate::rupture::{ClusterRupture, RuptureTreeNavigator};

/// One step of outward growth
#[derive(Debug, Clone)]
pub struct PathAddition {
    /// Section the growth came from
    pub from_section: Arc<Section>,
    /// Cluster the growth came from
    pub from_cluster: Arc<Cluster>,
    /// Sections added by this step
    pub to_sections: Vec<Arc<Section>>,
    /// Cluster the added sections belong to
    pub to_cluster: Arc<Cluster>,
}

impl PartialEq for PathAddition {
    /// Equality by the added section set
    fn eq(&self, other: &Self) -> bool {
        self.to_sections.len() == other.to_sections.len()
            && self
                .to_sections
                .iter()
                .zip(&other.to_sections)
                .all(|(a, b)| a.id == b.id)
    }
}

impl Eq for PathAddition {}

/// Stateful outward walk; `next_additions` advances the frontier and folds
/// the returned additions into the current section set
pub trait PathNavigator {
    /// Sections reached so far, in addition order
    fn current_sections(&self) -> &[Arc<Section>];

    /// Advance one step outward; empty when the rupture is fully covered
    fn next_additions(&mut self) -> Vec<PathAddition>;
}

/// Whole-cluster growth steps
pub struct ClusterPathNavigator {
    nav: RuptureTreeNavigator,
    current_sections: Vec<Arc<Section>>,
    growth: Vec<Arc<Cluster>>,
    visited: Vec<Arc<Cluster>>,
}

impl ClusterPathNavigator {
    pub fn new(rupture: &ClusterRupture, nucleation: &Arc<Cluster>) -> Self {
        Self {
            nav: rupture.navigator(),
            current_sections: nucleation.sections.clone(),
            growth: vec![nucleation.clone()],
            visited: vec![nucleation.clone()],
        }
    }

    fn neighbors(&self, cluster: &Arc<Cluster>) -> Vec<Arc<Cluster>> {
        let mut out = Vec::new();
        if let Some(pred) = self.nav.predecessor_cluster(cluster) {
            out.push(pred);
        }
        out.extend(self.nav.descendant_clusters(cluster));
        out
    }
}

impl PathNavigator for ClusterPathNavigator {
    fn current_sections(&self) -> &[Arc<Section>] {
        &self.current_sections
    }

    fn next_additions(&mut self) -> Vec<PathAddition> {
        let mut additions = Vec::new();
        let mut next_growth = Vec::new();
        for cluster in std::mem::take(&mut self.growth) {
            for neighbor in self.neighbors(&cluster) {
                if self.visited.iter().any(|v| Arc::ptr_eq(v, &neighbor)) {
                    continue;
                }
                let jump = self.nav.jump_between(&cluster, &neighbor);
                additions.push(PathAddition {
                    from_section: jump.from_section.clone(),
                    from_cluster: cluster.clone(),
                    to_sections: neighbor.sections.clone(),
                    to_cluster: neighbor.clone(),
                });
                self.visited.push(neighbor.clone());
                next_growth.push(neighbor);
            }
        }
        for addition in &additions {
            self.current_sections
                .extend(addition.to_sections.iter().cloned());
        }
        self.growth = next_growth;
        additions
    }
}

/// Single-section growth steps
pub struct SectionPathNavigator {
    nav: RuptureTreeNavigator,
    current_sections: Vec<Arc<Section>>,
    growth: Vec<Arc<Section>>,
    seen: FxHashSet<u32>,
}

impl SectionPathNavigator {
    pub fn new(rupture: &ClusterRupture, nucleation: &Arc<Cluster>) -> Self {
        Self {
            nav: rupture.navigator(),
            current_sections: nucleation.sections.clone(),
            growth: nucleation.sections.clone(),
            seen: nucleation.sections.iter().map(|s| s.id).collect(),
        }
    }
}

impl PathNavigator for SectionPathNavigator {
    fn current_sections(&self) -> &[Arc<Section>] {
        &self.current_sections
    }

    fn next_additions(&mut self) -> Vec<PathAddition> {
        let mut additions = Vec::new();
        let mut next_growth = Vec::new();
        for sect in std::mem::take(&mut self.growth) {
            let mut neighbors = self.nav.descendant_sections(sect.id);
            if let Some(pred) = self.nav.predecessor_section(sect.id) {
                neighbors.push(pred);
            }
            for neighbor in neighbors {
                if !self.seen.insert(neighbor.id) {
                    continue;
                }
                additions.push(PathAddition {
                    from_section: sect.clone(),
                    from_cluster: self.nav.cluster_of(sect.id),
                    to_sections: vec![neighbor.clone()],
                    to_cluster: self.nav.cluster_of(neighbor.id),
                });
                self.current_sections.push(neighbor.clone());
                next_growth.push(neighbor);
            }
        }
        self.growth = next_growth;
        additions
    }
}
