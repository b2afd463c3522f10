//! Rupture tree navigation
//!
//! Read-only predecessor/descendant queries over a rupture, at cluster and
//! section granularity, plus jump lookup between adjacent clusters (deriving
//! the reverse jump when the stored direction is the other way). Querying a
//! cluster or section that is not part of the rupture is a consistency
//! violation and panics.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::cluster_rupture::ClusterRupture;
use crate::graph::{Cluster, Jump, Section};

pub enum RuptureTreeNavigator {
    /// Linear rupture: plain index arithmetic, no maps
    SingleStrand(SingleStrandNavigator),
    /// General tree with splays
    Branching(BranchingNavigator),
}

impl RuptureTreeNavigator {
    pub fn new(rupture: &ClusterRupture) -> Self {
        if rupture.is_single_strand() {
            RuptureTreeNavigator::SingleStrand(SingleStrandNavigator::new(rupture))
        } else {
            RuptureTreeNavigator::Branching(BranchingNavigator::new(rupture))
        }
    }

    /// Cluster this one was reached from, `None` for the root
    pub fn predecessor_cluster(&self, cluster: &Arc<Cluster>) -> Option<Arc<Cluster>> {
        match self {
            Self::SingleStrand(n) => n.predecessor_cluster(cluster),
            Self::Branching(n) => n.predecessor_cluster(cluster),
        }
    }

    /// Clusters reached from this one
    pub fn descendant_clusters(&self, cluster: &Arc<Cluster>) -> Vec<Arc<Cluster>> {
        match self {
            Self::SingleStrand(n) => n.descendant_clusters(cluster),
            Self::Branching(n) => n.descendant_clusters(cluster),
        }
    }

    /// Jump connecting two adjacent clusters, reversed if stored the other
    /// way; panics when the clusters are not adjacent
    pub fn jump_between(&self, from: &Arc<Cluster>, to: &Arc<Cluster>) -> Jump {
        match self {
            Self::SingleStrand(n) => n.jump_between(from, to),
            Self::Branching(n) => n.jump_between(from, to),
        }
    }

    /// Section this one was reached from, `None` for the rupture start
    pub fn predecessor_section(&self, sect_id: u32) -> Option<Arc<Section>> {
        match self {
            Self::SingleStrand(n) => n.predecessor_section(sect_id),
            Self::Branching(n) => n.predecessor_section(sect_id),
        }
    }

    /// Sections reached from this one (within-cluster successor plus any
    /// jump targets departing it)
    pub fn descendant_sections(&self, sect_id: u32) -> Vec<Arc<Section>> {
        match self {
            Self::SingleStrand(n) => n.descendant_sections(sect_id),
            Self::Branching(n) => n.descendant_sections(sect_id),
        }
    }

    /// Cluster containing the given section
    pub fn cluster_of(&self, sect_id: u32) -> Arc<Cluster> {
        match self {
            Self::SingleStrand(n) => n.cluster_of(sect_id),
            Self::Branching(n) => n.cluster_of(sect_id),
        }
    }
}

pub struct SingleStrandNavigator {
    clusters: Vec<Arc<Cluster>>,
    jumps: Vec<Jump>,
}

impl SingleStrandNavigator {
    fn new(rupture: &ClusterRupture) -> Self {
        Self {
            clusters: rupture.clusters.clone(),
            jumps: rupture.internal_jumps.clone(),
        }
    }

    fn index(&self, cluster: &Arc<Cluster>) -> usize {
        self.clusters
            .iter()
            .position(|c| Arc::ptr_eq(c, cluster))
            .unwrap_or_else(|| panic!("cluster {cluster} is not part of this rupture"))
    }

    fn locate(&self, sect_id: u32) -> (usize, usize) {
        for (ci, cluster) in self.clusters.iter().enumerate() {
            if let Some(si) = cluster.index_of(sect_id) {
                return (ci, si);
            }
        }
        panic!("section {sect_id} is not part of this rupture");
    }

    fn predecessor_cluster(&self, cluster: &Arc<Cluster>) -> Option<Arc<Cluster>> {
        let i = self.index(cluster);
        (i > 0).then(|| self.clusters[i - 1].clone())
    }

    fn descendant_clusters(&self, cluster: &Arc<Cluster>) -> Vec<Arc<Cluster>> {
        let i = self.index(cluster);
        self.clusters.get(i + 1).cloned().into_iter().collect()
    }

    fn jump_between(&self, from: &Arc<Cluster>, to: &Arc<Cluster>) -> Jump {
        let fi = self.index(from);
        let ti = self.index(to);
        if ti == fi + 1 {
            self.jumps[fi].clone()
        } else if fi == ti + 1 {
            self.jumps[ti].reverse()
        } else {
            panic!("clusters {from} and {to} are not adjacent in this rupture");
        }
    }

    fn predecessor_section(&self, sect_id: u32) -> Option<Arc<Section>> {
        let (ci, si) = self.locate(sect_id);
        if si > 0 {
            Some(self.clusters[ci].sections[si - 1].clone())
        } else if ci > 0 {
            Some(self.jumps[ci - 1].from_section.clone())
        } else {
            None
        }
    }

    fn descendant_sections(&self, sect_id: u32) -> Vec<Arc<Section>> {
        let (ci, si) = self.locate(sect_id);
        let mut out = Vec::new();
        if let Some(next) = self.clusters[ci].sections.get(si + 1) {
            out.push(next.clone());
        }
        if let Some(jump) = self.jumps.get(ci) {
            if jump.from_section.id == sect_id {
                out.push(jump.to_section.clone());
            }
        }
        out
    }

    fn cluster_of(&self, sect_id: u32) -> Arc<Cluster> {
        let (ci, _) = self.locate(sect_id);
        self.clusters[ci].clone()
    }
}

struct Node {
    cluster: Arc<Cluster>,
    parent: Option<usize>,
    /// Jump that brought this cluster into the rupture (`None` for the root)
    in_jump: Option<Jump>,
    children: SmallVec<[usize; 2]>,
}

pub struct BranchingNavigator {
    nodes: Vec<Node>,
    sect_to_node: FxHashMap<u32, usize>,
}

impl BranchingNavigator {
    fn new(rupture: &ClusterRupture) -> Self {
        let mut nav = Self {
            nodes: Vec::with_capacity(rupture.total_clusters()),
            sect_to_node: FxHashMap::default(),
        };
        nav.add_subtree(rupture, None);
        nav
    }

    fn add_subtree(&mut self, rupture: &ClusterRupture, incoming: Option<Jump>) {
        let mut prev: Option<usize> = None;
        for (i, cluster) in rupture.clusters.iter().enumerate() {
            let in_jump = if i == 0 {
                incoming.clone()
            } else {
                Some(rupture.internal_jumps[i - 1].clone())
            };
            let parent = match (prev, &in_jump) {
                (Some(p), _) => Some(p),
                (None, Some(jump)) => Some(self.sect_to_node[&jump.from_section.id]),
                (None, None) => None,
            };
            let idx = self.add_node(cluster.clone(), parent, in_jump);
            prev = Some(idx);
        }
        for splay in &rupture.splays {
            self.add_subtree(&splay.rupture, Some(splay.jump.clone()));
        }
    }

    fn add_node(&mut self, cluster: Arc<Cluster>, parent: Option<usize>, in_jump: Option<Jump>) -> usize {
        let idx = self.nodes.len();
        for s in &cluster.sections {
            self.sect_to_node.insert(s.id, idx);
        }
        self.nodes.push(Node {
            cluster,
            parent,
            in_jump,
            children: SmallVec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(idx);
        }
        idx
    }

    fn index(&self, cluster: &Arc<Cluster>) -> usize {
        self.nodes
            .iter()
            .position(|n| Arc::ptr_eq(&n.cluster, cluster))
            .unwrap_or_else(|| panic!("cluster {cluster} is not part of this rupture"))
    }

    fn node_of(&self, sect_id: u32) -> &Node {
        let idx = *self
            .sect_to_node
            .get(&sect_id)
            .unwrap_or_else(|| panic!("section {sect_id} is not part of this rupture"));
        &self.nodes[idx]
    }

    fn predecessor_cluster(&self, cluster: &Arc<Cluster>) -> Option<Arc<Cluster>> {
        let i = self.index(cluster);
        self.nodes[i].parent.map(|p| self.nodes[p].cluster.clone())
    }

    fn descendant_clusters(&self, cluster: &Arc<Cluster>) -> Vec<Arc<Cluster>> {
        let i = self.index(cluster);
        self.nodes[i]
            .children
            .iter()
            .map(|&c| self.nodes[c].cluster.clone())
            .collect()
    }

    fn jump_between(&self, from: &Arc<Cluster>, to: &Arc<Cluster>) -> Jump {
        let fi = self.index(from);
        let ti = self.index(to);
        if self.nodes[ti].parent == Some(fi) {
            self.nodes[ti].in_jump.clone().unwrap()
        } else if self.nodes[fi].parent == Some(ti) {
            self.nodes[fi].in_jump.as_ref().unwrap().reverse()
        } else {
            panic!("clusters {from} and {to} are not adjacent in this rupture");
        }
    }

    fn predecessor_section(&self, sect_id: u32) -> Option<Arc<Section>> {
        let node = self.node_of(sect_id);
        let si = node.cluster.index_of(sect_id).unwrap();
        if si > 0 {
            Some(node.cluster.sections[si - 1].clone())
        } else {
            node.in_jump.as_ref().map(|j| j.from_section.clone())
        }
    }

    fn descendant_sections(&self, sect_id: u32) -> Vec<Arc<Section>> {
        let node = self.node_of(sect_id);
        let si = node.cluster.index_of(sect_id).unwrap();
        let mut out = Vec::new();
        if let Some(next) = node.cluster.sections.get(si + 1) {
            out.push(next.clone());
        }
        for &child in &node.children {
            if let Some(jump) = &self.nodes[child].in_jump {
                if jump.from_section.id == sect_id {
                    out.push(jump.to_section.clone());
                }
            }
        }
        out
    }

    fn cluster_of(&self, sect_id: u32) -> Arc<Cluster> {
        self.node_of(sect_id).cluster.clone()
    }
}
