//! Immutable rupture tree
//!
//! A rupture is a main strand of clusters joined by internal jumps, plus
//! zero or more splays, each itself a rupture hanging off an interior
//! section. Growth is append-only: `take` returns a new rupture sharing the
//! existing `Arc<Cluster>` handles and never mutates the original.

use std::sync::Arc;
use std::sync::Mutex;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::fingerprint::RuptureFingerprint;
use super::navigator::RuptureTreeNavigator;
use crate::graph::{Cluster, Jump};

/// Splay indices from the root identifying a strand within the tree
///
/// The empty path is the main strand; `[i, j]` is splay `j` of splay `i`.
pub type StrandPath = SmallVec<[usize; 2]>;

/// A splay sub-tree and the jump that opened it
#[derive(Debug, Clone)]
pub struct Splay {
    pub jump: Jump,
    pub rupture: ClusterRupture,
}

#[derive(Debug)]
pub struct ClusterRupture {
    /// Main strand clusters in growth order
    pub clusters: Vec<Arc<Cluster>>,
    /// Jumps joining consecutive main strand clusters
    pub internal_jumps: Vec<Jump>,
    /// Splay sub-trees in attachment order
    pub splays: Vec<Splay>,
    fingerprint: RuptureFingerprint,
    single_strand: bool,
    /// Per-lineage scratch data for filters (copied into children on take)
    filter_data: Mutex<FxHashMap<u64, FxHashSet<ScratchEntry>>>,
}

impl Clone for ClusterRupture {
    fn clone(&self) -> Self {
        Self {
            clusters: self.clusters.clone(),
            internal_jumps: self.internal_jumps.clone(),
            splays: self.splays.clone(),
            fingerprint: self.fingerprint.clone(),
            single_strand: self.single_strand,
            filter_data: Mutex::new(
                self.filter_data
                    .lock()
                    .map(|d| d.clone())
                    .unwrap_or_default(),
            ),
        }
    }
}

impl ClusterRupture {
    /// Single-cluster rupture
    pub fn new(cluster: Arc<Cluster>) -> Self {
        let fingerprint = RuptureFingerprint::from_cluster(&cluster);
        Self {
            clusters: vec![cluster],
            internal_jumps: Vec::new(),
            splays: Vec::new(),
            fingerprint,
            single_strand: true,
            filter_data: Mutex::new(FxHashMap::default()),
        }
    }

    /// Extend with a jump, returning the new rupture and the strand that
    /// received the jump
    ///
    /// A jump from a strand's growing end continues that strand; any other
    /// source section opens a new splay. The jump's target cluster must not
    /// re-use any section already in the rupture.
    pub fn take(&self, jump: Jump) -> (ClusterRupture, StrandPath) {
        assert!(
            self.contains_section(jump.from_section.id),
            "jump source section {} is not part of this rupture",
            jump.from_section.id
        );
        for s in &jump.to_cluster.sections {
            assert!(
                !self.contains_section(s.id),
                "jump target re-uses section {} already in this rupture",
                s.id
            );
        }
        let mut next = self.clone();
        let path = next.attach(jump);
        (next, path)
    }

    fn attach(&mut self, jump: Jump) -> StrandPath {
        self.fingerprint = self.fingerprint.with_cluster(&jump.to_cluster);
        let last = self.clusters.last().unwrap();
        if jump.from_section.id == last.end_section().id {
            // strand continuation from the growing end; jumps from any
            // other section of the last cluster are splays
            self.clusters.push(jump.to_cluster.clone());
            self.internal_jumps.push(jump);
            return SmallVec::new();
        }
        for (i, splay) in self.splays.iter_mut().enumerate() {
            if splay.rupture.contains_section(jump.from_section.id) {
                let mut path = splay.rupture.attach(jump);
                path.insert(0, i);
                return path;
            }
        }
        // source is an interior main strand section: open a new splay
        self.single_strand = false;
        let sub = ClusterRupture::new(jump.to_cluster.clone());
        self.splays.push(Splay { jump, rupture: sub });
        let mut path = SmallVec::new();
        path.push(self.splays.len() - 1);
        path
    }

    pub fn fingerprint(&self) -> &RuptureFingerprint {
        &self.fingerprint
    }

    pub fn contains_section(&self, sect_id: u32) -> bool {
        self.fingerprint.contains(sect_id)
    }

    pub fn total_sections(&self) -> usize {
        self.fingerprint.len()
    }

    pub fn total_clusters(&self) -> usize {
        self.clusters.len()
            + self
                .splays
                .iter()
                .map(|s| s.rupture.total_clusters())
                .sum::<usize>()
    }

    pub fn total_jumps(&self) -> usize {
        self.internal_jumps.len()
            + self
                .splays
                .iter()
                .map(|s| 1 + s.rupture.total_jumps())
                .sum::<usize>()
    }

    /// Total splays anywhere in the tree
    pub fn splay_count(&self) -> usize {
        self.splays.len()
            + self
                .splays
                .iter()
                .map(|s| s.rupture.splay_count())
                .sum::<usize>()
    }

    /// True when the rupture is a single linear strand with no splays
    pub fn is_single_strand(&self) -> bool {
        self.single_strand
    }

    /// All clusters in pre-order: main strand first, then each splay
    pub fn all_clusters(&self) -> Vec<&Arc<Cluster>> {
        let mut out = Vec::with_capacity(self.total_clusters());
        self.collect_clusters(&mut out);
        out
    }

    fn collect_clusters<'a>(&'a self, out: &mut Vec<&'a Arc<Cluster>>) {
        out.extend(self.clusters.iter());
        for splay in &self.splays {
            splay.rupture.collect_clusters(out);
        }
    }

    /// All jumps in pre-order: internal jumps first, then each splay's
    /// opening jump followed by its own jumps
    pub fn all_jumps(&self) -> Vec<&Jump> {
        let mut out = Vec::with_capacity(self.total_jumps());
        self.collect_jumps(&mut out);
        out
    }

    fn collect_jumps<'a>(&'a self, out: &mut Vec<&'a Jump>) {
        out.extend(self.internal_jumps.iter());
        for splay in &self.splays {
            out.push(&splay.jump);
            splay.rupture.collect_jumps(out);
        }
    }

    /// Section ids in traversal order (not sorted)
    pub fn ordered_section_ids(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.total_sections());
        for cluster in self.all_clusters() {
            out.extend(cluster.sections.iter().map(|s| s.id));
        }
        out
    }

    /// Resolve a strand path to its sub-rupture
    pub fn strand(&self, path: &[usize]) -> &ClusterRupture {
        let mut cur = self;
        for &i in path {
            cur = &cur.splays[i].rupture;
        }
        cur
    }

    /// Growing-end cluster of every strand (main strand plus each splay)
    pub fn strand_end_clusters(&self) -> Vec<&Arc<Cluster>> {
        let mut out = Vec::new();
        self.collect_strand_ends(&mut out);
        out
    }

    fn collect_strand_ends<'a>(&'a self, out: &mut Vec<&'a Arc<Cluster>>) {
        out.push(self.clusters.last().unwrap());
        for splay in &self.splays {
            splay.rupture.collect_strand_ends(out);
        }
    }

    /// Same rupture built in the opposite direction (single strand only)
    pub fn reversed(&self) -> ClusterRupture {
        assert!(self.single_strand, "cannot reverse a rupture with splays");
        let rev_clusters: Vec<Arc<Cluster>> = self
            .clusters
            .iter()
            .rev()
            .map(|c| Arc::new(c.reversed()))
            .collect();
        let mut internal_jumps = Vec::with_capacity(self.internal_jumps.len());
        for (i, jump) in self.internal_jumps.iter().enumerate().rev() {
            // jump i joined clusters[i] -> clusters[i+1]; reversed it joins
            // the reversed i+1 cluster back into the reversed i cluster
            let n = self.clusters.len();
            internal_jumps.push(Jump::new(
                rev_clusters[n - 2 - i].clone(),
                jump.to_section.clone(),
                rev_clusters[n - 1 - i].clone(),
                jump.from_section.clone(),
                jump.distance,
            ));
        }
        ClusterRupture {
            clusters: rev_clusters,
            internal_jumps,
            splays: Vec::new(),
            fingerprint: self.fingerprint.clone(),
            single_strand: true,
            filter_data: Mutex::new(
                self.filter_data
                    .lock()
                    .map(|d| d.clone())
                    .unwrap_or_default(),
            ),
        }
    }

    /// Build the tree navigator for this rupture
    pub fn navigator(&self) -> RuptureTreeNavigator {
        RuptureTreeNavigator::new(self)
    }

    /// Whether `cluster` was recorded under `key` for this lineage
    pub fn filter_scratch_contains(&self, key: u64, cluster: &Cluster) -> bool {
        let entry = scratch_entry(cluster);
        self.filter_data
            .lock()
            .map(|d| d.get(&key).is_some_and(|set| set.contains(&entry)))
            .unwrap_or(false)
    }

    /// Record `cluster` under `key`; extensions of this rupture inherit it
    pub fn filter_scratch_insert(&self, key: u64, cluster: &Cluster) {
        if let Ok(mut d) = self.filter_data.lock() {
            d.entry(key).or_default().insert(scratch_entry(cluster));
        }
    }
}

/// Exact scratch identity. A permutation is a contiguous directed run of
/// one parent's sections, so parent plus endpoint ids pin it uniquely.
type ScratchEntry = (u32, u32, u32);

fn scratch_entry(cluster: &Cluster) -> ScratchEntry {
    (
        cluster.parent_id,
        cluster.start_section().id,
        cluster.end_section().id,
    )
}

impl std::fmt::Display for ClusterRupture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for cluster in &self.clusters {
            write!(f, "{cluster}")?;
        }
        for splay in &self.splays {
            write!(f, "<{}:{}>", splay.jump.from_section.id, splay.rupture)?;
        }
        Ok(())
    }
}
