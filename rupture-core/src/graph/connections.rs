//! Cluster grouping and connection building
//!
//! Turns a flat section list into per-parent clusters and builds the
//! symmetric jump set between them via a pluggable connection rule. The
//! connection pass runs exactly once, lazily on first access.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::types::{Cluster, Jump, Section};
use crate::error::{Result, RuptureError};

/// Black-box geometric collaborator
///
/// Distances are in km, azimuths in degrees. The engine never computes
/// geometry itself.
pub trait SectionDistanceAzimuthCalc: Send + Sync {
    fn distance(&self, a: &Section, b: &Section) -> f64;
    fn azimuth(&self, from: &Section, to: &Section) -> f64;
}

/// Pluggable rule producing the possible jumps between a cluster pair
///
/// Returned jumps are directed `from -> to`; the network adds the reverse
/// direction itself.
pub trait ClusterConnectionRule: Send + Sync {
    fn name(&self) -> &str;
    fn possible_connections(&self, from: &Arc<Cluster>, to: &Arc<Cluster>) -> Vec<Jump>;
}

/// Connects each cluster pair at its single closest section pair, when that
/// pair is within a distance cutoff
///
/// Distances are compared at `f32` precision so results are stable across
/// platforms.
pub struct DistCutoffClosestSectConnection {
    calc: Arc<dyn SectionDistanceAzimuthCalc>,
    max_jump_dist: f64,
}

impl DistCutoffClosestSectConnection {
    pub fn new(calc: Arc<dyn SectionDistanceAzimuthCalc>, max_jump_dist: f64) -> Self {
        Self { calc, max_jump_dist }
    }

    pub fn max_jump_dist(&self) -> f64 {
        self.max_jump_dist
    }
}

impl ClusterConnectionRule for DistCutoffClosestSectConnection {
    fn name(&self) -> &str {
        "closest section pair within cutoff"
    }

    fn possible_connections(&self, from: &Arc<Cluster>, to: &Arc<Cluster>) -> Vec<Jump> {
        let mut best: Option<(f32, Arc<Section>, Arc<Section>)> = None;
        for a in &from.sections {
            for b in &to.sections {
                let dist = self.calc.distance(a, b) as f32;
                let better = match &best {
                    Some((d, _, _)) => dist < *d,
                    None => true,
                };
                if better {
                    best = Some((dist, a.clone(), b.clone()));
                }
            }
        }
        match best {
            Some((dist, a, b)) if dist <= self.max_jump_dist as f32 => vec![Jump::new(
                from.clone(),
                a,
                to.clone(),
                b,
                dist as f64,
            )],
            _ => Vec::new(),
        }
    }
}

/// Built connectivity: per-section jump adjacency plus parent-pair index
struct Connectivity {
    jumps_from: FxHashMap<u32, SmallVec<[Jump; 4]>>,
    connected_parents: FxHashSet<(u32, u32)>,
    total_jumps: usize,
}

/// The static fault graph: clusters plus their jump connectivity
///
/// Construction groups sections into clusters by parent fault; the jump set
/// is built on first access and never rebuilt.
pub struct FaultNetwork {
    clusters: Vec<Arc<Cluster>>,
    rule: Box<dyn ClusterConnectionRule>,
    connectivity: OnceCell<Connectivity>,
}

impl FaultNetwork {
    /// Group a flat section list into clusters by parent fault
    ///
    /// Sections keep their input order within each cluster; clusters appear
    /// in order of first parent appearance. A section without a parent id is
    /// a fatal configuration error.
    pub fn new(sections: Vec<Section>, rule: Box<dyn ClusterConnectionRule>) -> Result<Self> {
        let mut order: Vec<u32> = Vec::new();
        let mut grouped: FxHashMap<u32, (String, Vec<Arc<Section>>)> = FxHashMap::default();
        for section in sections {
            let parent_id = section
                .parent_id
                .ok_or(RuptureError::MissingParent { section: section.id })?;
            let entry = grouped.entry(parent_id).or_insert_with(|| {
                order.push(parent_id);
                (section.parent_name.clone(), Vec::new())
            });
            entry.1.push(Arc::new(section));
        }
        let clusters = order
            .into_iter()
            .map(|parent_id| {
                let (name, sections) = grouped.remove(&parent_id).unwrap();
                Arc::new(Cluster::new(parent_id, name, sections))
            })
            .collect();
        Ok(Self {
            clusters,
            rule,
            connectivity: OnceCell::new(),
        })
    }

    /// Build a network from pre-grouped clusters
    pub fn from_clusters(clusters: Vec<Cluster>, rule: Box<dyn ClusterConnectionRule>) -> Self {
        Self {
            clusters: clusters.into_iter().map(Arc::new).collect(),
            rule,
            connectivity: OnceCell::new(),
        }
    }

    pub fn clusters(&self) -> &[Arc<Cluster>] {
        &self.clusters
    }

    pub fn cluster_for_parent(&self, parent_id: u32) -> Option<&Arc<Cluster>> {
        self.clusters.iter().find(|c| c.parent_id == parent_id)
    }

    /// All jumps departing the given section
    pub fn jumps_from(&self, sect_id: u32) -> &[Jump] {
        self.connectivity()
            .jumps_from
            .get(&sect_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn are_parents_connected(&self, a: u32, b: u32) -> bool {
        self.connectivity().connected_parents.contains(&(a, b))
    }

    /// Total directed jumps in the network (each connection counts twice)
    pub fn total_jumps(&self) -> usize {
        self.connectivity().total_jumps
    }

    /// Sections with at least one departing jump
    pub fn is_connection_point(&self, sect_id: u32) -> bool {
        !self.jumps_from(sect_id).is_empty()
    }

    fn connectivity(&self) -> &Connectivity {
        self.connectivity.get_or_init(|| {
            let mut jumps_from: FxHashMap<u32, SmallVec<[Jump; 4]>> = FxHashMap::default();
            let mut connected_parents = FxHashSet::default();
            let mut total_jumps = 0usize;
            for i in 0..self.clusters.len() {
                for j in (i + 1)..self.clusters.len() {
                    let from = &self.clusters[i];
                    let to = &self.clusters[j];
                    for jump in self.rule.possible_connections(from, to) {
                        let reverse = jump.reverse();
                        jumps_from
                            .entry(jump.from_section.id)
                            .or_default()
                            .push(jump);
                        jumps_from
                            .entry(reverse.from_section.id)
                            .or_default()
                            .push(reverse);
                        connected_parents.insert((from.parent_id, to.parent_id));
                        connected_parents.insert((to.parent_id, from.parent_id));
                        total_jumps += 2;
                    }
                }
            }
            Connectivity {
                jumps_from,
                connected_parents,
                total_jumps,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::GridDistAzCalc;

    fn two_fault_sections() -> (Vec<Section>, GridDistAzCalc) {
        // fault 1: sections 0,1 at x=0,1; fault 2: sections 2,3 at x=3,4
        let mut calc = GridDistAzCalc::default();
        calc.place(0, 0.0, 0.0);
        calc.place(1, 1.0, 0.0);
        calc.place(2, 3.0, 0.0);
        calc.place(3, 4.0, 0.0);
        let sections = vec![
            Section::new(0, 1, "f1"),
            Section::new(1, 1, "f1"),
            Section::new(2, 2, "f2"),
            Section::new(3, 2, "f2"),
        ];
        (sections, calc)
    }

    #[test]
    fn test_grouping_preserves_order() {
        let (sections, calc) = two_fault_sections();
        let rule = DistCutoffClosestSectConnection::new(Arc::new(calc), 5.0);
        let network = FaultNetwork::new(sections, Box::new(rule)).unwrap();
        assert_eq!(network.clusters().len(), 2);
        assert_eq!(network.clusters()[0].parent_id, 1);
        assert_eq!(network.clusters()[1].parent_id, 2);
        assert_eq!(network.clusters()[0].sections[0].id, 0);
    }

    #[test]
    fn test_missing_parent_rejected() {
        let mut s = Section::new(7, 1, "f1");
        s.parent_id = None;
        let calc = GridDistAzCalc::default();
        let rule = DistCutoffClosestSectConnection::new(Arc::new(calc), 5.0);
        let err = FaultNetwork::new(vec![s], Box::new(rule)).err().unwrap();
        assert!(matches!(err, RuptureError::MissingParent { section: 7 }));
    }

    #[test]
    fn test_closest_pair_connection() {
        let (sections, calc) = two_fault_sections();
        let rule = DistCutoffClosestSectConnection::new(Arc::new(calc), 5.0);
        let network = FaultNetwork::new(sections, Box::new(rule)).unwrap();
        // closest pair is section 1 (x=1) to section 2 (x=3)
        let jumps = network.jumps_from(1);
        assert_eq!(jumps.len(), 1);
        assert_eq!(jumps[0].to_section.id, 2);
        assert!((jumps[0].distance - 2.0).abs() < 1e-9);
        // symmetric reverse jump
        let back = network.jumps_from(2);
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].to_section.id, 1);
        // non-closest sections have no jumps
        assert!(network.jumps_from(0).is_empty());
        assert!(network.jumps_from(3).is_empty());
        assert!(network.are_parents_connected(1, 2));
        assert!(network.are_parents_connected(2, 1));
        assert_eq!(network.total_jumps(), 2);
    }

    #[test]
    fn test_cutoff_excludes_distant_pair() {
        let (sections, calc) = two_fault_sections();
        let rule = DistCutoffClosestSectConnection::new(Arc::new(calc), 1.5);
        let network = FaultNetwork::new(sections, Box::new(rule)).unwrap();
        assert_eq!(network.total_jumps(), 0);
        assert!(!network.are_parents_connected(1, 2));
    }

    #[test]
    fn test_connection_build_is_idempotent() {
        let (sections, calc) = two_fault_sections();
        let rule = DistCutoffClosestSectConnection::new(Arc::new(calc), 5.0);
        let network = FaultNetwork::new(sections, Box::new(rule)).unwrap();
        let first = network.total_jumps();
        // repeated access must not rebuild or duplicate
        assert_eq!(network.total_jumps(), first);
        assert_eq!(network.jumps_from(1).len(), 1);
        assert_eq!(network.jumps_from(1).len(), 1);
    }
}
