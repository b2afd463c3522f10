//! Shared test fixtures
//!
//! Small helpers for building sections, clusters, jumps, and synthetic
//! geometry without real fault data.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::graph::{
    Cluster, DistCutoffClosestSectConnection, FaultNetwork, Jump, Section,
    SectionDistanceAzimuthCalc,
};

pub fn sect(id: u32, parent: u32) -> Arc<Section> {
    Arc::new(Section::new(id, parent, format!("fault {parent}")))
}

pub fn cluster(parent: u32, ids: &[u32]) -> Cluster {
    Cluster::new(
        parent,
        format!("fault {parent}"),
        ids.iter().map(|&id| sect(id, parent)).collect(),
    )
}

pub fn arc_cluster(parent: u32, ids: &[u32]) -> Arc<Cluster> {
    Arc::new(cluster(parent, ids))
}

/// Jump between two clusters by section id
pub fn jump_between(
    from: &Arc<Cluster>,
    from_id: u32,
    to: &Arc<Cluster>,
    to_id: u32,
    distance: f64,
) -> Jump {
    let from_section = from
        .sections
        .iter()
        .find(|s| s.id == from_id)
        .expect("from section not in cluster")
        .clone();
    let to_section = to
        .sections
        .iter()
        .find(|s| s.id == to_id)
        .expect("to section not in cluster")
        .clone();
    Jump::new(from.clone(), from_section, to.clone(), to_section, distance)
}

/// Synthetic planar geometry: sections placed on a grid, Euclidean
/// distances, compass azimuths (0 = +y, 90 = +x)
#[derive(Default, Clone)]
pub struct GridDistAzCalc {
    positions: FxHashMap<u32, (f64, f64)>,
}

impl GridDistAzCalc {
    pub fn place(&mut self, sect_id: u32, x: f64, y: f64) {
        self.positions.insert(sect_id, (x, y));
    }

    fn pos(&self, sect_id: u32) -> (f64, f64) {
        *self
            .positions
            .get(&sect_id)
            .expect("section has no position")
    }
}

/// Linear chain of `n` single-section clusters spaced 2 km apart, with
/// adjacent pairs connected (section and parent ids both run `0..n`)
pub fn chain_network(n: usize) -> Arc<FaultNetwork> {
    let mut calc = GridDistAzCalc::default();
    let mut sections = Vec::with_capacity(n);
    for i in 0..n as u32 {
        calc.place(i, 2.0 * f64::from(i), 0.0);
        sections.push(Section::new(i, i, format!("fault {i}")));
    }
    let rule = DistCutoffClosestSectConnection::new(Arc::new(calc), 2.5);
    Arc::new(FaultNetwork::new(sections, Box::new(rule)).expect("chain network"))
}

impl SectionDistanceAzimuthCalc for GridDistAzCalc {
    fn distance(&self, a: &Section, b: &Section) -> f64 {
        let (ax, ay) = self.pos(a.id);
        let (bx, by) = self.pos(b.id);
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    fn azimuth(&self, from: &Section, to: &Section) -> f64 {
        let (fx, fy) = self.pos(from.id);
        let (tx, ty) = self.pos(to.id);
        let az = (tx - fx).atan2(ty - fy).to_degrees();
        if az < 0.0 {
            az + 360.0
        } else {
            az
        }
    }
}
