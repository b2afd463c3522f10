//! Graph primitive types
//!
//! Core data structures for the fault graph: sections, clusters, and jumps.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// An atomic fault unit
///
/// Sections are immutable once constructed and shared as `Arc<Section>`
/// between clusters, ruptures, and jumps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Stable integer id, unique across the whole section list
    pub id: u32,
    /// Parent fault id; a missing parent is rejected at network construction
    pub parent_id: Option<u32>,
    /// Parent fault name (for reporting)
    pub parent_name: String,
}

impl Section {
    pub fn new(id: u32, parent_id: u32, parent_name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
            parent_name: parent_name.into(),
        }
    }
}

/// An ordered run of sections on a single parent fault
///
/// A cluster is either a full parent fault or a contiguous sub-range of one
/// (a permutation produced by a growing strategy). Identity is by content:
/// parent id plus the ordered section ids.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub parent_id: u32,
    pub parent_name: String,
    /// Sections in fault order (possibly reversed for a permutation)
    pub sections: Vec<Arc<Section>>,
}

impl Cluster {
    pub fn new(parent_id: u32, parent_name: impl Into<String>, sections: Vec<Arc<Section>>) -> Self {
        assert!(!sections.is_empty(), "cluster must contain at least one section");
        Self {
            parent_id,
            parent_name: parent_name.into(),
            sections,
        }
    }

    /// First section in order (the entry point of a permutation)
    pub fn start_section(&self) -> &Arc<Section> {
        &self.sections[0]
    }

    /// Last section in order (the exit point for strand continuation)
    pub fn end_section(&self) -> &Arc<Section> {
        self.sections.last().unwrap()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn contains(&self, sect_id: u32) -> bool {
        self.sections.iter().any(|s| s.id == sect_id)
    }

    pub fn index_of(&self, sect_id: u32) -> Option<usize> {
        self.sections.iter().position(|s| s.id == sect_id)
    }

    /// Same sections in the opposite order
    pub fn reversed(&self) -> Cluster {
        let mut sections = self.sections.clone();
        sections.reverse();
        Cluster {
            parent_id: self.parent_id,
            parent_name: self.parent_name.clone(),
            sections,
        }
    }
}

impl PartialEq for Cluster {
    fn eq(&self, other: &Self) -> bool {
        self.parent_id == other.parent_id
            && self.sections.len() == other.sections.len()
            && self
                .sections
                .iter()
                .zip(&other.sections)
                .all(|(a, b)| a.id == b.id)
    }
}

impl Eq for Cluster {}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:", self.parent_id)?;
        for (i, s) in self.sections.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", s.id)?;
        }
        write!(f, "]")
    }
}

/// A directed connection between two clusters
///
/// Jumps are reversible without loss: `reverse()` swaps the endpoints and
/// keeps the distance.
#[derive(Debug, Clone)]
pub struct Jump {
    pub from_cluster: Arc<Cluster>,
    pub from_section: Arc<Section>,
    pub to_cluster: Arc<Cluster>,
    pub to_section: Arc<Section>,
    /// Jump distance in km
    pub distance: f64,
}

impl Jump {
    pub fn new(
        from_cluster: Arc<Cluster>,
        from_section: Arc<Section>,
        to_cluster: Arc<Cluster>,
        to_section: Arc<Section>,
        distance: f64,
    ) -> Self {
        Self {
            from_cluster,
            from_section,
            to_cluster,
            to_section,
            distance,
        }
    }

    pub fn reverse(&self) -> Jump {
        Jump {
            from_cluster: self.to_cluster.clone(),
            from_section: self.to_section.clone(),
            to_cluster: self.from_cluster.clone(),
            to_section: self.from_section.clone(),
            distance: self.distance,
        }
    }
}

impl PartialEq for Jump {
    fn eq(&self, other: &Self) -> bool {
        self.from_section.id == other.from_section.id && self.to_section.id == other.to_section.id
    }
}

impl Eq for Jump {}

impl std::fmt::Display for Jump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}=>{} ({:.2} km)",
            self.from_section.id, self.to_section.id, self.distance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sect(id: u32, parent: u32) -> Arc<Section> {
        Arc::new(Section::new(id, parent, format!("fault {parent}")))
    }

    #[test]
    fn test_cluster_endpoints() {
        let c = Cluster::new(5, "f5", vec![sect(1, 5), sect(2, 5), sect(3, 5)]);
        assert_eq!(c.start_section().id, 1);
        assert_eq!(c.end_section().id, 3);
        assert!(c.contains(2));
        assert!(!c.contains(4));
        assert_eq!(c.index_of(3), Some(2));
    }

    #[test]
    fn test_cluster_reversed() {
        let c = Cluster::new(5, "f5", vec![sect(1, 5), sect(2, 5), sect(3, 5)]);
        let r = c.reversed();
        assert_eq!(r.start_section().id, 3);
        assert_eq!(r.end_section().id, 1);
        assert_eq!(r.parent_id, 5);
        // reversal changes content identity
        assert_ne!(c, r);
    }

    #[test]
    fn test_cluster_content_equality() {
        let a = Cluster::new(5, "f5", vec![sect(1, 5), sect(2, 5)]);
        let b = Cluster::new(5, "other name", vec![sect(1, 5), sect(2, 5)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_jump_reverse() {
        let a = Arc::new(Cluster::new(1, "a", vec![sect(1, 1)]));
        let b = Arc::new(Cluster::new(2, "b", vec![sect(2, 2)]));
        let j = Jump::new(
            a.clone(),
            a.sections[0].clone(),
            b.clone(),
            b.sections[0].clone(),
            2.5,
        );
        let r = j.reverse();
        assert_eq!(r.from_section.id, 2);
        assert_eq!(r.to_section.id, 1);
        assert_eq!(r.distance, 2.5);
        assert_eq!(r.reverse(), j);
    }
}
