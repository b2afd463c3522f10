//! Debug criteria for intercepting candidates mid-search
//!
//! A criteria matches candidate ruptures (or a candidate plus the jump that
//! would create it); on match the engine re-evaluates the candidate
//! verbosely and can optionally stop the whole search.

use crate::filters::FilterResult;
use crate::graph::Jump;
use crate::rupture::ClusterRupture;

pub trait RupDebugCriteria: Send + Sync {
    fn matches(&self, rupture: &ClusterRupture) -> bool;

    /// Match against a proposed extension; defaults to materializing it
    fn matches_jump(&self, rupture: &ClusterRupture, jump: &Jump) -> bool {
        let (candidate, _) = rupture.take(jump.clone());
        self.matches(&candidate)
    }

    /// Restrict matches to particular filter outcomes
    fn applies_to(&self, result: FilterResult) -> bool {
        let _ = result;
        true
    }
}

/// Matches by section id content, exactly or as a superset
pub struct SectsDebugCriteria {
    sect_ids: Vec<u32>,
    exact: bool,
}

impl SectsDebugCriteria {
    pub fn exact(mut sect_ids: Vec<u32>) -> Self {
        sect_ids.sort_unstable();
        Self {
            sect_ids,
            exact: true,
        }
    }

    /// Matches any rupture containing all the given sections
    pub fn superset(mut sect_ids: Vec<u32>) -> Self {
        sect_ids.sort_unstable();
        Self {
            sect_ids,
            exact: false,
        }
    }
}

impl RupDebugCriteria for SectsDebugCriteria {
    fn matches(&self, rupture: &ClusterRupture) -> bool {
        if self.exact {
            rupture.fingerprint().section_ids() == self.sect_ids.as_slice()
        } else {
            self.sect_ids.iter().all(|&id| rupture.contains_section(id))
        }
    }
}

/// Matches by participating parent faults
pub struct ParentsDebugCriteria {
    parent_ids: Vec<u32>,
    exact: bool,
}

impl ParentsDebugCriteria {
    pub fn exact(mut parent_ids: Vec<u32>) -> Self {
        parent_ids.sort_unstable();
        parent_ids.dedup();
        Self {
            parent_ids,
            exact: true,
        }
    }

    pub fn superset(mut parent_ids: Vec<u32>) -> Self {
        parent_ids.sort_unstable();
        parent_ids.dedup();
        Self {
            parent_ids,
            exact: false,
        }
    }

    fn rupture_parents(rupture: &ClusterRupture) -> Vec<u32> {
        let mut parents: Vec<u32> = rupture
            .all_clusters()
            .iter()
            .map(|c| c.parent_id)
            .collect();
        parents.sort_unstable();
        parents.dedup();
        parents
    }
}

impl RupDebugCriteria for ParentsDebugCriteria {
    fn matches(&self, rupture: &ClusterRupture) -> bool {
        let parents = Self::rupture_parents(rupture);
        if self.exact {
            parents == self.parent_ids
        } else {
            self.parent_ids.iter().all(|id| parents.contains(id))
        }
    }
}

/// Matches ruptures by their start section and any strand-end section
pub struct StartEndDebugCriteria {
    start_sect: u32,
    end_sect: u32,
}

impl StartEndDebugCriteria {
    pub fn new(start_sect: u32, end_sect: u32) -> Self {
        Self {
            start_sect,
            end_sect,
        }
    }
}

impl RupDebugCriteria for StartEndDebugCriteria {
    fn matches(&self, rupture: &ClusterRupture) -> bool {
        rupture.clusters[0].start_section().id == self.start_sect
            && rupture
                .strand_end_clusters()
                .iter()
                .any(|c| c.end_section().id == self.end_sect)
    }
}

/// Matches every candidate that produced one of the given filter outcomes
pub struct ResultDebugCriteria {
    results: Vec<FilterResult>,
}

impl ResultDebugCriteria {
    pub fn new(results: Vec<FilterResult>) -> Self {
        Self { results }
    }
}

impl RupDebugCriteria for ResultDebugCriteria {
    fn matches(&self, _rupture: &ClusterRupture) -> bool {
        true
    }

    fn applies_to(&self, result: FilterResult) -> bool {
        self.results.contains(&result)
    }
}
