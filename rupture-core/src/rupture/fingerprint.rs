//! Order-independent rupture identity
//!
//! Two ruptures that contain the same sections are duplicates regardless of
//! build order, branch structure, or direction. The fingerprint is the
//! sorted unique section id list plus a precomputed xxh3 hash, and is the
//! dedup key for the whole engine.

use std::hash::{Hash, Hasher};

use xxhash_rust::xxh3::xxh3_64;

use crate::graph::Cluster;

#[derive(Debug, Clone)]
pub struct RuptureFingerprint {
    /// Sorted, duplicate-free section ids
    sect_ids: Vec<u32>,
    hash: u64,
}

impl RuptureFingerprint {
    pub fn new(ids: impl IntoIterator<Item = u32>) -> Self {
        let mut sect_ids: Vec<u32> = ids.into_iter().collect();
        sect_ids.sort_unstable();
        let before = sect_ids.len();
        sect_ids.dedup();
        assert_eq!(before, sect_ids.len(), "duplicate section in fingerprint");
        let hash = hash_ids(&sect_ids);
        Self { sect_ids, hash }
    }

    pub fn from_cluster(cluster: &Cluster) -> Self {
        Self::new(cluster.sections.iter().map(|s| s.id))
    }

    /// New fingerprint with the cluster's sections merged in
    pub fn with_cluster(&self, cluster: &Cluster) -> Self {
        let mut sect_ids = Vec::with_capacity(self.sect_ids.len() + cluster.len());
        sect_ids.extend_from_slice(&self.sect_ids);
        sect_ids.extend(cluster.sections.iter().map(|s| s.id));
        sect_ids.sort_unstable();
        let before = sect_ids.len();
        sect_ids.dedup();
        assert_eq!(before, sect_ids.len(), "duplicate section in fingerprint");
        let hash = hash_ids(&sect_ids);
        Self { sect_ids, hash }
    }

    pub fn contains(&self, sect_id: u32) -> bool {
        self.sect_ids.binary_search(&sect_id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.sect_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sect_ids.is_empty()
    }

    pub fn section_ids(&self) -> &[u32] {
        &self.sect_ids
    }
}

fn hash_ids(ids: &[u32]) -> u64 {
    let mut bytes = Vec::with_capacity(ids.len() * 4);
    for id in ids {
        bytes.extend_from_slice(&id.to_le_bytes());
    }
    xxh3_64(&bytes)
}

impl PartialEq for RuptureFingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.sect_ids == other.sect_ids
    }
}

impl Eq for RuptureFingerprint {}

impl Hash for RuptureFingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}
