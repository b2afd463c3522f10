//! Rupture representation
//!
//! - Fingerprint: order-independent dedup identity
//! - ClusterRupture: immutable tree with append-only growth
//! - Navigator: predecessor/descendant queries over the tree

pub mod cluster_rupture;
pub mod fingerprint;
pub mod navigator;

pub use cluster_rupture::{ClusterRupture, Splay, StrandPath};
pub use fingerprint::RuptureFingerprint;
pub use navigator::RuptureTreeNavigator;
