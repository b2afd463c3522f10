//! Fault graph primitives and connectivity
//!
//! - Types: sections, clusters, jumps
//! - Connections: distance-based connection rules and the fault network

pub mod connections;
pub mod types;

pub use connections::{
    ClusterConnectionRule, DistCutoffClosestSectConnection, FaultNetwork,
    SectionDistanceAzimuthCalc,
};
pub use types::{Cluster, Jump, Section};
