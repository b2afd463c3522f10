//! rupture-core: Multi-fault rupture enumeration engine
//!
//! This crate enumerates every plausible multi-fault rupture on a fault
//! network:
//! - Graph: sections, clusters, jumps, and pluggable connection rules
//! - Rupture: the immutable rupture tree, fingerprints, and navigators
//! - Strategy: growing strategies producing cluster permutations
//! - Filters: the plausibility filter protocol and concrete filters
//! - Builder: the recursive concurrent search engine with dedup, progress
//!   tracking, and debug interception

pub mod builder;
pub mod error;
pub mod filters;
pub mod graph;
pub mod rupture;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenience
pub use builder::{
    BuildProgress, BuildStats, ClusterRuptureBuilder, DebugConfig, ParentsDebugCriteria,
    ProgressListener, ResultDebugCriteria, RupDebugCriteria, RuptureBuildResult,
    SectsDebugCriteria, StartEndDebugCriteria,
};
pub use error::{Result, RuptureError};
pub use filters::{
    evaluate_filters, CumulativeAzimuthChangeFilter, CumulativeProbPathEvaluator,
    CumulativeProbabilityFilter, DistanceFalloffJumpProb, FilterResult, JumpAzimuthChangeFilter,
    JumpProbabilityCalc, MaxClustersFilter, MinSectsPerParentFilter, NetRuptureCoulombFilter,
    NucleationClusterEvaluator, PathGranularity, PathPlausibilityFilter, PathScalarCalc,
    PlausibilityFilter, RuptureProbabilityCalc, ScalarPathEvaluator, StiffnessCalc, ValueRange,
};
pub use graph::{
    Cluster, ClusterConnectionRule, DistCutoffClosestSectConnection, FaultNetwork, Jump, Section,
    SectionDistanceAzimuthCalc,
};
pub use rupture::{ClusterRupture, RuptureFingerprint, RuptureTreeNavigator, Splay, StrandPath};
pub use strategy::{
    ConnectionPointsGrowingStrategy, RuptureGrowingStrategy, UnilateralGrowingStrategy,
};
