//! Crate error type
//!
//! Configuration and collaborator failures are fatal: they abort the search
//! rather than being treated as a filter outcome. Internal consistency
//! violations (navigator misses, incomplete path walks) panic instead, since
//! they indicate a logic bug rather than bad input.

use thiserror::Error;

/// Errors that abort rupture enumeration
#[derive(Debug, Error)]
pub enum RuptureError {
    /// A section was supplied without a parent fault id
    #[error("section {section} has no parent fault id")]
    MissingParent { section: u32 },

    /// A filter was configured with an out-of-range threshold
    #[error("invalid {what} threshold: {value}")]
    InvalidThreshold { what: &'static str, value: f64 },

    /// A probability calculator produced a value outside [0, 1]
    #[error("{calc} produced invalid probability {value}")]
    InvalidProbability { calc: String, value: f64 },

    /// A scalar collaborator produced a non-finite value
    #[error("{calc} produced non-finite value {value}")]
    InvalidScalar { calc: String, value: f64 },

    /// The worker thread pool could not be constructed
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, RuptureError>;
