//! Filter outcome types

use serde::{Deserialize, Serialize};

/// Outcome of a plausibility test
///
/// A failing candidate may still be worth growing (`FailContinuable`) or be
/// a dead branch (`FailHardStop`). Pruning is expressed through these values
/// only; filters never error for implausibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterResult {
    Pass,
    FailContinuable,
    FailHardStop,
}

impl FilterResult {
    pub fn is_pass(self) -> bool {
        self == FilterResult::Pass
    }

    /// Whether extensions of the candidate may still succeed
    pub fn can_continue(self) -> bool {
        self != FilterResult::FailHardStop
    }

    /// Conjunction: a hard stop on either side dominates, then a
    /// continuable failure, then pass
    pub fn and(self, other: FilterResult) -> FilterResult {
        if !self.can_continue() || !other.can_continue() {
            FilterResult::FailHardStop
        } else if self.is_pass() && other.is_pass() {
            FilterResult::Pass
        } else {
            FilterResult::FailContinuable
        }
    }

    /// Disjunction: a pass on either side dominates; hard stop only when
    /// neither side can continue
    pub fn or(self, other: FilterResult) -> FilterResult {
        if self.is_pass() || other.is_pass() {
            FilterResult::Pass
        } else if self.can_continue() || other.can_continue() {
            FilterResult::FailContinuable
        } else {
            FilterResult::FailHardStop
        }
    }
}

/// Acceptable interval for a scalar filter value, with optional bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |m| value >= m) && self.max.map_or(true, |m| value <= m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FilterResult::*;

    #[test]
    fn test_and_dominance() {
        assert_eq!(Pass.and(Pass), Pass);
        assert_eq!(Pass.and(FailContinuable), FailContinuable);
        assert_eq!(FailContinuable.and(Pass), FailContinuable);
        assert_eq!(Pass.and(FailHardStop), FailHardStop);
        assert_eq!(FailHardStop.and(FailContinuable), FailHardStop);
        assert_eq!(FailHardStop.and(FailHardStop), FailHardStop);
    }

    #[test]
    fn test_or_dominance() {
        assert_eq!(Pass.or(FailHardStop), Pass);
        assert_eq!(FailHardStop.or(Pass), Pass);
        assert_eq!(FailContinuable.or(FailHardStop), FailContinuable);
        assert_eq!(FailHardStop.or(FailHardStop), FailHardStop);
        assert_eq!(FailContinuable.or(FailContinuable), FailContinuable);
    }

    #[test]
    fn test_range() {
        let r = ValueRange::at_least(1.0);
        assert!(r.contains(1.0));
        assert!(r.contains(100.0));
        assert!(!r.contains(0.5));
        let r = ValueRange::between(-1.0, 1.0);
        assert!(r.contains(0.0));
        assert!(!r.contains(1.5));
        assert!(!r.contains(-1.5));
    }
}
