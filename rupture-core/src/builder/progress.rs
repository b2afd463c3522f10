//! Build progress tracking
//!
//! Counts unique passing ruptures across all workers (the atomic
//! check-and-insert used for exploration-time dedup) and reports throttled
//! milestones through a listener: every 10 sections of largest-rupture
//! growth, and escalating count steps so reporting stays sparse as the
//! count explodes.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::rupture::{ClusterRupture, RuptureFingerprint};

/// Milestone callback; the default implementation ignores everything
pub trait ProgressListener: Send + Sync {
    fn on_milestone(&self, progress: &BuildProgress) {
        let _ = progress;
    }

    fn on_seed_complete(&self, completed: usize, total: usize) {
        let _ = (completed, total);
    }
}

/// Snapshot reported at each milestone
#[derive(Debug, Clone, Serialize)]
pub struct BuildProgress {
    pub unique_passing: usize,
    pub largest_sections: usize,
    pub seeds_completed: usize,
    pub total_seeds: usize,
    pub elapsed: Duration,
}

/// Final aggregate for one build
#[derive(Debug, Clone, Serialize)]
pub struct BuildStats {
    /// Unique passing ruptures observed during exploration
    pub unique_passing: usize,
    /// Ruptures accepted by the final merge
    pub accepted: usize,
    pub largest_sections: usize,
    pub total_seeds: usize,
    /// True when a debug criteria stop ended the build early
    pub stopped_early: bool,
    pub duration: Duration,
}

struct ProgressState {
    uniques: FxHashSet<RuptureFingerprint>,
    largest: usize,
    next_size_milestone: usize,
    next_count_milestone: usize,
    seeds_completed: usize,
}

pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    total_seeds: usize,
    listener: Option<std::sync::Arc<dyn ProgressListener>>,
    start: Instant,
}

const SIZE_MILESTONE_STEP: usize = 10;

/// Count milestone step, escalating with the running count
fn count_step(count: usize) -> usize {
    if count >= 1_000_000 {
        100_000
    } else if count >= 200_000 {
        50_000
    } else if count >= 100_000 {
        25_000
    } else if count >= 50_000 {
        10_000
    } else if count >= 10_000 {
        5_000
    } else {
        1_000
    }
}

impl ProgressTracker {
    pub fn new(total_seeds: usize, listener: Option<std::sync::Arc<dyn ProgressListener>>) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                uniques: FxHashSet::default(),
                largest: 0,
                next_size_milestone: SIZE_MILESTONE_STEP,
                next_count_milestone: count_step(0),
                seeds_completed: 0,
            }),
            total_seeds,
            listener,
            start: Instant::now(),
        }
    }

    /// Atomic check-and-insert on the passing set; true when this rupture's
    /// fingerprint was not seen before
    pub fn record_passed(&self, rupture: &ClusterRupture) -> bool {
        let mut milestone = None;
        let newly = {
            let mut state = match self.state.lock() {
                Ok(s) => s,
                Err(_) => return false,
            };
            let newly = state.uniques.insert(rupture.fingerprint().clone());
            if newly {
                let mut fire = false;
                let size = rupture.total_sections();
                if size > state.largest {
                    state.largest = size;
                    if size >= state.next_size_milestone {
                        state.next_size_milestone =
                            size - size % SIZE_MILESTONE_STEP + SIZE_MILESTONE_STEP;
                        fire = true;
                    }
                }
                let count = state.uniques.len();
                if count >= state.next_count_milestone {
                    let step = count_step(count);
                    state.next_count_milestone = count - count % step + step;
                    fire = true;
                }
                if fire && self.listener.is_some() {
                    milestone = Some(BuildProgress {
                        unique_passing: count,
                        largest_sections: state.largest,
                        seeds_completed: state.seeds_completed,
                        total_seeds: self.total_seeds,
                        elapsed: self.start.elapsed(),
                    });
                }
            }
            newly
        };
        if let (Some(listener), Some(progress)) = (&self.listener, milestone) {
            listener.on_milestone(&progress);
        }
        newly
    }

    pub fn seed_complete(&self) {
        let completed = match self.state.lock() {
            Ok(mut s) => {
                s.seeds_completed += 1;
                s.seeds_completed
            }
            Err(_) => return,
        };
        if let Some(listener) = &self.listener {
            listener.on_seed_complete(completed, self.total_seeds);
        }
    }

    pub fn stats(&self, accepted: usize, stopped_early: bool) -> BuildStats {
        let (unique_passing, largest) = self
            .state
            .lock()
            .map(|s| (s.uniques.len(), s.largest))
            .unwrap_or((0, 0));
        BuildStats {
            unique_passing,
            accepted,
            largest_sections: largest,
            total_seeds: self.total_seeds,
            stopped_early,
            duration: self.start.elapsed(),
        }
    }
}
